mod health;
mod index;
mod metrics;
mod predict;
mod reset;
mod upload_model;

use crate::{
    page::{render_page, PageView},
    server::SharedState,
};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use car_price_model::SessionState;

pub use health::healthcheck;
pub use index::index;
pub use metrics::metrics_handler;
pub use predict::predict;
pub use reset::reset;
pub use upload_model::{install_model, upload_model, UploadError};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/model", post(upload_model))
        .route("/predict", post(predict))
        .route("/reset", post(reset))
        .route("/health", get(healthcheck))
        .route("/metrics", get(metrics_handler))
}

/// The page as the current session would show it.
fn session_view(state: &SharedState) -> PageView {
    let session = state.session.lock();
    let price = match session.state() {
        SessionState::PredictionShown(value) => Some(value),
        SessionState::NoModel | SessionState::ModelLoaded => None,
    };

    PageView {
        model_name: session.model_name().map(str::to_string),
        price,
        ..PageView::default()
    }
}

fn page_response(status: StatusCode, view: &PageView) -> Response {
    (status, Html(render_page(view))).into_response()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{server::SharedState, telemetry::Metrics};
    use axum::response::Response;
    use car_price_model::{
        record::BRAND, ArtifactLoader, FeatureRow, FeatureValue, ModelArtifact, ModelError,
        Predictor,
    };
    use std::sync::Arc;

    pub const MODEL_BYTES: &[u8] = b"mock model";
    pub const LABEL_ONLY_BYTES: &[u8] = b"mock classifier";

    pub struct MockPredictor {}

    impl Predictor for MockPredictor {
        fn predict(&self, features: &FeatureRow) -> Result<f64, ModelError> {
            match features.get(BRAND) {
                Some(FeatureValue::Text(brand)) if brand == "Trabant" => Err(
                    ModelError::SchemaMismatch("brand `Trabant` was not seen in training".into()),
                ),
                Some(_) => Ok(213_500.0),
                None => Err(ModelError::SchemaMismatch("missing field `brand`".into())),
            }
        }
    }

    pub struct MockLoader {}

    impl ArtifactLoader for MockLoader {
        fn load(&self, artifact: &ModelArtifact) -> Result<Box<dyn Predictor>, ModelError> {
            match artifact.bytes() {
                MODEL_BYTES => Ok(Box::new(MockPredictor {})),
                LABEL_ONLY_BYTES => Err(ModelError::IncompatibleSchema(
                    "no float output among [label]".into(),
                )),
                _ => Err(ModelError::Deserialization("not an onnx model".into())),
            }
        }
    }

    pub fn test_state() -> SharedState {
        let metrics = Metrics::new().expect("metrics");
        SharedState::new(Arc::new(MockLoader {}), Arc::new(metrics))
    }

    pub async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }
}

use crate::server::SharedState;
use axum::{extract::State, response::IntoResponse, response::Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Status {
    status: String,
    model_loaded: bool,
}

pub async fn healthcheck(State(state): State<SharedState>) -> impl IntoResponse {
    let model_loaded = state.session.lock().model_name().is_some();
    Json(Status {
        status: "Available".into(),
        model_loaded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{
        install_model,
        test_support::{body_text, test_state, MODEL_BYTES},
    };

    #[tokio::test]
    async fn test_health_reports_loaded_model() {
        let state = test_state();
        let body = body_text(healthcheck(State(state.clone())).await.into_response()).await;
        assert!(body.contains("\"model_loaded\":false"), "{}", body);

        install_model(&state, "car.onnx", MODEL_BYTES.to_vec())
            .await
            .unwrap();

        let body = body_text(healthcheck(State(state)).await.into_response()).await;
        assert!(body.contains("\"model_loaded\":true"), "{}", body);
    }
}

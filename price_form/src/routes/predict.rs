use super::{page_response, session_view};
use crate::{form::PredictionForm, server::SharedState};
use axum::{extract::State, http::StatusCode, response::Response, Form};
use car_price_model::{InputRecord, ModelError};
use std::time::Instant;
use tracing::instrument;

fn outcome(error: &ModelError) -> &'static str {
    match error {
        ModelError::SchemaMismatch(_) => "schema_mismatch",
        ModelError::Inference(_) => "inference_error",
        ModelError::Deserialization(_) | ModelError::IncompatibleSchema(_) => "model_error",
    }
}

#[instrument(skip(state, form))]
pub async fn predict(State(state): State<SharedState>, Form(form): Form<PredictionForm>) -> Response {
    let record = match InputRecord::try_from(form) {
        Ok(record) => record,
        Err(e) => {
            tracing::debug!("Rejected form input: {}", e);
            let mut view = session_view(&state);
            view.error = Some(e.to_string());
            return page_response(StatusCode::BAD_REQUEST, &view);
        }
    };

    let session = state.session.clone();
    let task_record = record.clone();
    let task = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let result = session.lock().predict(&task_record);
        (result, started.elapsed().as_micros() as u64)
    });
    let (result, elapsed_us) = match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Prediction task failed: {}", e);
            let mut view = session_view(&state);
            view.error = Some("Prediction task failed".to_string());
            return page_response(StatusCode::INTERNAL_SERVER_ERROR, &view);
        }
    };

    let mut view = session_view(&state);
    view.record = record;

    match result {
        Ok(Some(price)) => {
            tracing::info!(price, elapsed_us, "Price predicted");
            state.metrics.record_prediction("success", elapsed_us);
            page_response(StatusCode::OK, &view)
        }
        Ok(None) => page_response(StatusCode::OK, &view),
        Err(e) => {
            tracing::warn!("Prediction failed: {}", e);
            state.metrics.record_prediction(outcome(&e), elapsed_us);
            view.error = Some(e.to_string());
            view.price = None;
            page_response(StatusCode::UNPROCESSABLE_ENTITY, &view)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{
        install_model,
        test_support::{body_text, test_state, MODEL_BYTES},
    };
    use car_price_model::SessionState;

    fn ferrari() -> PredictionForm {
        PredictionForm {
            year: Some("2020".into()),
            mileage: Some("10000".into()),
            engine_size: Some("3.0".into()),
            fuel_type: Some("Petrol".into()),
            transmission: Some("Manual".into()),
            brand: Some("Ferrari".into()),
        }
    }

    #[tokio::test]
    async fn test_predict_renders_currency() {
        let state = test_state();
        install_model(&state, "car.onnx", MODEL_BYTES.to_vec())
            .await
            .unwrap();

        let response = predict(State(state.clone()), Form(ferrari())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("$213,500.00"), "{}", body);
        assert_eq!(
            state.session.lock().state(),
            SessionState::PredictionShown(213_500.0)
        );
    }

    #[tokio::test]
    async fn test_predict_without_model_waits() {
        let state = test_state();

        let response = predict(State(state.clone()), Form(ferrari())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Please upload your trained car price model"));
        assert!(!body.contains("Estimated Price"));
    }

    #[tokio::test]
    async fn test_invalid_form_is_bad_request() {
        let state = test_state();
        install_model(&state, "car.onnx", MODEL_BYTES.to_vec())
            .await
            .unwrap();
        let form = PredictionForm {
            year: Some("1979".into()),
            ..ferrari()
        };

        let response = predict(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains("year must be between 1980 and 2026"));
        assert_eq!(state.session.lock().state(), SessionState::ModelLoaded);
    }

    #[tokio::test]
    async fn test_model_error_is_shown() {
        let state = test_state();
        install_model(&state, "car.onnx", MODEL_BYTES.to_vec())
            .await
            .unwrap();
        let form = PredictionForm {
            brand: Some("Trabant".into()),
            ..ferrari()
        };

        let response = predict(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("Input does not match the model inputs"));
        assert!(body.contains("Trabant"));
    }
}

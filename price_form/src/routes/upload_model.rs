use super::{page_response, session_view};
use crate::server::SharedState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Response,
};
use car_price_model::{ArtifactError, ModelArtifact, ModelError};
use thiserror::Error;
use tracing::instrument;

const MODEL_FIELD: &str = "model";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("No model file was uploaded")]
    MissingFile,
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Model loading task failed: {0}")]
    Task(String),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::Multipart(_) | UploadError::MissingFile | UploadError::Artifact(_) => {
                StatusCode::BAD_REQUEST
            }
            UploadError::Model(_) => StatusCode::UNPROCESSABLE_ENTITY,
            UploadError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            UploadError::Multipart(_) | UploadError::MissingFile => "bad_request",
            UploadError::Artifact(_) => "unsupported_extension",
            UploadError::Model(ModelError::Deserialization(_)) => "deserialization_error",
            UploadError::Model(ModelError::IncompatibleSchema(_)) => "incompatible_schema",
            UploadError::Model(_) => "model_error",
            UploadError::Task(_) => "internal_error",
        }
    }
}

/// Checks the extension, deserializes the model off the async runtime and
/// installs it in the session. Returns the installed model's name.
pub async fn install_model(
    state: &SharedState,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, UploadError> {
    let artifact = ModelArtifact::from_upload(file_name, bytes)?;
    let name = artifact.name().to_string();

    let loader = state.loader.clone();
    let predictor = tokio::task::spawn_blocking(move || loader.load(&artifact))
        .await
        .map_err(|e| UploadError::Task(e.to_string()))??;

    state.session.lock().install(&name, predictor);
    Ok(name)
}

#[instrument(skip(state, multipart))]
pub async fn upload_model(State(state): State<SharedState>, multipart: Multipart) -> Response {
    let result = match read_model_field(multipart).await {
        Ok((file_name, bytes)) => install_model(&state, &file_name, bytes).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(name) => {
            tracing::info!(model = %name, "Model uploaded");
            state.metrics.record_upload("loaded");
            page_response(StatusCode::OK, &session_view(&state))
        }
        Err(e) => {
            tracing::warn!("Model upload rejected: {}", e);
            state.metrics.record_upload(e.outcome());
            let mut view = session_view(&state);
            view.error = Some(e.to_string());
            page_response(e.status_code(), &view)
        }
    }
}

async fn read_model_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(MODEL_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        if file_name.is_empty() && bytes.is_empty() {
            return Err(UploadError::MissingFile);
        }
        return Ok((file_name, bytes.to_vec()));
    }
    Err(UploadError::MissingFile)
}

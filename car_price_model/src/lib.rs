mod artifact;
mod error;
mod loader;
mod ort_predictor;
mod predictor;
mod state;

pub mod config;
pub mod record;

pub use artifact::{ModelArtifact, MODEL_EXTENSION};
pub use error::{ArtifactError, LoaderError, ModelError};
pub use loader::{ArtifactLoader, OrtArtifactLoader};
pub use ort_predictor::{InputKind, InputSpec, ModelSchema, OrtPredictor, OutputKind, OutputSpec};
pub use predictor::Predictor;
pub use record::{FeatureRow, FeatureValue, FuelType, InputRecord, Transmission};
pub use state::{PredictionSession, SessionState};

/// Deserializes an ONNX model with the default runtime settings.
pub fn load(bytes: &[u8]) -> Result<OrtPredictor, ModelError> {
    OrtPredictor::from_bytes(bytes, &config::ModelConfig::default())
}

/// Prices one record with an already loaded model.
pub fn predict<P: Predictor + ?Sized>(handle: &P, record: &InputRecord) -> Result<f64, ModelError> {
    handle.predict(&record.to_features())
}

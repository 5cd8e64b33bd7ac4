use thiserror::Error;

/// Failures at the model-loading and inference boundary.
///
/// Every variant is terminal for the current attempt: nothing retries, and a
/// failed load leaves the caller without a predictor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model artifact could not be deserialized: {0}")]
    Deserialization(String),
    #[error("Model cannot produce a price prediction: {0}")]
    IncompatibleSchema(String),
    #[error("Input does not match the model inputs: {0}")]
    SchemaMismatch(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactError {
    #[error("Unsupported model file `{file_name}`, expected a .{expected} file")]
    UnsupportedExtension { file_name: String, expected: String },
}

/// Failures setting up the loader itself, before any artifact is seen.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoaderError {
    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),
    #[error("ONNX Runtime could not be initialized: {0}")]
    Runtime(String),
}

use crate::{
    artifact::ModelArtifact,
    config::ModelConfig,
    error::{LoaderError, ModelError},
    ort_predictor::OrtPredictor,
    predictor::Predictor,
};

/// Turns an uploaded artifact into a predictor.
pub trait ArtifactLoader: Send + Sync + 'static {
    fn load(&self, artifact: &ModelArtifact) -> Result<Box<dyn Predictor>, ModelError>;
}

pub struct OrtArtifactLoader {
    model_config: ModelConfig,
}

impl OrtArtifactLoader {
    pub fn new(model_config: &ModelConfig) -> Result<Self, LoaderError> {
        model_config.validate().map_err(LoaderError::InvalidConfig)?;

        ort::init()
            .with_name("car_price_model")
            .commit()
            .map_err(|e| LoaderError::Runtime(e.to_string()))?;

        tracing::info!(
            optimization_level = model_config.optimization_level.as_str(),
            intra_threads = model_config.intra_threads,
            "ONNX Runtime initialized"
        );

        Ok(Self {
            model_config: model_config.clone(),
        })
    }

    pub fn load_predictor(&self, artifact: &ModelArtifact) -> Result<OrtPredictor, ModelError> {
        if let Some(dir) = &self.model_config.persist_dir {
            match artifact.persist(dir) {
                Ok(path) => tracing::info!(path = %path.display(), "Model artifact persisted"),
                Err(e) => tracing::warn!("Failed to persist model artifact: {}", e),
            }
        }

        tracing::info!(
            artifact = artifact.name(),
            bytes = artifact.len(),
            "Loading model artifact"
        );
        OrtPredictor::from_bytes(artifact.bytes(), &self.model_config)
    }
}

impl ArtifactLoader for OrtArtifactLoader {
    fn load(&self, artifact: &ModelArtifact) -> Result<Box<dyn Predictor>, ModelError> {
        let predictor = self.load_predictor(artifact)?;
        Ok(Box::new(predictor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_rejected_before_runtime_init() {
        let model_config = ModelConfig {
            intra_threads: 0,
            ..ModelConfig::default()
        };

        match OrtArtifactLoader::new(&model_config) {
            Err(LoaderError::InvalidConfig(message)) => {
                assert!(message.contains("intra_threads"), "{}", message)
            }
            Err(other) => panic!("expected an invalid config error, got {:?}", other),
            Ok(_) => panic!("a zero-thread config was accepted"),
        }
    }
}

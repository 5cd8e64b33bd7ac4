use crate::{error::ModelError, record::FeatureRow};

/// A loaded model reduced to the one thing the form needs from it.
pub trait Predictor: Send + Sync + 'static {
    fn predict(&self, features: &FeatureRow) -> Result<f64, ModelError>;
}

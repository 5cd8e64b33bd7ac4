use crate::{error::ModelError, predictor::Predictor, record::InputRecord};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    NoModel,
    ModelLoaded,
    PredictionShown(f64),
}

struct LoadedModel {
    name: String,
    predictor: Box<dyn Predictor>,
}

/// The uploaded model and the last price shown, scoped to one session.
///
/// Created empty, filled by [`PredictionSession::install`], emptied again by
/// [`PredictionSession::reset`] or by dropping it.
#[derive(Default)]
pub struct PredictionSession {
    model: Option<LoadedModel>,
    last_prediction: Option<f64>,
}

impl PredictionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match (&self.model, self.last_prediction) {
            (None, _) => SessionState::NoModel,
            (Some(_), None) => SessionState::ModelLoaded,
            (Some(_), Some(value)) => SessionState::PredictionShown(value),
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_ref().map(|model| model.name.as_str())
    }

    /// Replaces any previous model; the last prediction belonged to it and is
    /// dropped as well.
    pub fn install(&mut self, name: &str, predictor: Box<dyn Predictor>) {
        self.model = Some(LoadedModel {
            name: name.to_string(),
            predictor,
        });
        self.last_prediction = None;
    }

    /// Runs the installed model on `record`.
    ///
    /// `Ok(None)` means no model has been uploaded yet. A failed prediction
    /// leaves the session as it was.
    pub fn predict(&mut self, record: &InputRecord) -> Result<Option<f64>, ModelError> {
        let Some(model) = &self.model else {
            return Ok(None);
        };

        let value = model.predictor.predict(&record.to_features())?;
        self.last_prediction = Some(value);
        Ok(Some(value))
    }

    pub fn reset(&mut self) {
        if let Some(model) = self.model.take() {
            tracing::info!(model = %model.name, "Session reset, model dropped");
        }
        self.last_prediction = None;
    }
}

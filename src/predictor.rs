//! Predictor gateway: the single call site into the model.
//!
//! Whatever goes wrong inside the model (an `Err`, a panic, a NaN) comes back
//! as a `PredictionError` with the cause as text.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::encoder::FeatureVector;
use crate::error::PredictionError;
use crate::model::AqiModel;

#[derive(Clone)]
pub struct PredictorGateway {
    model: Arc<dyn AqiModel>,
}

impl PredictorGateway {
    pub fn new(model: Arc<dyn AqiModel>) -> Self {
        Self { model }
    }

    pub fn input_width(&self) -> usize {
        self.model.input_width()
    }

    /// Run the model and return its first output as the AQI.
    pub fn predict_aqi(&self, vector: &FeatureVector) -> Result<f64, PredictionError> {
        let outputs = panic::catch_unwind(AssertUnwindSafe(|| {
            self.model.predict(vector.as_slice())
        }))
        .map_err(|payload| PredictionError::Panicked(panic_message(payload.as_ref())))??;

        let aqi = outputs.first().copied().ok_or(PredictionError::EmptyOutput)?;
        if !aqi.is_finite() {
            return Err(PredictionError::NonFinite(aqi));
        }
        Ok(aqi)
    }
}

impl std::fmt::Debug for PredictorGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorGateway")
            .field("input_width", &self.model.input_width())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    struct FixedModel(Vec<f64>);

    impl AqiModel for FixedModel {
        fn input_width(&self) -> usize {
            3
        }

        fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
            if features.len() != 3 {
                return Err(ModelError::ShapeMismatch {
                    expected: 3,
                    actual: features.len(),
                });
            }
            Ok(self.0.clone())
        }
    }

    struct PanickingModel;

    impl AqiModel for PanickingModel {
        fn input_width(&self) -> usize {
            3
        }

        fn predict(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
            panic!("weights corrupted");
        }
    }

    fn gateway(model: impl AqiModel + 'static) -> PredictorGateway {
        PredictorGateway::new(Arc::new(model))
    }

    fn vector(len: usize) -> FeatureVector {
        FeatureVector::from(vec![1.0; len])
    }

    #[test]
    fn test_returns_first_output() {
        let aqi = gateway(FixedModel(vec![42.0, 99.0])).predict_aqi(&vector(3)).unwrap();
        assert_eq!(aqi, 42.0);
    }

    #[test]
    fn test_shape_mismatch_becomes_prediction_error() {
        let err = gateway(FixedModel(vec![1.0])).predict_aqi(&vector(5)).unwrap_err();
        assert_eq!(
            err,
            PredictionError::Model(ModelError::ShapeMismatch {
                expected: 3,
                actual: 5
            })
        );
    }

    #[test]
    fn test_panic_is_caught() {
        let err = gateway(PanickingModel).predict_aqi(&vector(3)).unwrap_err();
        assert_eq!(err, PredictionError::Panicked("weights corrupted".to_string()));
    }

    #[test]
    fn test_empty_output() {
        let err = gateway(FixedModel(vec![])).predict_aqi(&vector(3)).unwrap_err();
        assert_eq!(err, PredictionError::EmptyOutput);
    }

    #[test]
    fn test_nan_output_rejected() {
        let err = gateway(FixedModel(vec![f64::NAN])).predict_aqi(&vector(3)).unwrap_err();
        assert!(matches!(err, PredictionError::NonFinite(_)));
    }
}

//! Error taxonomy for the prediction pipeline.
//!
//! - `ValidationError`: the user picked a city outside the selected country.
//!   Recovered on the input page.
//! - `PredictionError`: the model call failed. Recovered on the input page.
//! - `ConfigurationError`: the model artifact or geography table is unusable.
//!   Fatal at startup.
//! - `PredictActionError`: what the predict action as a whole can report.

use thiserror::Error;

/// City/country consistency failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("❌ Invalid city '{city}' for country '{country}'. Please select a valid city.")]
    InvalidCity { country: String, city: String },
}

/// Failure of a single model invocation.
///
/// Every variant carries the underlying cause as text so it can be shown to
/// the user verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("model panicked: {0}")]
    Panicked(String),

    #[error("model returned no output")]
    EmptyOutput,

    #[error("model returned a non-finite value ({0})")]
    NonFinite(f64),

    #[error("prediction task was interrupted: {0}")]
    Interrupted(String),
}

/// Errors raised by a model implementation itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("X has {actual} features, but the model is expecting {expected} features as input")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}

/// Startup-time configuration failures. Any of these stops the process.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read model artifact {path}: {source}")]
    ModelRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    ModelParse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Model(String),

    #[error("model artifact uses feature schema v{found}, encoder produces v{expected}")]
    SchemaVersion { expected: u32, found: u32 },

    #[error("invalid geography table: {0}")]
    Geography(String),
}

/// Everything the predict action can surface to the input page.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictActionError {
    #[error(transparent)]
    InvalidCity(#[from] ValidationError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictionError),

    /// The submitted form could not be decoded (e.g. an empty number field).
    #[error("❌ Invalid input: {0}")]
    InvalidForm(String),

    /// A predict submission arrived while the session was showing a result.
    #[error("a prediction can only be requested from the input page")]
    NotOnInputPage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_city_message_names_city_and_country() {
        let err = ValidationError::InvalidCity {
            country: "USA".to_string(),
            city: "Dubai".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'Dubai'"));
        assert!(msg.contains("'USA'"));
    }

    #[test]
    fn test_invalid_form_message() {
        let err = PredictActionError::InvalidForm("cannot parse float from empty string".to_string());
        assert_eq!(
            err.to_string(),
            "❌ Invalid input: cannot parse float from empty string"
        );
    }

    #[test]
    fn test_prediction_failure_carries_cause() {
        let err = PredictActionError::from(PredictionError::from(ModelError::ShapeMismatch {
            expected: 20,
            actual: 19,
        }));
        assert_eq!(
            err.to_string(),
            "Prediction failed: X has 19 features, but the model is expecting 20 features as input"
        );
    }
}

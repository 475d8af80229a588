//! AQI Predictor
//!
//! Predicts an Air Quality Index from pollutant and weather readings plus a
//! (country, city) location, and classifies it into a severity band.
//!
//! - `geography`, `validator`: the reference country → cities table and
//!   location validation
//! - `readings`, `encoder`: form values, clamping, and the fixed-order
//!   feature vector the model was trained on
//! - `model`, `predictor`: the JSON model artifact and the gateway that calls it
//! - `severity`: Good / Moderate / High bands
//! - `session`: the two-page Input ⇄ Result flow
//!
//! With the `api` feature: an Axum server (`api_server`) serving both pages.

pub mod config;
pub mod encoder;
pub mod error;
pub mod geography;
pub mod model;
pub mod predictor;
pub mod readings;
pub mod session;
pub mod severity;
pub mod validator;

#[cfg(feature = "api")]
pub mod api_server;
#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use encoder::{FeatureSchema, FeatureVector};
pub use error::{ConfigurationError, ModelError, PredictActionError, PredictionError, ValidationError};
pub use geography::GeographyTable;
pub use model::{AqiModel, LoadedModel};
pub use predictor::PredictorGateway;
pub use readings::{LocationSelection, PredictionForm, ReadingSet};
pub use session::{PredictionPipeline, Session, SessionState};
pub use severity::{classify, SeverityBand};
pub use validator::{validate, ValidatedLocation};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};

//! Per-user navigation state and the predict/back actions.
//!
//! ```text
//!            predict (valid city AND model ok)
//!   Input ─────────────────────────────────────▶ Result { aqi }
//!     ▲                                              │
//!     └──────────────────── back ────────────────────┘
//! ```
//!
//! A failed predict leaves the session in `Input` with the submitted form
//! kept and an error notice set. Back from `Input` does nothing.

use std::sync::Arc;

use crate::encoder::FeatureSchema;
use crate::error::PredictActionError;
use crate::geography::GeographyTable;
use crate::predictor::PredictorGateway;
use crate::readings::PredictionForm;
use crate::validator::validate_location;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Input,
    Result { aqi: f64 },
}

impl SessionState {
    pub fn is_input(&self) -> bool {
        matches!(self, SessionState::Input)
    }
}

// ============================================================================
// Prediction pipeline (validate → encode → predict)
// ============================================================================

/// Everything a predict action needs, shared by all sessions.
#[derive(Debug, Clone)]
pub struct PredictionPipeline {
    geography: Arc<GeographyTable>,
    schema: Arc<FeatureSchema>,
    gateway: PredictorGateway,
}

impl PredictionPipeline {
    pub fn new(geography: Arc<GeographyTable>, gateway: PredictorGateway) -> Self {
        let schema = Arc::new(FeatureSchema::for_geography(&geography));
        Self {
            geography,
            schema,
            gateway,
        }
    }

    pub fn geography(&self) -> &GeographyTable {
        &self.geography
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn gateway(&self) -> &PredictorGateway {
        &self.gateway
    }

    /// Validate the location, encode the readings and ask the model.
    pub fn run(&self, form: &PredictionForm) -> Result<f64, PredictActionError> {
        let location = validate_location(&self.geography, &form.location())?;
        let labeled = self.schema.encode_labeled(&form.readings(), &location);
        tracing::debug!(
            country = location.country(),
            city = location.city(),
            "Encoded features: {:?}",
            labeled
        );

        let aqi = self.gateway.predict_aqi(&labeled.into_vector())?;
        Ok(aqi)
    }
}

// ============================================================================
// Session
// ============================================================================

/// One user's state: current page, last submitted form, pending notice.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    state: SessionState,
    form: PredictionForm,
    notice: Option<String>,
}

impl Session {
    pub fn new(geography: &GeographyTable) -> Self {
        Self {
            state: SessionState::Input,
            form: PredictionForm::initial(geography),
            notice: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn form(&self) -> &PredictionForm {
        &self.form
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Remove and return the pending notice; it is shown once.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// The predict action. Moves to `Result` only if validation and the model
    /// both succeed; otherwise stays on `Input` with the error as notice.
    pub fn predict(
        &mut self,
        form: PredictionForm,
        pipeline: &PredictionPipeline,
    ) -> Result<f64, PredictActionError> {
        if !self.state.is_input() {
            return Err(PredictActionError::NotOnInputPage);
        }

        match pipeline.run(&form) {
            Ok(aqi) => {
                self.form = form;
                self.notice = None;
                self.state = SessionState::Result { aqi };
                tracing::info!(aqi, "Session moved to result page");
                Ok(aqi)
            }
            Err(e) => {
                self.reject(form, &e);
                Err(e)
            }
        }
    }

    /// Record a failed submission: keep the form, surface the error.
    pub fn reject(&mut self, form: PredictionForm, error: &PredictActionError) {
        self.form = form;
        self.notice = Some(error.to_string());
    }

    /// The back action. Returns `true` if the session left the result page.
    pub fn back(&mut self) -> bool {
        match self.state {
            SessionState::Result { .. } => {
                self.state = SessionState::Input;
                self.notice = None;
                true
            }
            SessionState::Input => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, PredictionError, ValidationError};
    use crate::model::AqiModel;
    use crate::severity::{classify, SeverityBand};
    use std::sync::Mutex;

    /// Records every vector it sees and answers with a fixed AQI.
    struct RecordingModel {
        aqi: f64,
        seen: Mutex<Vec<Vec<f64>>>,
    }

    impl AqiModel for RecordingModel {
        fn input_width(&self) -> usize {
            19
        }

        fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
            self.seen.lock().unwrap().push(features.to_vec());
            Ok(vec![self.aqi])
        }
    }

    struct FailingModel;

    impl AqiModel for FailingModel {
        fn input_width(&self) -> usize {
            19
        }

        fn predict(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
            Err(ModelError::Other("model unavailable".to_string()))
        }
    }

    fn pipeline_with(model: Arc<dyn AqiModel>) -> PredictionPipeline {
        PredictionPipeline::new(
            Arc::new(GeographyTable::reference()),
            PredictorGateway::new(model),
        )
    }

    fn chennai_form() -> PredictionForm {
        PredictionForm {
            pm25: 40.0,
            pm10: 60.0,
            no2: 20.0,
            so2: 10.0,
            co: 1.0,
            o3: 30.0,
            temperature: 30.0,
            humidity: 70.0,
            wind_speed: 5.0,
            country: "India".to_string(),
            city: "Chennai".to_string(),
        }
    }

    fn recording(aqi: f64) -> Arc<RecordingModel> {
        Arc::new(RecordingModel {
            aqi,
            seen: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_new_session_starts_on_input() {
        let session = Session::new(&GeographyTable::reference());
        assert_eq!(session.state(), SessionState::Input);
        assert!(session.notice().is_none());
    }

    #[test]
    fn test_back_on_input_is_noop() {
        let mut session = Session::new(&GeographyTable::reference());
        let before = session.clone();
        assert!(!session.back());
        assert_eq!(session, before);
    }

    #[test]
    fn test_chennai_end_to_end() {
        let model = recording(42.0);
        let pipeline = pipeline_with(model.clone());
        let mut session = Session::new(pipeline.geography());

        let aqi = session.predict(chennai_form(), &pipeline).unwrap();
        assert_eq!(aqi, 42.0);
        assert_eq!(session.state(), SessionState::Result { aqi: 42.0 });
        assert_eq!(classify(aqi), SeverityBand::Good);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let vector = &seen[0];
        let schema = pipeline.schema();
        assert_eq!(vector[schema.country_indicator_index()], 0.0);
        let cities = &vector[schema.city_range()];
        assert_eq!(cities.iter().filter(|&&v| v == 1.0).count(), 1);
        assert_eq!(cities[2], 1.0); // Chennai
    }

    #[test]
    fn test_invalid_city_stays_on_input() {
        let model = recording(42.0);
        let pipeline = pipeline_with(model.clone());
        let mut session = Session::new(pipeline.geography());

        let mut form = chennai_form();
        form.country = "USA".to_string();
        form.city = "Dubai".to_string();

        let err = session.predict(form.clone(), &pipeline).unwrap_err();
        assert!(matches!(
            err,
            PredictActionError::InvalidCity(ValidationError::InvalidCity { .. })
        ));
        assert_eq!(session.state(), SessionState::Input);
        assert_eq!(session.form(), &form);
        assert!(session.notice().unwrap().contains("Invalid city 'Dubai'"));
        assert!(model.seen.lock().unwrap().is_empty(), "model must not be called");
    }

    #[test]
    fn test_model_failure_stays_on_input() {
        let pipeline = pipeline_with(Arc::new(FailingModel));
        let mut session = Session::new(pipeline.geography());

        let err = session.predict(chennai_form(), &pipeline).unwrap_err();
        assert_eq!(
            err,
            PredictActionError::Prediction(PredictionError::Model(ModelError::Other(
                "model unavailable".to_string()
            )))
        );
        assert_eq!(session.state(), SessionState::Input);
        assert_eq!(session.notice(), Some("Prediction failed: model unavailable"));
    }

    #[test]
    fn test_take_notice_is_one_shot() {
        let pipeline = pipeline_with(Arc::new(FailingModel));
        let mut session = Session::new(pipeline.geography());
        let _ = session.predict(chennai_form(), &pipeline);

        assert!(session.take_notice().is_some());
        assert!(session.take_notice().is_none());
    }

    #[test]
    fn test_predict_from_result_is_ignored() {
        let model = recording(120.0);
        let pipeline = pipeline_with(model.clone());
        let mut session = Session::new(pipeline.geography());
        session.predict(chennai_form(), &pipeline).unwrap();

        let err = session.predict(chennai_form(), &pipeline).unwrap_err();
        assert_eq!(err, PredictActionError::NotOnInputPage);
        assert_eq!(session.state(), SessionState::Result { aqi: 120.0 });
        assert_eq!(model.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_back_then_repredict_reproduces_result() {
        let model = recording(63.5);
        let pipeline = pipeline_with(model.clone());
        let mut session = Session::new(pipeline.geography());

        let first = session.predict(chennai_form(), &pipeline).unwrap();
        assert!(session.back());
        assert_eq!(session.state(), SessionState::Input);
        assert_eq!(session.form(), &chennai_form());

        let form = session.form().clone();
        let second = session.predict(form, &pipeline).unwrap();
        assert_eq!(first, second);

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn test_successful_predict_clears_previous_notice() {
        let model = recording(10.0);
        let pipeline = pipeline_with(model);
        let mut session = Session::new(pipeline.geography());

        let mut bad = chennai_form();
        bad.city = "London".to_string();
        let _ = session.predict(bad, &pipeline);
        assert!(session.notice().is_some());

        session.predict(chennai_form(), &pipeline).unwrap();
        assert!(session.notice().is_none());
    }
}

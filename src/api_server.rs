// Axum web server: input page, result page, predict/back actions.
//
// Each browser session owns a `Session` in the session store; handlers load
// it, dispatch to the pure predict/back logic, and store it again. The model
// is shared read-only by all sessions.

use std::sync::Arc;

use anyhow::Context;
use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_htmx::HxRequest;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::{PredictActionError, PredictionError};
use crate::geography::GeographyTable;
use crate::model::{AqiModel, LoadedModel};
use crate::predictor::PredictorGateway;
use crate::readings::PredictionForm;
use crate::session::{PredictionPipeline, SessionState};
use crate::web::handlers::pages::{CityOptionsTemplate, InputTemplate, ResultTemplate};
use crate::web::session_store::{SessionId, SessionStore};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub pipeline: PredictionPipeline,
    pub geography: Arc<GeographyTable>,
    pub sessions: SessionStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Load the model artifact named in `config` and build the shared state.
    ///
    /// Fails if the artifact cannot be loaded; the server must not start
    /// without a model.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let path = config.model_path.clone();
        let model = tokio::task::spawn_blocking(move || LoadedModel::load(&path))
            .await
            .context("Model loading task failed")?
            .with_context(|| format!("Cannot start without model {}", config.model_path.display()))?;

        let model = Arc::new(model);
        let state = Self::with_model(model.clone(), GeographyTable::reference(), config);

        let schema = state.pipeline.schema();
        if model.audit_feature_names(schema.column_names()) {
            tracing::info!("Model feature order matches encoder schema v{}", schema.version());
        }

        Ok(state)
    }

    /// Build state around an already-constructed model.
    pub fn with_model(model: Arc<dyn AqiModel>, geography: GeographyTable, config: AppConfig) -> Self {
        let geography = Arc::new(geography);
        let gateway = PredictorGateway::new(model);
        let pipeline = PredictionPipeline::new(geography.clone(), gateway);

        let (produced, expected) = (pipeline.schema().len(), pipeline.gateway().input_width());
        if produced != expected {
            tracing::warn!(
                "Encoder produces {} features but the model expects {}; every prediction will fail",
                produced,
                expected
            );
        }

        let sessions = SessionStore::new(config.session_capacity, config.session_ttl, geography.clone());

        Self {
            pipeline,
            geography,
            sessions,
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Pages
        .route("/", get(show_page))
        .route("/predict", post(predict))
        .route("/back", post(back))

        // htmx fragment (or JSON for non-htmx callers)
        .route("/cities", get(cities))

        .nest_service("/static", ServeDir::new(static_dir))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Render whichever page the session is on.
async fn show_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (id, mut session) = state.sessions.resolve(&headers).await;
    if id.is_new() {
        tracing::debug!(active = state.sessions.entry_count(), "Starting new session");
    }

    let html = match session.state() {
        SessionState::Input => {
            let notice = session.take_notice();
            InputTemplate::new(&state.geography, session.form(), notice).render()?
        }
        SessionState::Result { aqi } => ResultTemplate::new(aqi).render()?,
    };

    state.sessions.save(&id, session).await;

    let mut response = Html(html).into_response();
    id.apply_cookie(&mut response);
    Ok(response)
}

/// Predict action: validate, encode, run the model, then redirect to `/`.
async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<PredictionForm>, FormRejection>,
) -> Result<Response, AppError> {
    let (id, mut session) = state.sessions.resolve(&headers).await;

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            if session.state().is_input() {
                let error = PredictActionError::InvalidForm(rejection.body_text());
                tracing::warn!("Predict action failed: {}", error);
                let previous = session.form().clone();
                session.reject(previous, &error);
            }
            state.sessions.save(&id, session).await;
            return Ok(redirect_home(&id));
        }
    };
    let pipeline = state.pipeline.clone();
    let fallback = (session.clone(), form.clone());

    // The model call is blocking; keep it off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        let mut session = session;
        let result = session.predict(form, &pipeline);
        (session, result)
    })
    .await;

    let session = match outcome {
        Ok((session, Ok(aqi))) => {
            tracing::info!("Predicted AQI {:.2}", aqi);
            session
        }
        Ok((session, Err(PredictActionError::NotOnInputPage))) => {
            tracing::debug!("Ignoring predict submission while a result is shown");
            session
        }
        Ok((session, Err(e))) => {
            tracing::warn!("Predict action failed: {}", e);
            session
        }
        Err(join_error) => {
            let (mut session, form) = fallback;
            let error = PredictActionError::from(PredictionError::Interrupted(join_error.to_string()));
            tracing::error!("Predict action failed: {}", error);
            session.reject(form, &error);
            session
        }
    };

    state.sessions.save(&id, session).await;

    Ok(redirect_home(&id))
}

/// Back action: return to the input page, then redirect to `/`.
async fn back(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (id, mut session) = state.sessions.resolve(&headers).await;

    if session.back() {
        tracing::debug!("Session returned to input page");
    }
    state.sessions.save(&id, session).await;

    Ok(redirect_home(&id))
}

/// 303 back to `/`, carrying the cookie for a fresh session.
fn redirect_home(id: &SessionId) -> Response {
    let mut response = Redirect::to("/").into_response();
    id.apply_cookie(&mut response);
    response
}

#[derive(Debug, serde::Deserialize)]
struct CitiesQuery {
    country: String,
}

/// Cities for a country: `<option>` fragment for htmx, JSON otherwise.
async fn cities(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    Query(params): Query<CitiesQuery>,
) -> Result<Response, AppError> {
    let cities = state
        .geography
        .cities_of(&params.country)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown country '{}'", params.country)))?;

    if is_htmx {
        let html = CityOptionsTemplate::new(cities).render()?;
        Ok(Html(html).into_response())
    } else {
        Ok(Json(serde_json::json!({
            "country": params.country,
            "cities": cities,
        }))
        .into_response())
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Internal(format!("Template error: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!("{}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

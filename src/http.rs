//! HTTP query interface
//!
//! Routes:
//! - `GET /latest` - latest processed reading
//! - `GET /recommendation` - soil type and advice from the latest reading
//! - `GET /preferences` - preference in effect
//! - `POST /preferences` - replace texture and color
//! - `GET /health` - liveness and ingest counters
//!
//! Browser clients are served only from origins on the allow-list; a
//! preflight from any other origin gets no CORS headers.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
    VARY,
};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::adapters::ModelSource;
use crate::config::ServerConfig;
use crate::domain::UserPreference;
use crate::state::SharedState;

pub const SERVICE_NAME: &str = "SoilSense Backend";

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
    pub model_source: ModelSource,
    pub cors_allowed_origins: Arc<[String]>,
}

impl AppState {
    /// State with the default origin allow-list
    pub fn new(shared: Arc<SharedState>, model_source: ModelSource) -> Self {
        Self {
            shared,
            model_source,
            cors_allowed_origins: ServerConfig::default().cors_allowed_origins.into(),
        }
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_allowed_origins = origins.into();
        self
    }

    fn allows_origin(&self, origin: &str) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == origin)
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/latest", get(latest_handler))
        .route("/recommendation", get(recommendation_handler))
        .route(
            "/preferences",
            get(preferences_handler).post(update_preferences_handler),
        )
        .route("/health", get(health_handler))
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .with_state(state)
}

async fn cors_middleware(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let origin = req
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|o| state.allows_origin(o))
        .and_then(|o| HeaderValue::from_str(o).ok());
    let preflight = req.method() == Method::OPTIONS;

    let mut resp = if preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    if let Some(origin) = origin {
        let headers = resp.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(VARY, HeaderValue::from_static("Origin"));
        if preflight {
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET,POST,OPTIONS"),
            );
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("content-type"));
        }
    }
    resp
}

async fn latest_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.shared.latest() {
        Some(reading) => Json(json!(*reading)),
        None => Json(json!({ "message": "No sensor data yet" })),
    }
}

async fn recommendation_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.shared.latest() {
        Some(reading) => Json(json!({
            "soil_type": reading.soil_type,
            "recommendation": reading.recommendation,
        })),
        None => Json(json!({ "message": "No recommendation yet" })),
    }
}

async fn preferences_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!(*state.shared.preference()))
}

async fn update_preferences_handler(
    State(state): State<AppState>,
    Json(prefs): Json<UserPreference>,
) -> impl IntoResponse {
    let accepted = state.shared.set_preference(prefs);
    info!(texture = %accepted.texture, color = %accepted.color, "Preferences updated");
    Json(json!({
        "message": "Preferences updated",
        "prefs": *accepted,
    }))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "processor_running": state.shared.processor_running(),
        "model": state.model_source.as_str(),
        "ingest": state.shared.stats().snapshot(),
    }))
}

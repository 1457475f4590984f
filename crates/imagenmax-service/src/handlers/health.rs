//! Liveness.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Whether image generation can be attempted.
    pub generation_available: bool,
    /// Whether prompt suggestions can be attempted.
    pub suggestions_available: bool,
    /// Whether image modification suggestions can be attempted.
    pub modifications_available: bool,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        generation_available: state.images.is_some(),
        suggestions_available: state.suggester.is_some(),
        modifications_available: state.modifications.is_some(),
    })
}

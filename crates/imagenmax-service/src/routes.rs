//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{account, generate, health, plans, session, suggestions};
use crate::state::AppState;

/// Maximum concurrent requests for provider-backed endpoints.
///
/// Generations serialise on the ledger lock anyway; this bounds the queue.
const PROVIDER_MAX_CONCURRENT_REQUESTS: usize = 8;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `GET /v1/account` - Current session's account
/// - `POST /v1/session/login` - Attach an email to the session
/// - `POST /v1/session/logout` - Start a fresh anonymous session
/// - `GET /v1/plans` - Plan catalog
/// - `POST /v1/plans/activate` - Activate a purchased plan
/// - `POST /v1/generate` - Generate images (billable)
/// - `POST /v1/suggestions` - Prompt suggestions (free)
/// - `POST /v1/suggestions/modifications` - Suggest edits to an image (free)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let state = Arc::new(state);

    let provider_routes = Router::new()
        .route("/generate", post(generate::generate))
        .route("/suggestions", post(suggestions::suggest))
        .route(
            "/suggestions/modifications",
            post(suggestions::suggest_modifications),
        )
        .layer(ConcurrencyLimitLayer::new(PROVIDER_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        .route("/account", get(account::get_account))
        .route("/session/login", post(session::login))
        .route("/session/logout", post(session::logout))
        .route("/plans", get(plans::list_plans))
        .route("/plans/activate", post(plans::activate_plan))
        .merge(provider_routes);

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

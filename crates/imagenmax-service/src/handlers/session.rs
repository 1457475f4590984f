//! Session handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use imagenmax_core::Identity;

use super::account::AccountResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email to attach to the session.
    pub email: String,
}

/// Attach an identity to the session.
///
/// Any anonymous balance is discarded.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let identity = Identity::parse(&request.email)?;

    let mut ledger = state.ledger.lock().await;
    let account = ledger.login(identity)?;

    Ok(Json(AccountResponse::new(&account, ledger.catalog())))
}

/// Detach the identity and start a fresh anonymous session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AccountResponse>, ApiError> {
    let mut ledger = state.ledger.lock().await;
    let account = ledger.logout()?;

    Ok(Json(AccountResponse::new(&account, ledger.catalog())))
}

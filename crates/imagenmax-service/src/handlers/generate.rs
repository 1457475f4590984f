//! Generation handler.
//!
//! The only billable action: the balance is checked before the provider is
//! contacted and charged only after it returned at least one image.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use imagenmax_client::GenerationRequest;
use imagenmax_core::Identity;

use super::account::AccountResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Generation response.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Generated images as `data:` URIs.
    pub images: Vec<String>,
    /// Failures from individual image requests, if some did not succeed.
    pub warnings: Vec<String>,
    /// The account after the charge.
    pub account: AccountResponse,
}

/// Generate images and charge for them.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<GenerationRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    request.prompt = request.prompt.trim().to_string();
    if request.prompt.is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".into()));
    }
    let provider = state
        .images
        .clone()
        .ok_or(ApiError::ProviderNotConfigured("image generation"))?;

    let mut ledger = state.ledger.lock().await;
    let before = ledger.ensure_affordable()?;

    tracing::debug!(
        identity = before.identity.as_ref().map_or("anonymous", Identity::as_str),
        credits = before.credits,
        quality = ?request.quality,
        "Generating images"
    );

    let images = provider.generate(&request).await?;
    let account = ledger.deduct_credits()?;

    Ok(Json(GenerateResponse {
        images: images.image_uris,
        warnings: images.warnings,
        account: AccountResponse::new(&account, ledger.catalog()),
    }))
}

//! Prompt and image modification suggestion handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use imagenmax_client::{split_data_uri, ModificationRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// Suggestion request.
#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    /// A short idea to elaborate.
    pub idea: String,
}

/// Suggestion response.
#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    /// Full prompts.
    pub suggestions: Vec<String>,
}

/// Turn an idea into full prompts. Free of charge.
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SuggestionRequest>,
) -> Result<Json<SuggestionResponse>, ApiError> {
    let idea = request.idea.trim();
    if idea.is_empty() {
        return Err(ApiError::BadRequest("idea must not be empty".into()));
    }
    let suggester = state
        .suggester
        .as_ref()
        .ok_or(ApiError::ProviderNotConfigured("prompt suggestions"))?;

    let suggestions = suggester.suggest(idea).await?;

    Ok(Json(SuggestionResponse { suggestions }))
}

/// Modification suggestion response.
#[derive(Debug, Serialize)]
pub struct ModificationResponse {
    /// One suggested edit, in prose.
    pub suggestion: String,
}

/// Suggest how to improve an existing image. Free of charge.
///
/// The image must be a base64 `data:` URI; anything else is refused before
/// the provider is called.
pub async fn suggest_modifications(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModificationRequest>,
) -> Result<Json<ModificationResponse>, ApiError> {
    if request.image_data_uri.trim().is_empty() {
        return Err(ApiError::BadRequest("image_data_uri must not be empty".into()));
    }
    if split_data_uri(&request.image_data_uri).is_none() {
        return Err(ApiError::BadRequest(
            "image_data_uri must be a base64 data: URI".into(),
        ));
    }
    let suggester = state
        .modifications
        .as_ref()
        .ok_or(ApiError::ProviderNotConfigured("modification suggestions"))?;

    let suggestion = suggester.suggest_modifications(&request).await?;
    tracing::debug!(chars = suggestion.len(), "Modification suggestion ready");

    Ok(Json(ModificationResponse { suggestion }))
}

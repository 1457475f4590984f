//! Plan catalog and activation handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use imagenmax_core::{Identity, PlanName, PlanSpec};

use super::account::AccountResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// One catalog entry as shown to buyers.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// Plan key.
    pub name: PlanName,
    /// Display name.
    pub label: String,
    /// Credits granted on activation.
    pub granted_credits: u64,
    /// Credits per generation.
    pub cost_per_action: u64,
    /// Length of the window opened by activation.
    pub duration_days: Option<u32>,
    /// Display price in cents.
    pub price_cents: u64,
    /// Whether the plan can be bought.
    pub purchasable: bool,
    /// External checkout link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
}

impl From<&PlanSpec> for PlanResponse {
    fn from(spec: &PlanSpec) -> Self {
        Self {
            name: spec.name,
            label: spec.name.to_string(),
            granted_credits: spec.granted_credits,
            cost_per_action: spec.cost_per_action,
            duration_days: spec.duration_days,
            price_cents: spec.price_cents,
            purchasable: spec.name != PlanName::Free,
            checkout_url: spec.checkout_url.clone(),
        }
    }
}

/// Catalog response.
#[derive(Debug, Serialize)]
pub struct PlansResponse {
    /// Plans in display order.
    pub plans: Vec<PlanResponse>,
}

/// List the plans on offer.
pub async fn list_plans(State(state): State<Arc<AppState>>) -> Json<PlansResponse> {
    let ledger = state.ledger.lock().await;
    Json(PlansResponse {
        plans: ledger.catalog().plans.iter().map(Into::into).collect(),
    })
}

/// Activation request.
#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    /// Plan to activate, e.g. `"pro"` or `"Booster Pack"`.
    pub plan: String,
    /// Email to log in with first, for anonymous buyers.
    #[serde(default)]
    pub email: Option<String>,
}

/// Activate a purchased plan for the session.
///
/// With an `email`, the session is logged in as that identity before the
/// activation, unless it already is. Plans that cannot be bought are refused
/// before any login, so a rejected request leaves the session untouched.
pub async fn activate_plan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActivateRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let plan: PlanName = request
        .plan
        .parse()
        .map_err(|e: imagenmax_core::UnknownPlan| ApiError::BadRequest(e.to_string()))?;
    let identity = request
        .email
        .as_deref()
        .filter(|email| !email.trim().is_empty())
        .map(Identity::parse)
        .transpose()?;

    let mut ledger = state.ledger.lock().await;
    ledger.purchasable_plan(plan)?;
    if let Some(identity) = identity {
        if ledger.identity() != Some(&identity) {
            ledger.login(identity)?;
        }
    }
    let account = ledger.activate_plan(plan)?;

    Ok(Json(AccountResponse::new(&account, ledger.catalog())))
}

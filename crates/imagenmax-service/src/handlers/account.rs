//! Account handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use imagenmax_core::{Account, PlanCatalog, PlanName};

use crate::error::ApiError;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Email the account belongs to; `None` for the anonymous session.
    pub identity: Option<String>,
    /// Active plan.
    pub plan: PlanName,
    /// Active plan, for display.
    pub plan_label: String,
    /// Spendable credits.
    pub credits: u64,
    /// What one generation costs on the active plan.
    pub cost_per_action: u64,
    /// When the active plan lapses.
    pub plan_expires_at: Option<DateTime<Utc>>,
    /// Whether another generation can be paid for.
    pub can_generate: bool,
}

impl AccountResponse {
    /// Build a response for `account` priced against `catalog`.
    #[must_use]
    pub fn new(account: &Account, catalog: &PlanCatalog) -> Self {
        let cost_per_action = catalog.cost_per_action(account.active_plan);
        Self {
            identity: account.identity.as_ref().map(ToString::to_string),
            plan: account.active_plan,
            plan_label: account.active_plan.to_string(),
            credits: account.credits,
            cost_per_action,
            plan_expires_at: account.plan_expires_at,
            can_generate: account.has_sufficient_credits(cost_per_action),
        }
    }
}

/// Get the current session's account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AccountResponse>, ApiError> {
    let ledger = state.ledger.lock().await;
    let account = ledger.current_account()?;

    Ok(Json(AccountResponse::new(&account, ledger.catalog())))
}

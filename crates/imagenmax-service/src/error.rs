//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use imagenmax_client::GenerationError;
use imagenmax_core::{IdentityError, LedgerError, PlanName};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A purchase needs an email first.
    #[error("an email is required to activate {plan}")]
    IdentityRequired {
        /// The plan the caller tried to activate.
        plan: PlanName,
    },

    /// Insufficient credits.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: u64,
        /// Cost of the action.
        required: u64,
    },

    /// The provider refused the prompt on content-safety grounds.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// The provider account is out of quota.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The provider failed.
    #[error("provider error: {0}")]
    Provider(String),

    /// No provider credentials were configured.
    #[error("{0} is not configured")]
    ProviderNotConfigured(&'static str),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::IdentityRequired { plan } => (
                StatusCode::UNAUTHORIZED,
                "identity_required",
                self.to_string(),
                Some(serde_json::json!({ "plan": plan })),
            ),
            Self::InsufficientCredits { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                format!(
                    "Not enough credits: {required} needed, {balance} available. \
                     Upgrade your plan or buy a booster pack."
                ),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::ContentBlocked(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "content_blocked",
                format!("{msg}. Try rephrasing the prompt."),
                None,
            ),
            Self::QuotaExceeded(msg) => (
                StatusCode::TOO_MANY_REQUESTS,
                "quota_exceeded",
                msg.clone(),
                None,
            ),
            Self::Provider(msg) => {
                tracing::warn!(error = %msg, "Provider request failed");
                (StatusCode::BAD_GATEWAY, "provider_error", msg.clone(), None)
            }
            Self::ProviderNotConfigured(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "provider_not_configured",
                self.to_string(),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            LedgerError::IdentityRequired { plan } => Self::IdentityRequired { plan },
            LedgerError::InvalidIdentity(_)
            | LedgerError::FreePlanNotPurchasable(_)
            | LedgerError::PlanUnavailable(_) => Self::BadRequest(err.to_string()),
            LedgerError::Storage(msg) | LedgerError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::ContentBlocked(msg) => Self::ContentBlocked(msg),
            GenerationError::Quota(msg) => Self::QuotaExceeded(msg),
            GenerationError::InvalidRequest(msg) => Self::BadRequest(msg),
            GenerationError::Configuration(msg) => Self::Internal(msg),
            other => Self::Provider(other.to_string()),
        }
    }
}

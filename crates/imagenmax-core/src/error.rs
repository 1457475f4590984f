//! Error types for the ImagenMax ledger.

use crate::identity::IdentityError;
use crate::plan::PlanName;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Insufficient credits for the action.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: u64,
        /// Cost of the action.
        required: u64,
    },

    /// A purchase was attempted without an identity attached to the session.
    #[error("an identity is required to activate {plan}")]
    IdentityRequired {
        /// The plan the caller tried to activate.
        plan: PlanName,
    },

    /// The supplied identity is not a usable email address.
    #[error("invalid identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    /// The free tier cannot be bought.
    #[error("the {0} plan cannot be activated")]
    FreePlanNotPurchasable(PlanName),

    /// The plan is not in the configured catalog.
    #[error("plan not offered: {0}")]
    PlanUnavailable(PlanName),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

//! Core types and ledger rules for ImagenMax.
//!
//! This crate provides the foundational types behind the credits ledger:
//!
//! - **Identity**: `Identity`, a normalised email used as the account key
//! - **Plans**: `PlanName`, `PlanSpec`, `PlanCatalog`
//! - **Accounts**: `Account` and the pure normalise / activate / deduct rules
//! - **Time**: `Clock`, `SystemClock`, `FixedClock`
//!
//! # Credits
//!
//! Credits are whole units. Every billable generation action costs the
//! `cost_per_action` of the account's active plan; a balance never goes below
//! zero.
//!
//! Nothing in this crate performs I/O. Persistence and session handling live in
//! `imagenmax-store`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod clock;
pub mod error;
pub mod identity;
pub mod plan;

pub use account::Account;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LedgerError, Result};
pub use identity::{Identity, IdentityError};
pub use plan::{
    CatalogError, PlanCatalog, PlanName, PlanSpec, UnknownPlan, BOOSTER_PACK_COST_PER_ACTION,
    BOOSTER_PACK_CREDITS, DEFAULT_COST_PER_ACTION, FREE_COST_PER_ACTION, FREE_CREDITS,
    MEGA_COST_PER_ACTION, MEGA_CREDITS, PRO_COST_PER_ACTION, PRO_CREDITS,
    SUBSCRIPTION_DURATION_DAYS,
};

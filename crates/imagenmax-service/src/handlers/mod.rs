//! API handlers.

pub mod account;
pub mod generate;
pub mod health;
pub mod plans;
pub mod session;
pub mod suggestions;

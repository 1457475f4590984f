//! ImagenMax HTTP API service.
//!
//! Puts the credits ledger and the generation providers behind a small JSON
//! API:
//!
//! - Session login / logout
//! - Account balance and plan
//! - Plan catalog and activation
//! - Image generation, charged per action
//! - Prompt suggestions and image modification suggestions
//!
//! # Sessions
//!
//! The process serves one ledger session, the way a single browser profile
//! does. Logging in switches the session to that email's account; logging out
//! starts a fresh anonymous one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ConfigError, ServiceConfig, StorageBackend};
pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, Ledger, Providers};

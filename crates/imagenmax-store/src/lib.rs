//! Storage and session layer for ImagenMax.
//!
//! This crate persists accounts in a flat string key-value store, the same
//! shape as browser local storage, and provides [`AccountLedger`], the single
//! service object that owns the current session and applies the ledger rules
//! from `imagenmax-core`.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local, for tests and throwaway sessions
//! - `RocksStore`: on-disk, behind the `rocksdb-backend` feature
//!
//! # Example
//!
//! ```
//! use imagenmax_core::{Identity, PlanCatalog, PlanName, SystemClock};
//! use imagenmax_store::{AccountLedger, MemoryStore};
//!
//! let mut ledger =
//!     AccountLedger::open(MemoryStore::new(), SystemClock, PlanCatalog::default()).unwrap();
//!
//! // Anonymous visitors start on the Free grant
//! let account = ledger.current_account().unwrap();
//! assert_eq!(account.active_plan, PlanName::Free);
//!
//! // Purchases need an identity
//! ledger.login(Identity::parse("ada@example.com").unwrap()).unwrap();
//! let account = ledger.activate_plan(PlanName::Pro).unwrap();
//! assert_eq!(account.credits, 3000);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod ledger;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

use std::sync::Arc;

pub use error::{Result, StoreError};
pub use ledger::AccountLedger;
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

/// The storage trait: a flat map from string keys to string values.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing). Writes are last-write-wins.
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

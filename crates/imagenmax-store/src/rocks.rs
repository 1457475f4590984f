//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the
//! `KeyValueStore` trait. Values are stored as UTF-8 strings in a single
//! column family.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options};

use crate::error::{Result, StoreError};
use crate::schema::{all_column_families, cf};
use crate::KeyValueStore;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }
}

impl KeyValueStore for RocksStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let cf = self.cf(cf::LOCAL_STORAGE)?;

        self.db
            .get_cf(&cf, key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| {
                String::from_utf8(data).map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .transpose()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let cf = self.cf(cf::LOCAL_STORAGE)?;

        self.db
            .put_cf(&cf, key.as_bytes(), value.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let cf = self.cf(cf::LOCAL_STORAGE)?;

        self.db
            .delete_cf(&cf, key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

//! Column families used by the `RocksDB` backend.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Flat string key-value pairs, mirroring browser local storage.
    pub const LOCAL_STORAGE: &str = "local_storage";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::LOCAL_STORAGE]
}

//! Service configuration.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use imagenmax_client::{DEFAULT_IMAGES_PER_GENERATION, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use imagenmax_core::{CatalogError, PlanCatalog};

/// Default Gemini API root.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Where accounts are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-process map; everything is lost on restart.
    #[default]
    Memory,
    /// `RocksDB` under `data_dir` (needs the `rocksdb-backend` feature).
    RocksDb,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "rocksdb" | "rocks" => Ok(Self::RocksDb),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `STORAGE_BACKEND` names something we do not know.
    #[error("unknown storage backend: {0}")]
    UnknownBackend(String),

    /// The plan catalog file could not be read.
    #[error("failed to read plan catalog {path}: {source}")]
    CatalogRead {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The plan catalog file is not valid JSON for a catalog.
    #[error("failed to parse plan catalog {path}: {source}")]
    CatalogParse {
        /// File path.
        path: String,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The plan catalog parsed but is unusable.
    #[error("invalid plan catalog: {0}")]
    InvalidCatalog(#[from] CatalogError),
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Storage backend (default: memory).
    pub storage_backend: StorageBackend,

    /// Path to the `RocksDB` data directory (default: "./data/imagenmax").
    pub data_dir: String,

    /// Gemini API key. Generation is unavailable without it.
    pub gemini_api_key: Option<String>,

    /// Gemini API root.
    pub gemini_base_url: String,

    /// Model used for images.
    pub gemini_image_model: String,

    /// Model used for prompt suggestions.
    pub gemini_text_model: String,

    /// Parallel image requests per generation action.
    pub images_per_generation: usize,

    /// Plans on offer.
    pub catalog: PlanCatalog,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Gemini secrets file structure.
#[derive(Debug, Deserialize)]
struct GeminiSecrets {
    api_key: String,
    #[serde(default)]
    base_url: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    ///
    /// # Errors
    ///
    /// Returns an error if `STORAGE_BACKEND` is unknown or the catalog named
    /// by `PLAN_CATALOG_PATH` cannot be loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let (gemini_api_key, secrets_base_url) = load_gemini_secrets();

        let storage_backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.storage_backend,
        };

        let catalog = match std::env::var("PLAN_CATALOG_PATH") {
            Ok(path) => {
                let catalog = load_catalog(&path)?;
                tracing::info!(path = %path, plans = catalog.plans.len(), "Loaded plan catalog");
                catalog
            }
            Err(_) => defaults.catalog,
        };

        Ok(Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            storage_backend,
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            gemini_api_key,
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .ok()
                .or(secrets_base_url)
                .unwrap_or(defaults.gemini_base_url),
            gemini_image_model: std::env::var("GEMINI_IMAGE_MODEL")
                .unwrap_or(defaults.gemini_image_model),
            gemini_text_model: std::env::var("GEMINI_TEXT_MODEL")
                .unwrap_or(defaults.gemini_text_model),
            images_per_generation: env_parse("IMAGES_PER_GENERATION")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.images_per_generation),
            catalog,
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or(defaults.cors_origins),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            storage_backend: StorageBackend::Memory,
            data_dir: "./data/imagenmax".into(),
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
            gemini_image_model: DEFAULT_IMAGE_MODEL.into(),
            gemini_text_model: DEFAULT_TEXT_MODEL.into(),
            images_per_generation: DEFAULT_IMAGES_PER_GENERATION,
            catalog: PlanCatalog::default(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 16 * 1024 * 1024,
            request_timeout_seconds: 120,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and validate a plan catalog from a JSON file.
///
/// # Errors
///
/// Returns an error if the file is missing, malformed, or fails validation.
pub fn load_catalog(path: &str) -> Result<PlanCatalog, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
        path: path.to_string(),
        source,
    })?;
    let catalog: PlanCatalog =
        serde_json::from_str(&contents).map_err(|source| ConfigError::CatalogParse {
            path: path.to_string(),
            source,
        })?;
    catalog.validate()?;
    Ok(catalog)
}

/// Load the Gemini key from a secrets file or the environment.
fn load_gemini_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/gemini.json",
        "imagenmax/.secrets/gemini.json",
        "../.secrets/gemini.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<GeminiSecrets>(path) {
            tracing::info!(path = %path, "Loaded Gemini secrets from file");
            return (Some(secrets.api_key), secrets.base_url);
        }
    }

    tracing::debug!("Gemini secrets file not found, using environment variables");
    (
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty()),
        None,
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

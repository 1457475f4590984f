//! ImagenMax Service - HTTP API for the credits ledger and image generation.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imagenmax_core::{Clock, SystemClock};
use imagenmax_service::{create_router, AppState, Ledger, ServiceConfig, StorageBackend};
use imagenmax_store::{KeyValueStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,imagenmax=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ImagenMax Service");

    let config = ServiceConfig::from_env()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        storage_backend = ?config.storage_backend,
        data_dir = %config.data_dir,
        gemini_configured = %config.gemini_api_key.is_some(),
        images_per_generation = config.images_per_generation,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ledger = Ledger::open(store, clock, config.catalog.clone())?;

    let state = AppState::new(ledger, config.clone());
    let app = create_router(state);

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn open_store(config: &ServiceConfig) -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage - accounts are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "rocksdb-backend")]
        StorageBackend::RocksDb => {
            tracing::info!(path = %config.data_dir, "Opening RocksDB store");
            Ok(Arc::new(imagenmax_store::RocksStore::open(&config.data_dir)?))
        }
        #[cfg(not(feature = "rocksdb-backend"))]
        StorageBackend::RocksDb => {
            Err("STORAGE_BACKEND=rocksdb needs the rocksdb-backend feature".into())
        }
    }
}

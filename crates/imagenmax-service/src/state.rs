//! Application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use imagenmax_client::{
    ClientOptions, GeminiClient, ImageProvider, ModificationSuggester, PromptSuggester,
};
use imagenmax_core::Clock;
use imagenmax_store::{AccountLedger, KeyValueStore};

use crate::config::ServiceConfig;

/// The ledger type the service runs on.
pub type Ledger = AccountLedger<Arc<dyn KeyValueStore>, Arc<dyn Clock>>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The single ledger for this process.
    ///
    /// Handlers hold the lock for a whole check-generate-deduct flow.
    pub ledger: Arc<Mutex<Ledger>>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Image provider (optional).
    pub images: Option<Arc<dyn ImageProvider>>,

    /// Prompt suggestion provider (optional).
    pub suggester: Option<Arc<dyn PromptSuggester>>,

    /// Image modification suggestion provider (optional).
    pub modifications: Option<Arc<dyn ModificationSuggester>>,
}

/// The AI providers a state is built with.
#[derive(Clone, Default)]
pub struct Providers {
    /// Image generation.
    pub images: Option<Arc<dyn ImageProvider>>,
    /// Prompt suggestions.
    pub suggester: Option<Arc<dyn PromptSuggester>>,
    /// Image modification suggestions.
    pub modifications: Option<Arc<dyn ModificationSuggester>>,
}

impl AppState {
    /// Create a new application state, building the Gemini client if a key
    /// is configured.
    #[must_use]
    pub fn new(ledger: Ledger, config: ServiceConfig) -> Self {
        let gemini = config.gemini_api_key.as_ref().and_then(|key| {
            let options = ClientOptions {
                image_model: config.gemini_image_model.clone(),
                text_model: config.gemini_text_model.clone(),
                images_per_generation: config.images_per_generation,
                ..ClientOptions::default()
            };
            match GeminiClient::with_options(&config.gemini_base_url, key, options) {
                Ok(client) => {
                    tracing::info!(
                        base_url = %config.gemini_base_url,
                        image_model = %config.gemini_image_model,
                        "Gemini integration enabled"
                    );
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Gemini client");
                    None
                }
            }
        });

        if gemini.is_none() {
            tracing::warn!("Gemini not configured - generation and suggestions are unavailable");
        }

        let providers = Providers {
            images: gemini
                .clone()
                .map(|client| client as Arc<dyn ImageProvider>),
            suggester: gemini
                .clone()
                .map(|client| client as Arc<dyn PromptSuggester>),
            modifications: gemini.map(|client| client as Arc<dyn ModificationSuggester>),
        };

        Self::with_providers(ledger, config, providers)
    }

    /// Create a state with explicit providers.
    #[must_use]
    pub fn with_providers(ledger: Ledger, config: ServiceConfig, providers: Providers) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            config,
            images: providers.images,
            suggester: providers.suggester,
            modifications: providers.modifications,
        }
    }
}

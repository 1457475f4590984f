//! Common test utilities for ImagenMax integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};

use imagenmax_client::{
    GeneratedImages, GenerationError, GenerationRequest, ImageProvider, ModificationRequest,
    ModificationSuggester, PromptSuggester,
};
use imagenmax_core::{Clock, FixedClock, PlanCatalog};
use imagenmax_service::{create_router, AppState, Ledger, Providers, ServiceConfig};
use imagenmax_store::{KeyValueStore, MemoryStore};

/// What the stub image provider does on the next call.
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    /// Return this many images.
    Images(usize),
    /// Return images plus a partial-failure warning.
    Partial(usize, String),
    /// Refuse on safety grounds.
    Blocked,
    /// Report an exhausted quota.
    Quota,
    /// Report a transient outage.
    Unavailable,
}

/// Image provider that answers from a script.
pub struct StubImages {
    outcome: Mutex<ImageOutcome>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubImages {
    pub fn new(outcome: ImageOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn set(&self, outcome: ImageOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for StubImages {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImages, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(request.prompt.clone());

        let outcome = self.outcome.lock().unwrap().clone();
        let images = |n: usize| {
            (0..n)
                .map(|i| format!("data:image/png;base64,aW1hZ2V{i}"))
                .collect()
        };
        match outcome {
            ImageOutcome::Images(n) => Ok(GeneratedImages {
                image_uris: images(n),
                warnings: Vec::new(),
            }),
            ImageOutcome::Partial(n, warning) => Ok(GeneratedImages {
                image_uris: images(n),
                warnings: vec![warning],
            }),
            ImageOutcome::Blocked => Err(GenerationError::ContentBlocked(
                "an image was blocked by the safety settings".into(),
            )),
            ImageOutcome::Quota => Err(GenerationError::Quota("quota exhausted".into())),
            ImageOutcome::Unavailable => Err(GenerationError::Transient("overloaded".into())),
        }
    }
}

/// Suggester that echoes its input.
pub struct StubSuggester;

#[async_trait]
impl PromptSuggester for StubSuggester {
    async fn suggest(&self, idea: &str) -> Result<Vec<String>, GenerationError> {
        Ok((1..=3).map(|i| format!("{idea}, variation {i}")).collect())
    }
}

#[async_trait]
impl ModificationSuggester for StubSuggester {
    async fn suggest_modifications(
        &self,
        request: &ModificationRequest,
    ) -> Result<String, GenerationError> {
        Ok(format!(
            "Lean into {}.",
            request.user_preferences.trim().to_lowercase()
        ))
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Clock shared with the ledger.
    pub clock: FixedClock,
    /// Backing store shared with the ledger.
    pub store: Arc<MemoryStore>,
    /// Scripted image provider.
    pub images: Arc<StubImages>,
}

/// 2026-05-10 09:00 UTC.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap()
}

impl TestHarness {
    /// A harness with working stub providers.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A harness with no providers configured.
    pub fn without_providers() -> Self {
        Self::build(false)
    }

    fn build(with_providers: bool) -> Self {
        let clock = FixedClock::at(start());
        let store = Arc::new(MemoryStore::new());
        let images = Arc::new(StubImages::new(ImageOutcome::Images(4)));

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            ..ServiceConfig::default()
        };

        let kv: Arc<dyn KeyValueStore> = store.clone();
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let ledger =
            Ledger::open(kv, shared_clock, PlanCatalog::default()).expect("Failed to open ledger");

        let providers = if with_providers {
            let suggester = Arc::new(StubSuggester);
            Providers {
                images: Some(images.clone() as Arc<dyn ImageProvider>),
                suggester: Some(suggester.clone() as Arc<dyn PromptSuggester>),
                modifications: Some(suggester as Arc<dyn ModificationSuggester>),
            }
        } else {
            Providers::default()
        };

        let state = AppState::with_providers(ledger, config, providers);
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            clock,
            store,
            images,
        }
    }

    /// Log the session in as `email`.
    pub async fn login(&self, email: &str) {
        self.server
            .post("/v1/session/login")
            .json(&serde_json::json!({ "email": email }))
            .await
            .assert_status_ok();
    }

    /// Fetch the current account as JSON.
    pub async fn account(&self) -> serde_json::Value {
        let response = self.server.get("/v1/account").await;
        response.assert_status_ok();
        response.json()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

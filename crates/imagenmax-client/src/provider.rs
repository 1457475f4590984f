//! Provider traits.
//!
//! The HTTP surface only sees these traits, so tests and alternative
//! backends can stand in for the hosted API.

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::types::{GeneratedImages, GenerationRequest, ModificationRequest};

/// Something that turns a prompt into images.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate images for `request`.
    ///
    /// Succeeds when at least one image was produced.
    ///
    /// # Errors
    ///
    /// Returns an error when no image could be produced.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GeneratedImages, GenerationError>;
}

/// Something that elaborates a short idea into full prompts.
#[async_trait]
pub trait PromptSuggester: Send + Sync {
    /// Suggest prompts for `idea`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails or answers with no suggestions.
    async fn suggest(&self, idea: &str) -> Result<Vec<String>, GenerationError>;
}

/// Something that looks at an image and proposes how to improve it.
#[async_trait]
pub trait ModificationSuggester: Send + Sync {
    /// Suggest modifications for the image in `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the image URI is malformed, the provider fails, or
    /// it answers with nothing.
    async fn suggest_modifications(
        &self,
        request: &ModificationRequest,
    ) -> Result<String, GenerationError>;
}

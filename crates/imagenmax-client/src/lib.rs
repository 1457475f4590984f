//! ImagenMax generation clients.
//!
//! Provider traits used by the service, plus a client for the hosted Gemini
//! API that implements them.
//!
//! # Example
//!
//! ```no_run
//! use imagenmax_client::{GeminiClient, GenerationRequest, ImageProvider, Quality};
//!
//! # async fn example() -> Result<(), imagenmax_client::GenerationError> {
//! let client = GeminiClient::new(
//!     "https://generativelanguage.googleapis.com",
//!     "your-api-key",
//! )?;
//!
//! let mut request = GenerationRequest::new("a lighthouse on a cliff at dusk");
//! request.style = Some("Watercolor".to_string());
//! request.quality = Quality::UltraHd;
//!
//! let images = client.generate(&request).await?;
//! println!("{} images", images.image_uris.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod gemini;
mod prompt;
mod provider;
mod types;

pub use error::GenerationError;
pub use gemini::{ClientOptions, GeminiClient, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
pub use prompt::compose_prompt;
pub use provider::{ImageProvider, ModificationSuggester, PromptSuggester};
pub use types::*;

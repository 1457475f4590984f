//! Request and response types for the generation providers.

use serde::{Deserialize, Serialize};

/// Number of images requested per generation action.
pub const DEFAULT_IMAGES_PER_GENERATION: usize = 4;

/// Number of prompt suggestions returned per idea.
pub const SUGGESTION_COUNT: usize = 3;

/// A prompt plus optional creative controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The main subject of the image.
    pub prompt: String,
    /// Artistic style, e.g. "Watercolor".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Emotional mood.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Lighting style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting: Option<String>,
    /// Named colour palette. `Default` means no constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_palette: Option<String>,
    /// Aspect ratio, either `16:9` or a label such as `Widescreen (16:9)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Output quality.
    #[serde(default)]
    pub quality: Quality,
}

impl GenerationRequest {
    /// A request with only a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Output quality tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Standard quality.
    #[default]
    #[serde(alias = "Standard Quality")]
    Standard,
    /// 4K, ultra-high resolution.
    #[serde(rename = "4k", alias = "4K Quality")]
    UltraHd,
}

/// Images returned by a generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImages {
    /// Generated images as `data:` URIs.
    pub image_uris: Vec<String>,
    /// Distinct failure messages from requests that did not produce an image.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// An image to critique plus what the user is after.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationRequest {
    /// The image as a `data:<mime>;base64,<data>` URI.
    pub image_data_uri: String,
    /// The user's aesthetic preferences, free text.
    #[serde(default)]
    pub user_preferences: String,
    /// Industry or goal the image is for, free text.
    #[serde(default)]
    pub industry_best_practices: String,
}

/// Split a base64 `data:` URI into its MIME type and payload.
///
/// Returns `None` unless both parts are present.
#[must_use]
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let (mime_type, data) = uri.trim().strip_prefix("data:")?.split_once(";base64,")?;
    (!mime_type.is_empty() && !data.is_empty()).then_some((mime_type, data))
}

//! Hosted Gemini API client.
//!
//! Implements [`ImageProvider`], [`PromptSuggester`] and
//! [`ModificationSuggester`] over the `generateContent` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::prompt::compose_prompt;
use crate::provider::{ImageProvider, ModificationSuggester, PromptSuggester};
use crate::types::{
    split_data_uri, GeneratedImages, GenerationRequest, ModificationRequest,
    DEFAULT_IMAGES_PER_GENERATION, SUGGESTION_COUNT,
};

/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Default text model for prompt suggestions.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash-latest";

/// Finish reasons that mean the output was withheld by a safety filter.
const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
];

/// Image models must be asked for both modalities.
const IMAGE_MODALITIES: &[&str] = &["TEXT", "IMAGE"];

/// Relaxed thresholds so artistic prompts are not over-blocked.
const SAFETY_SETTINGS: &[SafetySetting] = &[
    SafetySetting {
        category: "HARM_CATEGORY_HATE_SPEECH",
        threshold: "BLOCK_ONLY_HIGH",
    },
    SafetySetting {
        category: "HARM_CATEGORY_DANGEROUS_CONTENT",
        threshold: "BLOCK_NONE",
    },
    SafetySetting {
        category: "HARM_CATEGORY_HARASSMENT",
        threshold: "BLOCK_ONLY_HIGH",
    },
    SafetySetting {
        category: "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        threshold: "BLOCK_ONLY_HIGH",
    },
];

/// Gemini API client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    options: ClientOptions,
}

impl GeminiClient {
    /// Create a new client with default options.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root (e.g., `"https://generativelanguage.googleapis.com"`)
    /// * `api_key` - Gemini API key
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, `images_per_generation` is zero,
    /// or the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::Configuration("API key is empty".into()));
        }
        if options.images_per_generation == 0 {
            return Err(GenerationError::Configuration(
                "images_per_generation must be at least 1".into(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| GenerationError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            options,
        })
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Request a single image for an already composed prompt.
    async fn generate_one(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![Content::text(prompt)],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(IMAGE_MODALITIES),
                response_mime_type: None,
            }),
            safety_settings: SAFETY_SETTINGS,
        };

        let response = self
            .generate_content(&self.options.image_model, &body)
            .await?;
        extract_image(response)
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    GenerationError::Transient(e.to_string())
                } else {
                    GenerationError::Http(e)
                }
            })?;

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GenerationError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let (message, api_status) = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => (envelope.error.message, envelope.error.status),
            Err(_) => (format!("HTTP {status}"), None),
        };

        if status.as_u16() == 429 || api_status.as_deref() == Some("RESOURCE_EXHAUSTED") {
            Err(GenerationError::Quota(message))
        } else if status.is_server_error() {
            Err(GenerationError::Transient(message))
        } else {
            Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ImageProvider for GeminiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImages, GenerationError> {
        let prompt = compose_prompt(request);
        let attempts = (0..self.options.images_per_generation).map(|_| self.generate_one(&prompt));
        let results = join_all(attempts).await;

        let mut image_uris = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(uri) => image_uris.push(uri),
                Err(e) => failures.push(e),
            }
        }

        let mut warnings: Vec<String> = Vec::new();
        for failure in &failures {
            let message = failure.to_string();
            if !warnings.contains(&message) {
                warnings.push(message);
            }
        }

        if image_uris.is_empty() {
            tracing::error!(errors = ?warnings, "Image generation failed");
            return Err(failures
                .into_iter()
                .max_by_key(GenerationError::severity)
                .unwrap_or_else(|| GenerationError::InvalidResponse("no images returned".into())));
        }

        if !warnings.is_empty() {
            tracing::warn!(
                produced = image_uris.len(),
                requested = self.options.images_per_generation,
                errors = ?warnings,
                "Some image requests failed"
            );
        }

        Ok(GeneratedImages {
            image_uris,
            warnings,
        })
    }
}

#[async_trait]
impl PromptSuggester for GeminiClient {
    async fn suggest(&self, idea: &str) -> Result<Vec<String>, GenerationError> {
        let instruction = format!(
            "You help people write prompts for an AI image generator. Turn the idea below \
             into {SUGGESTION_COUNT} distinct, richly detailed prompts. Each prompt is one \
             paragraph describing subject, setting, art style, mood and lighting. Answer with \
             JSON of the form {{\"suggestions\": [\"...\"]}}.\n\nIdea: {}",
            idea.trim()
        );
        let body = GenerateContentRequest {
            contents: vec![Content::text(&instruction)],
            generation_config: Some(GenerationConfig {
                response_modalities: None,
                response_mime_type: Some("application/json"),
            }),
            safety_settings: &[],
        };

        let response = self.generate_content(&self.options.text_model, &body).await?;
        let text = response_text(response)?;

        let suggestions: Vec<String> = match serde_json::from_str::<SuggestionPayload>(&text)? {
            SuggestionPayload::Wrapped { suggestions } | SuggestionPayload::Bare(suggestions) => {
                suggestions
            }
        }
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(SUGGESTION_COUNT)
        .collect();

        if suggestions.is_empty() {
            return Err(GenerationError::InvalidResponse("no suggestions returned".into()));
        }
        Ok(suggestions)
    }
}

#[async_trait]
impl ModificationSuggester for GeminiClient {
    async fn suggest_modifications(
        &self,
        request: &ModificationRequest,
    ) -> Result<String, GenerationError> {
        let (mime_type, data) = split_data_uri(&request.image_data_uri).ok_or_else(|| {
            GenerationError::InvalidRequest("image must be a base64 data: URI".into())
        })?;

        let instruction = format!(
            "You review images made with an AI image generator. Look at the attached image \
             and suggest concrete visual modifications that would improve it for this \
             person. Consider composition, colour, lighting, subject and style.\n\n\
             User preferences: {}\nIndustry best practices: {}",
            or_unspecified(&request.user_preferences),
            or_unspecified(&request.industry_best_practices),
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineDataRef { mime_type, data },
                    },
                    RequestPart::Text { text: &instruction },
                ],
            }],
            generation_config: None,
            safety_settings: &[],
        };

        let response = self.generate_content(&self.options.text_model, &body).await?;
        let text = response_text(response)?;
        let suggestion = text.trim();
        if suggestion.is_empty() {
            return Err(GenerationError::InvalidResponse(
                "no modification suggestion returned".into(),
            ));
        }
        Ok(suggestion.to_string())
    }
}

fn or_unspecified(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "not specified"
    } else {
        value
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::ContentBlocked(format!(
            "the prompt was blocked ({reason})"
        )));
    }

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .ok_or_else(|| GenerationError::InvalidResponse("no text in response".into()))
}

/// Pull the first inline image out of a response as a `data:` URI.
fn extract_image(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::ContentBlocked(format!(
            "the prompt was blocked ({reason})"
        )));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::InvalidResponse("no candidates returned".into()))?;

    let image = candidate.content.and_then(|content| {
        content
            .parts
            .into_iter()
            .find_map(|part| part.inline_data)
    });
    if let Some(data) = image {
        return Ok(format!("data:{};base64,{}", data.mime_type, data.data));
    }

    match candidate.finish_reason.as_deref() {
        Some(reason) if SAFETY_FINISH_REASONS.contains(&reason) => Err(
            GenerationError::ContentBlocked("an image was blocked by the safety settings".into()),
        ),
        Some("RECITATION") => Err(GenerationError::ContentBlocked(
            "an image was blocked for reproducing existing content".into(),
        )),
        _ => Err(GenerationError::InvalidResponse(
            candidate
                .finish_message
                .unwrap_or_else(|| "no image in response".into()),
        )),
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 90).
    pub timeout_seconds: u64,
    /// Model used for images.
    pub image_model: String,
    /// Model used for prompt suggestions.
    pub text_model: String,
    /// Parallel image requests per generation (default: 4).
    pub images_per_generation: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 90,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            images_per_generation: DEFAULT_IMAGES_PER_GENERATION,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "no_settings")]
    safety_settings: &'static [SafetySetting],
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_settings(settings: &&[SafetySetting]) -> bool {
    settings.is_empty()
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            parts: vec![RequestPart::Text { text }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataRef<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataRef<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
    finish_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuggestionPayload {
    Wrapped { suggestions: Vec<String> },
    Bare(Vec<String>),
}

//! Prompt composition.
//!
//! The creative controls are folded into one instruction string. The subject
//! always comes first; each control adds one sentence.

use crate::types::{GenerationRequest, Quality};

/// Palette value meaning "no palette constraint".
const DEFAULT_PALETTE: &str = "Default";

const ULTRA_HD_OUTPUT: &str = "Output: 4K, ultra-high resolution, photorealistic detail, \
                               sharp focus, intricate and professional.";

const STANDARD_OUTPUT: &str = "Output: high quality, detailed, professional, clear focus.";

const PREAMBLE: &str = "Render a striking, carefully composed image that follows the \
                        creative controls below exactly.";

/// Build the full provider prompt for a request.
#[must_use]
pub fn compose_prompt(request: &GenerationRequest) -> String {
    let mut parts = vec![
        format!("Primary subject: {}.", request.prompt.trim()),
        PREAMBLE.to_string(),
    ];

    if let Some(style) = non_empty(request.style.as_deref()) {
        parts.push(format!(
            "Artistic style (highest priority): the whole image must be rendered in a '{style}' style."
        ));
    }
    if let Some(mood) = non_empty(request.mood.as_deref()) {
        parts.push(format!(
            "Mood: the scene must feel '{mood}', and colour, light and composition should support it."
        ));
    }
    if let Some(lighting) = non_empty(request.lighting.as_deref()) {
        parts.push(format!("Lighting: use '{lighting}' lighting as a dominant feature."));
    }
    if let Some(palette) = non_empty(request.color_palette.as_deref()) {
        if palette != DEFAULT_PALETTE {
            parts.push(format!("Colour palette: keep strictly to a '{palette}' palette."));
        }
    }
    if let Some(ratio) = non_empty(request.aspect_ratio.as_deref()) {
        parts.push(format!("Aspect ratio: {}.", extract_ratio(ratio)));
    }

    parts.push(
        match request.quality {
            Quality::UltraHd => ULTRA_HD_OUTPUT,
            Quality::Standard => STANDARD_OUTPUT,
        }
        .to_string(),
    );

    parts.join(" ")
}

/// Pull `16:9` out of a label like `Widescreen (16:9)`.
fn extract_ratio(label: &str) -> &str {
    label
        .find('(')
        .and_then(|open| {
            let rest = &label[open + 1..];
            rest.find(')').map(|close| rest[..close].trim())
        })
        .filter(|ratio| !ratio.is_empty())
        .unwrap_or_else(|| label.trim())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_prompt_has_subject_and_quality() {
        let prompt = compose_prompt(&GenerationRequest::new("  a red fox  "));
        assert!(prompt.starts_with("Primary subject: a red fox."));
        assert!(prompt.ends_with(STANDARD_OUTPUT));
        assert!(!prompt.contains("style"));
    }

    #[test]
    fn controls_are_included_in_order() {
        let request = GenerationRequest {
            prompt: "a castle".into(),
            style: Some("Ukiyo-e".into()),
            mood: Some("Serene".into()),
            lighting: Some("Golden hour".into()),
            color_palette: Some("Pastel".into()),
            aspect_ratio: Some("Widescreen (16:9)".into()),
            quality: Quality::UltraHd,
        };
        let prompt = compose_prompt(&request);

        let style = prompt.find("'Ukiyo-e'").unwrap();
        let mood = prompt.find("'Serene'").unwrap();
        let lighting = prompt.find("'Golden hour'").unwrap();
        let palette = prompt.find("'Pastel'").unwrap();
        let ratio = prompt.find("Aspect ratio: 16:9.").unwrap();
        assert!(style < mood && mood < lighting && lighting < palette && palette < ratio);
        assert!(prompt.contains("4K, ultra-high resolution"));
    }

    #[test]
    fn default_palette_and_blank_controls_are_skipped() {
        let request = GenerationRequest {
            prompt: "a bridge".into(),
            color_palette: Some("Default".into()),
            style: Some("   ".into()),
            ..GenerationRequest::default()
        };
        let prompt = compose_prompt(&request);
        assert!(!prompt.contains("palette"));
        assert!(!prompt.contains("Artistic style"));
    }

    #[test]
    fn ratio_extraction() {
        assert_eq!(extract_ratio("Portrait (9:16)"), "9:16");
        assert_eq!(extract_ratio("1:1"), "1:1");
        assert_eq!(extract_ratio("Odd ()"), "Odd ()");
        assert_eq!(extract_ratio("Unclosed (4:3"), "Unclosed (4:3");
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, GenResult};
use crate::utils;

/// An in-memory image payload as exchanged with the UI and the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub base64: String,
    pub mime_type: String,
}

impl ImageData {
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(utils::encode_byte_to_base64(bytes), mime_type)
    }

    /// Reads an image from disk; the MIME type comes from the content when it can be
    /// sniffed, otherwise from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = utils::read_file_bytes(path)?;
        let mime_type = utils::sniff_mime_type(&bytes)
            .map(str::to_string)
            .unwrap_or_else(|| utils::detect_mime_type(path));
        Ok(Self::from_bytes(&bytes, mime_type))
    }

    pub fn decode(&self) -> anyhow::Result<Vec<u8>> {
        utils::decode_base64(&self.base64)
    }

    /// Checks that the payload carries a usable image MIME type that agrees with the
    /// bytes it encodes. `label` names the input in the error message.
    pub fn validate(&self, label: &str) -> GenResult<()> {
        let declared = utils::normalize_mime_type(&self.mime_type);
        if declared.is_empty() {
            return Err(GenError::validation(format!("{label} is missing a MIME type.")));
        }
        if !declared.starts_with("image/") {
            return Err(GenError::validation(format!(
                "{label} has unsupported MIME type '{declared}'."
            )));
        }

        let bytes = self
            .decode()
            .map_err(|err| GenError::validation(format!("{label} is not valid base64: {err}")))?;
        if bytes.is_empty() {
            return Err(GenError::validation(format!("{label} is empty.")));
        }

        if let Some(sniffed) = utils::sniff_mime_type(&bytes) {
            if sniffed.starts_with("image/") && utils::normalize_mime_type(sniffed) != declared {
                return Err(GenError::validation(format!(
                    "{label} is declared as '{declared}' but contains '{sniffed}' data."
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }

    pub fn supports_video(self) -> bool {
        matches!(self, AspectRatio::Landscape16x9 | AspectRatio::Portrait9x16)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputQuality {
    #[default]
    Standard,
    High,
    Maximum,
}

impl OutputQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputQuality::Standard => "standard",
            OutputQuality::High => "high",
            OutputQuality::Maximum => "maximum",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "standard" => Some(OutputQuality::Standard),
            "high" => Some(OutputQuality::High),
            "maximum" => Some(OutputQuality::Maximum),
            _ => None,
        }
    }

    /// Descriptor appended to generation prompts. Empty for the standard tier.
    pub fn prompt_suffix(self) -> &'static str {
        match self {
            OutputQuality::Standard => "",
            OutputQuality::High => {
                ", 4K resolution, high detail, professional photography, sharp focus"
            }
            OutputQuality::Maximum => {
                ", 8K resolution, ultra-detailed, photorealistic, cinematic lighting, masterpiece"
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MagicAction {
    Upscale,
    RemoveBackground,
    ColorCorrect,
    RemoveObject,
    ChangeBackground,
    BeautifyPortrait,
}

impl MagicAction {
    pub fn requires_prompt(self) -> bool {
        matches!(self, MagicAction::RemoveObject | MagicAction::ChangeBackground)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionTarget {
    #[default]
    Prompt,
    VideoIdea,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default = "default_image_count")]
    pub number_of_images: u32,
    #[serde(default)]
    pub quality: Option<OutputQuality>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOptions {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    pub character_images: Vec<ImageData>,
    #[serde(default)]
    pub product_image: Option<ImageData>,
    #[serde(default)]
    pub background_image: Option<ImageData>,
    #[serde(default = "default_variations")]
    pub number_of_variations: u32,
    #[serde(default)]
    pub quality: Option<OutputQuality>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOptions {
    #[serde(default)]
    pub prompt: String,
    pub source_face_image: Option<ImageData>,
    pub target_image: Option<ImageData>,
    #[serde(default = "default_variations")]
    pub number_of_variations: u32,
    #[serde(default)]
    pub quality: Option<OutputQuality>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicOptions {
    pub action: MagicAction,
    pub image: Option<ImageData>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub quality: Option<OutputQuality>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOptions {
    pub image: Option<ImageData>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestOptions {
    #[serde(default)]
    pub target: SuggestionTarget,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub images: Vec<ImageData>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOptions {
    pub prompt: String,
    #[serde(default = "default_video_aspect_ratio")]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub image: Option<ImageData>,
}

fn default_image_count() -> u32 {
    4
}

fn default_variations() -> u32 {
    1
}

fn default_video_aspect_ratio() -> AspectRatio {
    AspectRatio::Landscape16x9
}

/// One user-initiated operation. The result shape is fixed by the variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "options", rename_all = "lowercase")]
pub enum OperationRequest {
    Generate(GenerateOptions),
    Edit(EditOptions),
    Swap(SwapOptions),
    Magic(MagicOptions),
    Analyze(AnalyzeOptions),
    Suggest(SuggestOptions),
    Video(VideoOptions),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Generate,
    Edit,
    Swap,
    Magic,
    Analyze,
    Suggest,
    Video,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Generate => "generate",
            OperationKind::Edit => "edit",
            OperationKind::Swap => "swap",
            OperationKind::Magic => "magic",
            OperationKind::Analyze => "analyze",
            OperationKind::Suggest => "suggest",
            OperationKind::Video => "video",
        }
    }
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Generate(_) => OperationKind::Generate,
            OperationRequest::Edit(_) => OperationKind::Edit,
            OperationRequest::Swap(_) => OperationKind::Swap,
            OperationRequest::Magic(_) => OperationKind::Magic,
            OperationRequest::Analyze(_) => OperationKind::Analyze,
            OperationRequest::Suggest(_) => OperationKind::Suggest,
            OperationRequest::Video(_) => OperationKind::Video,
        }
    }

    /// Fills in the session quality tier on requests that did not pick one.
    pub fn apply_default_quality(&mut self, quality: OutputQuality) {
        let slot = match self {
            OperationRequest::Generate(options) => &mut options.quality,
            OperationRequest::Edit(options) => &mut options.quality,
            OperationRequest::Swap(options) => &mut options.quality,
            OperationRequest::Magic(options) => &mut options.quality,
            _ => return,
        };
        slot.get_or_insert(quality);
    }
}

/// A finished video: the downloaded bytes, ready to be written somewhere playable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoClip {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub source_uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationResult {
    Images(Vec<ImageData>),
    Text(String),
    Suggestions(Vec<String>),
    Video(VideoClip),
}

/// One segment of a multimodal provider call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Image(ImageData),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn image(image: &ImageData) -> Self {
        Part::Image(image.clone())
    }
}

/// Ordered parts of the first candidate of a content call, plus whatever the
/// provider said about why it stopped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentResponse {
    pub parts: Vec<Part>,
    pub finish_reason: Option<String>,
    pub block_reason: Option<String>,
}

impl ContentResponse {
    pub fn first_image(&self) -> Option<&ImageData> {
        self.parts.iter().find_map(|part| match part {
            Part::Image(image) if !image.base64.trim().is_empty() => Some(image),
            _ => None,
        })
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Best explanation for a response without usable output.
    pub fn explanation(&self) -> Option<String> {
        let text = self.text();
        let text = text.trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
        if let Some(reason) = &self.block_reason {
            return Some(format!("The request was blocked by the provider ({reason})."));
        }
        self.finish_reason
            .as_deref()
            .filter(|reason| *reason != "STOP")
            .map(|reason| format!("The provider stopped without output ({reason})."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PNG: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn validate_accepts_matching_mime() {
        let image = ImageData::from_bytes(&PNG, "image/png");
        assert!(image.validate("Character image").is_ok());
    }

    #[test]
    fn validate_rejects_empty_mime() {
        let image = ImageData::from_bytes(&PNG, "  ");
        let err = image.validate("Character image").unwrap_err();
        assert_eq!(err, GenError::validation("Character image is missing a MIME type."));
    }

    #[test]
    fn validate_rejects_mismatched_mime() {
        let image = ImageData::from_bytes(&PNG, "image/jpeg");
        assert!(matches!(
            image.validate("Target image"),
            Err(GenError::Validation(message)) if message.contains("image/png")
        ));
    }

    #[test]
    fn validate_rejects_bad_base64() {
        let image = ImageData::new("***", "image/png");
        assert!(image.validate("Image").is_err());
    }

    #[test]
    fn validate_allows_unrecognised_bytes() {
        let image = ImageData::from_bytes(b"opaque-bytes", "image/png");
        assert!(image.validate("Image").is_ok());
    }

    #[test]
    fn request_deserializes_from_tagged_json() {
        let request: OperationRequest = serde_json::from_value(json!({
            "kind": "magic",
            "options": {
                "action": "remove-object",
                "image": { "base64": "AAAA", "mimeType": "image/png" },
                "prompt": "the red umbrella"
            }
        }))
        .unwrap();

        let OperationRequest::Magic(options) = request else {
            panic!("expected a magic request");
        };
        assert_eq!(options.action, MagicAction::RemoveObject);
        assert_eq!(options.prompt.as_deref(), Some("the red umbrella"));
        assert_eq!(options.quality, None);
    }

    #[test]
    fn aspect_ratio_uses_ratio_strings() {
        let value = serde_json::to_value(AspectRatio::Landscape16x9).unwrap();
        assert_eq!(value, json!("16:9"));
        let parsed: AspectRatio = serde_json::from_value(json!("3:4")).unwrap();
        assert_eq!(parsed, AspectRatio::Portrait3x4);
    }

    #[test]
    fn quality_parses_stored_names() {
        assert_eq!(OutputQuality::parse(" High "), Some(OutputQuality::High));
        assert_eq!(OutputQuality::parse("maximum"), Some(OutputQuality::Maximum));
        assert_eq!(OutputQuality::parse("ultra"), None);
        for quality in [OutputQuality::Standard, OutputQuality::High, OutputQuality::Maximum] {
            assert_eq!(OutputQuality::parse(quality.as_str()), Some(quality));
        }
    }

    #[test]
    fn default_quality_only_fills_missing_tier() {
        let mut request = OperationRequest::Generate(GenerateOptions {
            prompt: "cat".into(),
            aspect_ratio: AspectRatio::Square,
            number_of_images: 1,
            quality: Some(OutputQuality::High),
        });
        request.apply_default_quality(OutputQuality::Maximum);
        let OperationRequest::Generate(options) = &request else {
            unreachable!()
        };
        assert_eq!(options.quality, Some(OutputQuality::High));

        let mut request = OperationRequest::Magic(MagicOptions {
            action: MagicAction::Upscale,
            image: None,
            prompt: None,
            quality: None,
        });
        request.apply_default_quality(OutputQuality::Maximum);
        let OperationRequest::Magic(options) = &request else {
            unreachable!()
        };
        assert_eq!(options.quality, Some(OutputQuality::Maximum));
    }

    #[test]
    fn explanation_prefers_provider_text() {
        let response = ContentResponse {
            parts: vec![Part::text("I can't edit this photo.")],
            finish_reason: Some("STOP".into()),
            block_reason: None,
        };
        assert_eq!(
            response.explanation().as_deref(),
            Some("I can't edit this photo.")
        );

        let blocked = ContentResponse {
            block_reason: Some("SAFETY".into()),
            ..ContentResponse::default()
        };
        assert!(blocked.explanation().unwrap().contains("SAFETY"));
        assert_eq!(ContentResponse::default().explanation(), None);
    }
}

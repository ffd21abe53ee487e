use genapi::ImageData;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub base64: String,
}

/// A finished clip written into the output library, playable from `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAsset {
    pub path: String,
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationResultPayload {
    Images { images: Vec<ImageData> },
    Text { text: String },
    Suggestions { suggestions: Vec<String> },
    Video { video: VideoAsset },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPresetPayload {
    pub name: String,
    pub images: Vec<ImageData>,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeySource {
    User,
    Environment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyStatus {
    pub configured: bool,
    pub source: Option<ApiKeySource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownStatus {
    pub remaining_secs: u64,
}

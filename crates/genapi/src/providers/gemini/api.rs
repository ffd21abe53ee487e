use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::builder::{ContentCall, ImageGenerationCall, ResponseFormat, VideoJobCall};
use crate::classify::{ProviderFailure, RESOURCE_EXHAUSTED_STATUS};
use crate::config::StudioConfig;
use crate::providers::{DownloadedAsset, JobHandle, JobStatus, Provider};
use crate::suggestions::suggestion_schema;
use crate::types::{ContentResponse, ImageData, Part};
use crate::utils::{normalize_mime_type, truncate_for_log};

use super::models::{ErrorEnvelope, GeminiResponse, Operation, PredictResponse};

const DEFAULT_INLINE_MIME: &str = "image/png";
const DEFAULT_VIDEO_MIME: &str = "video/mp4";
/// gRPC code carried by long-running operation errors for exhausted resources.
const GRPC_RESOURCE_EXHAUSTED: u16 = 8;

/// Gemini REST client covering Imagen prediction, multimodal content, and Veo jobs.
#[derive(Clone)]
pub struct GeminiProvider {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(config: &StudioConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build the Gemini HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    /// Same client and endpoint, different credentials.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..self.clone()
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        let model = model.trim();
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{model}:{method}", self.base_url)
    }

    fn operation_url(&self, name: &str) -> String {
        let trimmed = name.trim().trim_start_matches('/');
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return trimmed.to_string();
        }
        format!("{}/{trimmed}", self.base_url)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<T, ProviderFailure> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| ProviderFailure::transport(format!("HTTP request failed: {err}")))?;

        decode_response(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderFailure> {
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|err| ProviderFailure::transport(format!("HTTP request failed: {err}")))?;

        decode_response(response).await
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate_images(
        &self,
        call: &ImageGenerationCall,
    ) -> Result<Vec<ImageData>, ProviderFailure> {
        let url = self.model_url(&call.model, "predict");
        let body = build_predict_body(call);
        debug!(model = %call.model, count = call.count, "sending Imagen predict request");

        let response: PredictResponse = self.post_json(&url, &body).await?;
        response_to_images(response, &call.output_mime_type)
    }

    async fn generate_content(
        &self,
        call: &ContentCall,
    ) -> Result<ContentResponse, ProviderFailure> {
        let url = self.model_url(&call.model, "generateContent");
        let body = build_content_body(call);
        let summary = Value::Array(summarize_parts(&call.parts));
        debug!(model = %call.model, parts = %summary, "sending generateContent request");

        let response: GeminiResponse = self.post_json(&url, &body).await?;
        Ok(response_to_content(response))
    }

    async fn submit_video(&self, call: &VideoJobCall) -> Result<JobHandle, ProviderFailure> {
        let url = self.model_url(&call.model, "predictLongRunning");
        let body = build_video_body(call);
        debug!(model = %call.model, seeded = call.image.is_some(), "submitting video job");

        let operation: Operation = self.post_json(&url, &body).await?;
        if let Some(error) = operation.error {
            return Err(operation_failure(error));
        }
        Ok(JobHandle(operation.name))
    }

    async fn poll_video(&self, handle: &JobHandle) -> Result<JobStatus, ProviderFailure> {
        let url = self.operation_url(handle.as_str());
        let operation: Operation = self.get_json(&url).await?;
        Ok(operation_to_status(operation))
    }

    async fn download(&self, uri: &str) -> Result<DownloadedAsset, ProviderFailure> {
        let response = self
            .http
            .get(uri)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|err| ProviderFailure::transport(format!("Video download failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_failure(status.as_u16(), &body));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| !value.is_empty() && value != "application/octet-stream")
            .unwrap_or_else(|| DEFAULT_VIDEO_MIME.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ProviderFailure::transport(format!("Reading video bytes failed: {err}")))?;

        Ok(DownloadedAsset {
            bytes: bytes.to_vec(),
            mime_type,
        })
    }
}

pub fn convert_body_parts_gemini(parts: &[Part]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::Image(image) => json!({
                "inlineData": {
                    "mimeType": normalize_mime_type(&image.mime_type),
                    "data": image.base64.trim()
                }
            }),
        })
        .collect()
}

pub fn build_content_body(call: &ContentCall) -> Value {
    let mut body = Map::new();
    body.insert(
        "contents".to_string(),
        json!([{ "role": "user", "parts": convert_body_parts_gemini(&call.parts) }]),
    );

    match call.format {
        ResponseFormat::Image => {
            body.insert(
                "generationConfig".to_string(),
                json!({ "responseModalities": ["IMAGE", "TEXT"] }),
            );
        }
        ResponseFormat::Suggestions => {
            body.insert(
                "generationConfig".to_string(),
                json!({
                    "responseMimeType": "application/json",
                    "responseSchema": suggestion_schema()
                }),
            );
        }
        ResponseFormat::Text => {}
    }

    Value::Object(body)
}

pub fn build_predict_body(call: &ImageGenerationCall) -> Value {
    json!({
        "instances": [{ "prompt": call.prompt }],
        "parameters": {
            "sampleCount": call.count,
            "aspectRatio": call.aspect_ratio.as_str(),
            "outputOptions": { "mimeType": call.output_mime_type }
        }
    })
}

pub fn build_video_body(call: &VideoJobCall) -> Value {
    let mut instance = Map::new();
    instance.insert("prompt".to_string(), json!(call.prompt));
    if let Some(image) = &call.image {
        instance.insert(
            "image".to_string(),
            json!({
                "bytesBase64Encoded": image.base64.trim(),
                "mimeType": normalize_mime_type(&image.mime_type)
            }),
        );
    }

    json!({
        "instances": [Value::Object(instance)],
        "parameters": {
            "aspectRatio": call.aspect_ratio.as_str(),
            "sampleCount": 1
        }
    })
}

pub fn response_to_content(response: GeminiResponse) -> ContentResponse {
    let block_reason = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);

    let Some(candidate) = response.candidates.into_iter().next() else {
        return ContentResponse {
            parts: Vec::new(),
            finish_reason: None,
            block_reason,
        };
    };

    let parts = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| {
            if let Some(inline_data) = part.inline_data {
                let mime_type = inline_data.mime_type.trim();
                let mime_type = if mime_type.is_empty() {
                    DEFAULT_INLINE_MIME
                } else {
                    mime_type
                };
                return Some(Part::Image(ImageData::new(inline_data.data, mime_type)));
            }
            part.text.map(Part::Text)
        })
        .collect();

    ContentResponse {
        parts,
        finish_reason: candidate.finish_reason,
        block_reason,
    }
}

fn response_to_images(
    response: PredictResponse,
    fallback_mime: &str,
) -> Result<Vec<ImageData>, ProviderFailure> {
    let mut filtered_reason = None;
    let mut images = Vec::new();

    for prediction in response.predictions {
        match prediction.bytes_base64_encoded {
            Some(data) if !data.trim().is_empty() => {
                let mime_type = prediction
                    .mime_type
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| fallback_mime.to_string());
                images.push(ImageData::new(data, mime_type));
            }
            _ => {
                if filtered_reason.is_none() {
                    filtered_reason = prediction.rai_filtered_reason;
                }
            }
        }
    }

    if images.is_empty() {
        return Err(ProviderFailure::no_output(filtered_reason));
    }
    Ok(images)
}

fn operation_to_status(operation: Operation) -> JobStatus {
    if !operation.done {
        return JobStatus::Running;
    }
    if let Some(error) = operation.error {
        return JobStatus::Failed(operation_failure(error));
    }

    let Some(response) = operation
        .response
        .and_then(|response| response.generate_video_response)
    else {
        return JobStatus::Done {
            video_uris: Vec::new(),
            filtered_reasons: Vec::new(),
        };
    };

    let video_uris = response
        .generated_samples
        .into_iter()
        .filter_map(|sample| sample.video.and_then(|video| video.uri))
        .filter(|uri| !uri.trim().is_empty())
        .collect();
    let filtered_reasons = response
        .rai_media_filtered_reasons
        .into_iter()
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty())
        .collect();

    JobStatus::Done {
        video_uris,
        filtered_reasons,
    }
}

fn operation_failure(error: super::models::ApiErrorBody) -> ProviderFailure {
    let status = error.status.or_else(|| {
        (error.code == Some(GRPC_RESOURCE_EXHAUSTED)).then(|| RESOURCE_EXHAUSTED_STATUS.to_string())
    });
    ProviderFailure::Api {
        http_status: None,
        status,
        message: error
            .message
            .unwrap_or_else(|| "Video generation failed".to_string()),
    }
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, ProviderFailure> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| ProviderFailure::transport(format!("Reading response body failed: {err}")))?;

    if !status.is_success() {
        return Err(api_failure(status.as_u16(), &text));
    }

    serde_json::from_str(&text).map_err(|err| {
        ProviderFailure::transport(format!(
            "Failed to decode Gemini response JSON: {err}. Raw response: {}",
            truncate_for_log(&text, 300)
        ))
    })
}

fn api_failure(http_status: u16, body: &str) -> ProviderFailure {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ProviderFailure::Api {
            http_status: Some(http_status),
            status: envelope.error.status,
            message: envelope
                .error
                .message
                .unwrap_or_else(|| format!("Request failed with status {http_status}")),
        },
        Err(_) => ProviderFailure::Api {
            http_status: Some(http_status),
            status: None,
            message: if body.trim().is_empty() {
                format!("Request failed with status {http_status}")
            } else {
                truncate_for_log(body.trim(), 300)
            },
        },
    }
}

fn summarize_parts(parts: &[Part]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": truncate_for_log(text, 200) }),
            Part::Image(image) => json!({
                "inlineData": { "mimeType": image.mime_type, "dataLen": image.base64.len() }
            }),
        })
        .collect()
}

use std::time::Duration;

use genapi::builder::{ContentCall, ResponseFormat};
use genapi::types::{
    AspectRatio, GenerateOptions, MagicAction, MagicOptions, OutputQuality, Part, VideoOptions,
};
use genapi::{
    ErrorKind, GeminiProvider, ImageData, OperationRequest, OperationResult, Provider, Studio,
    StudioConfig,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn config(server: &MockServer) -> StudioConfig {
    StudioConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.uri(),
        variation_delay: Duration::ZERO,
        poll_interval: Duration::from_millis(10),
        max_polls: 5,
        ..StudioConfig::default()
    }
}

fn studio(server: &MockServer) -> Studio<GeminiProvider> {
    let config = config(server);
    Studio::new(GeminiProvider::new(&config).expect("client"), &config)
}

fn upscale_request() -> OperationRequest {
    OperationRequest::Magic(MagicOptions {
        action: MagicAction::Upscale,
        image: Some(ImageData::from_bytes(&PNG, "image/png")),
        prompt: None,
        quality: Some(OutputQuality::High),
    })
}

#[tokio::test]
async fn generate_posts_imagen_predict_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/imagen-4.0-generate-001:predict"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "instances": [{ "prompt": "a paper lantern festival" }],
            "parameters": {
                "sampleCount": 2,
                "aspectRatio": "3:4",
                "outputOptions": { "mimeType": "image/jpeg" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [
                { "bytesBase64Encoded": "AAAA", "mimeType": "image/jpeg" },
                { "bytesBase64Encoded": "BBBB", "mimeType": "image/jpeg" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = studio(&server)
        .execute(&OperationRequest::Generate(GenerateOptions {
            prompt: "a paper lantern festival".into(),
            aspect_ratio: AspectRatio::Portrait3x4,
            number_of_images: 2,
            quality: None,
        }))
        .await
        .expect("generate");

    assert_eq!(
        result,
        OperationResult::Images(vec![
            ImageData::new("AAAA", "image/jpeg"),
            ImageData::new("BBBB", "image/jpeg"),
        ])
    );
}

#[tokio::test]
async fn edit_extracts_inline_image_from_content_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image-preview:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Upscaled." },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                    ]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = studio(&server)
        .execute(&upscale_request())
        .await
        .expect("magic edit");

    assert_eq!(
        result,
        OperationResult::Images(vec![ImageData::new("iVBORw0KGgo=", "image/png")])
    );
}

#[tokio::test]
async fn resource_exhausted_envelope_is_quota_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image-preview:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted (e.g. check quota).",
                "status": "RESOURCE_EXHAUSTED"
            }
        })))
        .mount(&server)
        .await;

    let err = studio(&server)
        .execute(&upscale_request())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QuotaExhausted);
    assert!(err.to_string().contains("Resource has been exhausted"));
}

#[tokio::test]
async fn bare_429_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash-image-preview:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = studio(&server)
        .execute(&upscale_request())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimited);
}

#[tokio::test]
async fn suggestion_call_sends_schema_and_parses_fenced_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "```json\n{\"suggestions\": [\"slow pan\", \"dolly in\", \"orbit\"]}\n```" }
                ]}
            }]
        })))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(&config(&server)).expect("client");
    let response = provider
        .generate_content(&ContentCall {
            model: "gemini-2.5-flash".into(),
            parts: vec![Part::text("ideas please")],
            format: ResponseFormat::Suggestions,
        })
        .await
        .expect("content");

    assert_eq!(
        genapi::suggestions::parse_suggestions(&response.text()).unwrap(),
        vec!["slow pan", "dolly in", "orbit"]
    );
}

#[tokio::test]
async fn video_job_is_submitted_polled_and_downloaded() {
    let server = MockServer::start().await;
    let operation = "models/veo-2.0-generate-001/operations/op-1";
    let video_uri = format!("{}/files/video-1:download?alt=media", server.uri());

    Mock::given(method("POST"))
        .and(path("/models/veo-2.0-generate-001:predictLongRunning"))
        .and(body_partial_json(json!({
            "instances": [{ "prompt": "fireflies over a pond" }],
            "parameters": { "aspectRatio": "9:16", "sampleCount": 1 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": operation })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{operation}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": operation,
            "done": false
        })))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{operation}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": operation,
            "done": true,
            "response": { "generateVideoResponse": { "generatedSamples": [
                { "video": { "uri": video_uri } }
            ]}}
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/video-1:download"))
        .and(query_param("alt", "media"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "video/mp4")
                .set_body_bytes(b"fake-mp4".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = studio(&server)
        .execute(&OperationRequest::Video(VideoOptions {
            prompt: "fireflies over a pond".into(),
            aspect_ratio: AspectRatio::Portrait9x16,
            image: None,
        }))
        .await
        .expect("video");

    let OperationResult::Video(clip) = result else {
        panic!("expected a video clip");
    };
    assert_eq!(clip.data, b"fake-mp4".to_vec());
    assert_eq!(clip.mime_type, "video/mp4");
    assert_eq!(clip.source_uri, video_uri);
}

#[tokio::test]
async fn finished_video_without_samples_is_generation_failure() {
    let server = MockServer::start().await;
    let operation = "models/veo-2.0-generate-001/operations/op-2";

    Mock::given(method("POST"))
        .and(path("/models/veo-2.0-generate-001:predictLongRunning"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": operation })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{operation}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": operation,
            "done": true,
            "response": { "generateVideoResponse": {
                "raiMediaFilteredReasons": ["Your prompt mentions a public figure"]
            }}
        })))
        .mount(&server)
        .await;

    let err = studio(&server)
        .execute(&OperationRequest::Video(VideoOptions {
            prompt: "a crowded stadium".into(),
            aspect_ratio: AspectRatio::Landscape16x9,
            image: None,
        }))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    assert!(err.to_string().contains("public figure"));
}

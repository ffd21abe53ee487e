//! Scripted provider for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::builder::{ContentCall, ImageGenerationCall, VideoJobCall};
use crate::classify::ProviderFailure;
use crate::providers::{DownloadedAsset, JobHandle, JobStatus, Provider};
use crate::types::{ContentResponse, ImageData, Part};

#[derive(Default)]
pub(crate) struct MockProvider {
    content: Mutex<VecDeque<Result<ContentResponse, ProviderFailure>>>,
    content_calls: Mutex<Vec<(ContentCall, Instant)>>,
    images: Mutex<VecDeque<Result<Vec<ImageData>, ProviderFailure>>>,
    image_calls: Mutex<Vec<ImageGenerationCall>>,
    submit_failure: Mutex<Option<ProviderFailure>>,
    video_calls: Mutex<Vec<VideoJobCall>>,
    polls: Mutex<VecDeque<Result<JobStatus, ProviderFailure>>>,
    poll_count: Mutex<u32>,
    download: Mutex<Option<DownloadedAsset>>,
    downloads: Mutex<Vec<String>>,
}

impl MockProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_content(&self, response: Result<ContentResponse, ProviderFailure>) {
        self.content.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_images(&self, response: Result<Vec<ImageData>, ProviderFailure>) {
        self.images.lock().unwrap().push_back(response);
    }

    pub(crate) fn fail_submit(&self, failure: ProviderFailure) {
        *self.submit_failure.lock().unwrap() = Some(failure);
    }

    /// Once the script runs out the job reports `Running` forever.
    pub(crate) fn push_poll(&self, status: Result<JobStatus, ProviderFailure>) {
        self.polls.lock().unwrap().push_back(status);
    }

    pub(crate) fn set_download(&self, bytes: Vec<u8>, mime_type: &str) {
        *self.download.lock().unwrap() = Some(DownloadedAsset {
            bytes,
            mime_type: mime_type.to_string(),
        });
    }

    pub(crate) fn content_calls(&self) -> Vec<ContentCall> {
        self.content_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(call, _)| call.clone())
            .collect()
    }

    pub(crate) fn content_call_instants(&self) -> Vec<Instant> {
        self.content_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    pub(crate) fn image_calls(&self) -> Vec<ImageGenerationCall> {
        self.image_calls.lock().unwrap().clone()
    }

    pub(crate) fn video_calls(&self) -> Vec<VideoJobCall> {
        self.video_calls.lock().unwrap().clone()
    }

    pub(crate) fn poll_count(&self) -> u32 {
        *self.poll_count.lock().unwrap()
    }

    pub(crate) fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate_images(
        &self,
        call: &ImageGenerationCall,
    ) -> Result<Vec<ImageData>, ProviderFailure> {
        self.image_calls.lock().unwrap().push(call.clone());
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderFailure::transport("no scripted image response")))
    }

    async fn generate_content(
        &self,
        call: &ContentCall,
    ) -> Result<ContentResponse, ProviderFailure> {
        self.content_calls
            .lock()
            .unwrap()
            .push((call.clone(), Instant::now()));
        self.content
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderFailure::transport("no scripted content response")))
    }

    async fn submit_video(&self, call: &VideoJobCall) -> Result<JobHandle, ProviderFailure> {
        self.video_calls.lock().unwrap().push(call.clone());
        match self.submit_failure.lock().unwrap().take() {
            Some(failure) => Err(failure),
            None => Ok(JobHandle("operations/mock-job".to_string())),
        }
    }

    async fn poll_video(&self, _handle: &JobHandle) -> Result<JobStatus, ProviderFailure> {
        *self.poll_count.lock().unwrap() += 1;
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(JobStatus::Running))
    }

    async fn download(&self, uri: &str) -> Result<DownloadedAsset, ProviderFailure> {
        self.downloads.lock().unwrap().push(uri.to_string());
        self.download
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ProviderFailure::transport("no scripted download"))
    }
}

pub(crate) fn image_response(base64: &str) -> ContentResponse {
    ContentResponse {
        parts: vec![
            Part::text("Here is the edited image."),
            Part::Image(ImageData::new(base64, "image/png")),
        ],
        finish_reason: Some("STOP".to_string()),
        block_reason: None,
    }
}

pub(crate) fn text_response(text: &str) -> ContentResponse {
    ContentResponse {
        parts: vec![Part::text(text)],
        finish_reason: Some("STOP".to_string()),
        block_reason: None,
    }
}

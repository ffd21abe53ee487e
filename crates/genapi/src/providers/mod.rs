pub mod gemini;

use async_trait::async_trait;

use crate::builder::{ContentCall, ImageGenerationCall, VideoJobCall};
use crate::classify::ProviderFailure;
use crate::types::{ContentResponse, ImageData};

pub use gemini::GeminiProvider;

/// Opaque token for an in-progress video job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobHandle(pub String);

impl JobHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    /// Finished; zero URIs means the provider produced nothing, and
    /// `filtered_reasons` then says why when the provider reports it.
    Done {
        video_uris: Vec<String>,
        filtered_reasons: Vec<String>,
    },
    Failed(ProviderFailure),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedAsset {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// The four call shapes of the hosted generation service.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate_images(
        &self,
        call: &ImageGenerationCall,
    ) -> Result<Vec<ImageData>, ProviderFailure>;

    async fn generate_content(&self, call: &ContentCall)
    -> Result<ContentResponse, ProviderFailure>;

    async fn submit_video(&self, call: &VideoJobCall) -> Result<JobHandle, ProviderFailure>;

    async fn poll_video(&self, handle: &JobHandle) -> Result<JobStatus, ProviderFailure>;

    async fn download(&self, uri: &str) -> Result<DownloadedAsset, ProviderFailure>;
}

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::builder::VideoJobCall;
use crate::classify::classify;
use crate::config::StudioConfig;
use crate::error::{GenError, GenResult};
use crate::providers::{JobStatus, Provider};
use crate::types::VideoClip;

const EMPTY_RESULT_MESSAGE: &str = "Video generation finished with an empty result, possibly filtered by the provider's safety checks. Try a different prompt or image.";

/// Drives a long-running video job: submit, then poll at a fixed interval until done
/// or until `max_polls` status checks have been spent.
#[derive(Clone, Copy, Debug)]
pub struct VideoPoller {
    interval: Duration,
    max_polls: u32,
}

impl VideoPoller {
    pub fn new(interval: Duration, max_polls: u32) -> Self {
        Self {
            interval,
            max_polls: max_polls.max(1),
        }
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        Self::new(config.poll_interval, config.max_polls)
    }

    pub fn max_polls(&self) -> u32 {
        self.max_polls
    }

    pub async fn run<P>(&self, provider: &P, call: &VideoJobCall) -> GenResult<VideoClip>
    where
        P: Provider + ?Sized,
    {
        let handle = provider.submit_video(call).await.map_err(classify)?;
        info!(job = handle.as_str(), "video job submitted");

        for poll in 1..=self.max_polls {
            sleep(self.interval).await;

            match provider.poll_video(&handle).await.map_err(classify)? {
                JobStatus::Running => {
                    debug!(job = handle.as_str(), poll, "video job still running");
                }
                JobStatus::Failed(failure) => {
                    warn!(job = handle.as_str(), poll, %failure, "video job failed");
                    return Err(classify(failure));
                }
                JobStatus::Done {
                    video_uris,
                    filtered_reasons,
                } => {
                    let Some(uri) = video_uris.into_iter().next() else {
                        warn!(
                            job = handle.as_str(),
                            poll,
                            reasons = ?filtered_reasons,
                            "video job finished without samples"
                        );
                        return Err(GenError::GenerationFailed(empty_result_message(
                            &filtered_reasons,
                        )));
                    };

                    let asset = provider.download(&uri).await.map_err(classify)?;
                    if asset.bytes.is_empty() {
                        return Err(GenError::GenerationFailed(EMPTY_RESULT_MESSAGE.to_string()));
                    }
                    info!(
                        job = handle.as_str(),
                        polls = poll,
                        bytes = asset.bytes.len(),
                        "video job finished"
                    );
                    return Ok(VideoClip {
                        data: asset.bytes,
                        mime_type: asset.mime_type,
                        source_uri: uri,
                    });
                }
            }
        }

        Err(GenError::Timeout {
            polls: self.max_polls,
            elapsed_secs: self.interval.as_secs() * u64::from(self.max_polls),
        })
    }
}

/// Provider filter reasons, when present, follow the generic explanation.
fn empty_result_message(filtered_reasons: &[String]) -> String {
    if filtered_reasons.is_empty() {
        return EMPTY_RESULT_MESSAGE.to_string();
    }
    format!(
        "{EMPTY_RESULT_MESSAGE} Provider reason: {}",
        filtered_reasons.join("; ")
    )
}

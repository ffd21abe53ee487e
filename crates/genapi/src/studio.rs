use std::time::Duration;

use tracing::{info, warn};

use crate::builder::{self, ProviderCall};
use crate::classify::{ProviderFailure, classify};
use crate::config::{ModelSet, StudioConfig};
use crate::error::GenResult;
use crate::orchestrator::run_variations;
use crate::poller::VideoPoller;
use crate::providers::Provider;
use crate::suggestions::parse_suggestions;
use crate::types::{OperationRequest, OperationResult};

/// Runs operations end to end: validate and build, call the provider, shape the result.
pub struct Studio<P> {
    provider: P,
    models: ModelSet,
    variation_delay: Duration,
    poller: VideoPoller,
}

impl<P: Provider> Studio<P> {
    pub fn new(provider: P, config: &StudioConfig) -> Self {
        Self {
            provider,
            models: config.models.clone(),
            variation_delay: config.variation_delay,
            poller: VideoPoller::from_config(config),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn execute(&self, request: &OperationRequest) -> GenResult<OperationResult> {
        let kind = request.kind().as_str();
        let call = match builder::build(request, &self.models) {
            Ok(call) => call,
            Err(err) => {
                warn!(kind, %err, "operation rejected");
                return Err(err);
            }
        };

        info!(kind, "operation submitted");
        let result = self.dispatch(call).await;
        match &result {
            Ok(output) => info!(kind, outputs = output_count(output), "operation succeeded"),
            Err(err) => warn!(kind, error_kind = ?err.kind(), %err, "operation failed"),
        }
        result
    }

    async fn dispatch(&self, call: ProviderCall) -> GenResult<OperationResult> {
        match call {
            ProviderCall::GenerateImages(call) => {
                let mut images = self
                    .provider
                    .generate_images(&call)
                    .await
                    .map_err(classify)?;
                if images.is_empty() {
                    return Err(classify(ProviderFailure::no_output(None)));
                }
                images.truncate(call.count as usize);
                Ok(OperationResult::Images(images))
            }
            ProviderCall::Edit { call, variations } => {
                run_variations(&self.provider, &call, variations, self.variation_delay)
                    .await
                    .map(OperationResult::Images)
            }
            ProviderCall::Describe(call) => {
                let response = self
                    .provider
                    .generate_content(&call)
                    .await
                    .map_err(classify)?;
                let text = response.text().trim().to_string();
                if text.is_empty() {
                    return Err(classify(ProviderFailure::no_output(response.explanation())));
                }
                Ok(OperationResult::Text(text))
            }
            ProviderCall::Suggest(call) => {
                let response = self
                    .provider
                    .generate_content(&call)
                    .await
                    .map_err(classify)?;
                parse_suggestions(&response.text()).map(OperationResult::Suggestions)
            }
            ProviderCall::Video(call) => self
                .poller
                .run(&self.provider, &call)
                .await
                .map(OperationResult::Video),
        }
    }
}

fn output_count(result: &OperationResult) -> usize {
    match result {
        OperationResult::Images(images) => images.len(),
        OperationResult::Suggestions(suggestions) => suggestions.len(),
        OperationResult::Text(_) | OperationResult::Video(_) => 1,
    }
}

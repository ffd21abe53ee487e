use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::builder::ContentCall;
use crate::classify::{ProviderFailure, classify};
use crate::error::{GenError, GenResult};
use crate::providers::Provider;
use crate::types::ImageData;

/// Issues `count` sequential image calls, pausing `delay` between them.
///
/// Results come back in call order. The first failure aborts the batch and any images
/// already received are dropped.
pub async fn run_variations<P>(
    provider: &P,
    call: &ContentCall,
    count: u32,
    delay: Duration,
) -> GenResult<Vec<ImageData>>
where
    P: Provider + ?Sized,
{
    if count == 0 {
        return Err(GenError::validation("At least one variation is required."));
    }

    let mut images = Vec::with_capacity(count as usize);
    for index in 0..count {
        debug!(variation = index + 1, total = count, model = %call.model, "requesting variation");

        let response = provider.generate_content(call).await.map_err(classify)?;
        let Some(image) = response.first_image().cloned() else {
            return Err(classify(ProviderFailure::no_output(response.explanation())));
        };
        images.push(image);

        if index + 1 < count {
            info!(
                completed = index + 1,
                total = count,
                delay_secs = delay.as_secs(),
                "waiting before next variation"
            );
            sleep(delay).await;
        }
    }

    Ok(images)
}

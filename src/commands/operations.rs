use std::path::Path;
use std::time::Instant;

use genapi::catalog::{predefined_prompts, PredefinedPrompt};
use genapi::{ImageData, OperationKind, OperationRequest, OperationResult, VideoClip};
use tauri::State;
use tracing::info;

use crate::constants::VIDEO_FILE_PREFIX;
use crate::error::{CommandError, CommandResult};
use crate::fs_utils::{ensure_output_dir, write_asset};
use crate::models::{CooldownStatus, OperationResultPayload, VideoAsset};
use crate::state::AppState;

#[tauri::command]
pub async fn run_operation(
    state: State<'_, AppState>,
    request: OperationRequest,
) -> CommandResult<OperationResultPayload> {
    state.cooldown.lock().check(Instant::now())?;

    let mut request = request;
    let quality = state.preferences.lock().quality();
    request.apply_default_quality(quality);

    let studio = state.studio()?;
    let result = match studio.execute(&request).await {
        Ok(result) => result,
        Err(err) => {
            state.cooldown.lock().record(&err, Instant::now());
            return Err(err.into());
        }
    };

    Ok(match result {
        OperationResult::Images(images) => OperationResultPayload::Images { images },
        OperationResult::Text(text) => OperationResultPayload::Text { text },
        OperationResult::Suggestions(suggestions) => {
            OperationResultPayload::Suggestions { suggestions }
        }
        OperationResult::Video(clip) => OperationResultPayload::Video {
            video: store_video(&state.data_dir, &clip).await?,
        },
    })
}

async fn store_video(data_dir: &Path, clip: &VideoClip) -> CommandResult<VideoAsset> {
    let output_dir = ensure_output_dir(data_dir).await?;
    let path = write_asset(&output_dir, VIDEO_FILE_PREFIX, &clip.data, &clip.mime_type).await?;
    let path = path
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| CommandError::storage("Video path is not valid UTF-8."))?;
    info!(path = %path, source = %clip.source_uri, "video stored");

    Ok(VideoAsset {
        path,
        mime_type: clip.mime_type.clone(),
        size: clip.data.len() as u64,
    })
}

#[tauri::command]
pub fn cooldown_status(state: State<'_, AppState>) -> CooldownStatus {
    CooldownStatus {
        remaining_secs: state.cooldown.lock().remaining_secs(Instant::now()),
    }
}

#[tauri::command]
pub fn list_predefined_prompts(mode: OperationKind) -> Vec<PredefinedPrompt> {
    predefined_prompts(mode).to_vec()
}

/// Reads a local image picked by the user into an upload payload.
#[tauri::command]
pub async fn load_image(path: String) -> CommandResult<ImageData> {
    let trimmed = path.trim().to_string();
    if trimmed.is_empty() {
        return Err(CommandError::validation("Image path cannot be empty."));
    }

    let image = tauri::async_runtime::spawn_blocking(move || ImageData::from_path(&trimmed))
        .await
        .map_err(|err| CommandError::storage(format!("Image loading task failed: {err}")))?
        .map_err(|err| CommandError::validation(format!("{err:#}")))?;

    image.validate("Selected image")?;
    Ok(image)
}

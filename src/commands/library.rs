use genapi::ImageData;
use tauri::State;

use crate::constants::IMAGE_FILE_PREFIX;
use crate::error::{CommandError, CommandResult};
use crate::fs_utils::{
    build_stored_image, collect_directory_images, delete_from_directory, do_open_dir,
    ensure_output_dir, write_asset,
};
use crate::models::StoredImage;
use crate::state::AppState;

#[tauri::command]
pub fn open_dir(path: &str) -> CommandResult<()> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(CommandError::validation("Directory path cannot be empty."));
    }

    do_open_dir(trimmed).map_err(|err| {
        CommandError::storage(format!("Failed to open directory '{}': {}", trimmed, err))
    })
}

/// Saves one result image into the output library.
#[tauri::command]
pub async fn save_result_image(
    state: State<'_, AppState>,
    image: ImageData,
) -> CommandResult<StoredImage> {
    let bytes = image
        .decode()
        .map_err(|err| CommandError::validation(format!("Failed to decode image: {err:#}")))?;
    if bytes.is_empty() {
        return Err(CommandError::validation("Image is empty."));
    }

    let output_dir = ensure_output_dir(&state.data_dir).await?;
    let path = write_asset(&output_dir, IMAGE_FILE_PREFIX, &bytes, &image.mime_type).await?;
    Ok(build_stored_image(&path, bytes.len() as u64, Some(image.mime_type)).await?)
}

#[tauri::command]
pub async fn list_output_images(state: State<'_, AppState>) -> CommandResult<Vec<StoredImage>> {
    let output_dir = ensure_output_dir(&state.data_dir).await?;
    Ok(collect_directory_images(&output_dir).await?)
}

#[tauri::command]
pub async fn delete_output_images(
    state: State<'_, AppState>,
    ids: Vec<String>,
) -> CommandResult<()> {
    let output_dir = ensure_output_dir(&state.data_dir).await?;
    Ok(delete_from_directory(ids, &output_dir).await?)
}

#[tauri::command]
pub async fn get_output_dir_path(state: State<'_, AppState>) -> CommandResult<String> {
    let dir = ensure_output_dir(&state.data_dir).await?;
    dir.to_str()
        .map(|value| value.to_string())
        .ok_or_else(|| CommandError::storage("Output directory path is not valid UTF-8."))
}

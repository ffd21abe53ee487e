use genapi::{CharacterPreset, PresetUpdate};
use tauri::State;
use tracing::info;

use crate::error::{CommandError, CommandResult};
use crate::models::NewPresetPayload;
use crate::state::AppState;

#[tauri::command]
pub fn list_presets(state: State<'_, AppState>) -> Vec<CharacterPreset> {
    state.preferences.lock().presets().to_vec()
}

#[tauri::command]
pub fn get_preset(state: State<'_, AppState>, id: String) -> CommandResult<CharacterPreset> {
    state
        .preferences
        .lock()
        .preset(&id)
        .cloned()
        .ok_or_else(|| CommandError::validation(format!("Preset '{id}' was not found.")))
}

#[tauri::command]
pub fn add_preset(
    state: State<'_, AppState>,
    payload: NewPresetPayload,
) -> CommandResult<CharacterPreset> {
    let NewPresetPayload {
        name,
        images,
        prompt,
    } = payload;

    let preset = state.preferences.lock().add_preset(&name, images, &prompt)?;
    info!(id = %preset.id, images = preset.images.len(), "preset saved");
    Ok(preset)
}

#[tauri::command]
pub fn update_preset(
    state: State<'_, AppState>,
    id: String,
    update: PresetUpdate,
) -> CommandResult<CharacterPreset> {
    Ok(state.preferences.lock().update_preset(&id, update)?)
}

#[tauri::command]
pub fn remove_preset(state: State<'_, AppState>, id: String) -> CommandResult<bool> {
    Ok(state.preferences.lock().remove_preset(&id)?)
}

use genapi::OutputQuality;
use tauri::State;
use tracing::info;

use crate::error::CommandResult;
use crate::models::ApiKeyStatus;
use crate::state::AppState;

#[tauri::command]
pub fn get_output_quality(state: State<'_, AppState>) -> OutputQuality {
    state.preferences.lock().quality()
}

#[tauri::command]
pub fn set_output_quality(state: State<'_, AppState>, quality: OutputQuality) -> CommandResult<()> {
    state.preferences.lock().set_quality(quality)?;
    info!(quality = quality.as_str(), "output quality updated");
    Ok(())
}

#[tauri::command]
pub fn get_api_key_status(state: State<'_, AppState>) -> ApiKeyStatus {
    let source = state.resolve_api_key().map(|(_, source)| source);
    ApiKeyStatus {
        configured: source.is_some(),
        source,
    }
}

/// Stores the user's own key; it takes precedence over `GEMINI_API_KEY`.
#[tauri::command]
pub fn save_api_key(state: State<'_, AppState>, key: String) -> CommandResult<ApiKeyStatus> {
    state.preferences.lock().set_api_key(&key)?;
    info!("user API key saved");
    Ok(get_api_key_status(state))
}

#[tauri::command]
pub fn clear_api_key(state: State<'_, AppState>) -> CommandResult<ApiKeyStatus> {
    state.preferences.lock().clear_api_key()?;
    info!("user API key cleared");
    Ok(get_api_key_status(state))
}

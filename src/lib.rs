mod commands;
mod constants;
mod error;
mod fs_utils;
mod logging;
mod models;
mod state;

use genapi::StudioConfig;
use tauri::Manager;
use tracing::info;

pub use commands::library::{
    delete_output_images, get_output_dir_path, list_output_images, open_dir, save_result_image,
};
pub use commands::operations::{
    cooldown_status, list_predefined_prompts, load_image, run_operation,
};
pub use commands::presets::{add_preset, get_preset, list_presets, remove_preset, update_preset};
pub use commands::settings::{
    clear_api_key, get_api_key_status, get_output_quality, save_api_key, set_output_quality,
};

pub use constants::{IMAGE_FILE_PREFIX, OUTPUT_DIR_NAME, PREFERENCES_FILE, VIDEO_FILE_PREFIX};
pub use error::{CommandError, CommandResult};
pub use models::{
    ApiKeySource, ApiKeyStatus, CooldownStatus, NewPresetPayload, OperationResultPayload,
    StoredImage, VideoAsset,
};
pub use state::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // A missing .env file is fine; the environment may already carry the settings.
    let _ = dotenvy::dotenv();
    let config = StudioConfig::from_env();
    logging::init_logging(&config.log_level);

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            let data_dir = app.path().app_data_dir()?;
            info!(data_dir = %data_dir.display(), "starting image suite");
            app.manage(AppState::new(config, data_dir)?);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            run_operation,
            cooldown_status,
            list_predefined_prompts,
            load_image,
            get_output_quality,
            set_output_quality,
            list_presets,
            get_preset,
            add_preset,
            update_preset,
            remove_preset,
            get_api_key_status,
            save_api_key,
            clear_api_key,
            save_result_image,
            list_output_images,
            delete_output_images,
            get_output_dir_path,
            open_dir
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

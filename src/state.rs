use std::path::PathBuf;

use genapi::{
    CooldownGate, GeminiProvider, GenError, GenResult, JsonFileStore, Preferences, Studio,
    StudioConfig,
};
use parking_lot::Mutex;
use tracing::info;

use crate::constants::PREFERENCES_FILE;
use crate::error::{CommandError, CommandResult};
use crate::models::ApiKeySource;

pub struct AppState {
    pub config: StudioConfig,
    pub provider: GeminiProvider,
    pub preferences: Mutex<Preferences<JsonFileStore>>,
    pub cooldown: Mutex<CooldownGate>,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(config: StudioConfig, data_dir: PathBuf) -> GenResult<Self> {
        let provider = GeminiProvider::new(&config)
            .map_err(|err| GenError::TransportFailure(format!("{err:#}")))?;
        let store = JsonFileStore::open(data_dir.join(PREFERENCES_FILE))?;
        let preferences = Preferences::load(store);
        info!(data_dir = %data_dir.display(), "application state ready");

        Ok(Self {
            cooldown: Mutex::new(CooldownGate::new(config.rate_limit_cooldown)),
            preferences: Mutex::new(preferences),
            provider,
            config,
            data_dir,
        })
    }

    /// The user's saved key wins over the environment key.
    pub fn resolve_api_key(&self) -> Option<(String, ApiKeySource)> {
        if let Some(key) = self.preferences.lock().api_key() {
            return Some((key.to_string(), ApiKeySource::User));
        }
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| (key.to_string(), ApiKeySource::Environment))
    }

    pub fn studio(&self) -> CommandResult<Studio<GeminiProvider>> {
        let (api_key, _) = self.resolve_api_key().ok_or_else(|| {
            CommandError::validation("API key is required. Add your Gemini API key in settings.")
        })?;
        Ok(Studio::new(self.provider.with_api_key(api_key), &self.config))
    }
}

pub mod builder;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod preferences;
pub mod providers;
pub mod studio;
pub mod suggestions;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ModelSet, StudioConfig};
pub use cooldown::CooldownGate;
pub use error::{ErrorKind, GenError, GenResult};
pub use preferences::{
    CharacterPreset, JsonFileStore, KeyValueStore, MemoryStore, Preferences, PresetUpdate,
};
pub use providers::{GeminiProvider, Provider};
pub use studio::Studio;
pub use types::{
    ImageData, OperationKind, OperationRequest, OperationResult, OutputQuality, VideoClip,
};

//! Locally persisted user preferences: output quality, character presets and the
//! user's own API key.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{GenError, GenResult};
use crate::types::{ImageData, OutputQuality};
use crate::utils::current_timestamp_millis;

pub const QUALITY_KEY: &str = "ai-output-quality";
pub const PRESETS_KEY: &str = "ai-character-presets";
pub const API_KEY_KEY: &str = "ai-api-key";

/// Minimal key/value persistence. Every `put` overwrites the whole value.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<Value>;
    fn put(&mut self, key: &str, value: Value) -> GenResult<()>;
    fn remove(&mut self, key: &str) -> GenResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: Value) -> GenResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> GenResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// One JSON object on disk, rewritten in full on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file starts empty; an unreadable one is
    /// reported and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> GenResult<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(values) => values,
                Err(err) => {
                    warn!(path = %path.display(), %err, "ignoring unreadable preferences file");
                    Map::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => {
                return Err(GenError::Storage(format!(
                    "Failed to read {}: {err}",
                    path.display()
                )));
            }
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) -> GenResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                GenError::Storage(format!("Failed to create {}: {err}", parent.display()))
            })?;
        }
        let text = serde_json::to_string_pretty(values)
            .map_err(|err| GenError::Storage(format!("Failed to encode preferences: {err}")))?;
        fs::write(&self.path, text).map_err(|err| {
            GenError::Storage(format!("Failed to write {}: {err}", self.path.display()))
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: Value) -> GenResult<()> {
        let mut next = self.values.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        self.values = next;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> GenResult<()> {
        if !self.values.contains_key(key) {
            return Ok(());
        }
        let mut next = self.values.clone();
        next.remove(key);
        self.persist(&next)?;
        self.values = next;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterPreset {
    pub id: String,
    pub name: String,
    pub images: Vec<ImageData>,
    #[serde(default)]
    pub prompt: String,
}

/// Partial update; `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetUpdate {
    pub name: Option<String>,
    pub images: Option<Vec<ImageData>>,
    pub prompt: Option<String>,
}

pub struct Preferences<S> {
    store: S,
    quality: OutputQuality,
    presets: Vec<CharacterPreset>,
    api_key: Option<String>,
}

impl<S: KeyValueStore> Preferences<S> {
    /// Reads every preference from `store`. Corrupt presets are discarded and removed.
    pub fn load(mut store: S) -> Self {
        let quality = store
            .get(QUALITY_KEY)
            .and_then(|value| value.as_str().and_then(OutputQuality::parse))
            .unwrap_or_default();

        let presets = match store.get(PRESETS_KEY) {
            None => Vec::new(),
            Some(value) => match serde_json::from_value::<Vec<CharacterPreset>>(value) {
                Ok(presets) => presets,
                Err(err) => {
                    warn!(%err, "failed to load character presets, clearing them");
                    if let Err(err) = store.remove(PRESETS_KEY) {
                        warn!(%err, "failed to clear corrupted presets");
                    }
                    Vec::new()
                }
            },
        };

        let api_key = store
            .get(API_KEY_KEY)
            .and_then(|value| value.as_str().map(str::trim).map(str::to_string))
            .filter(|key| !key.is_empty());

        debug!(
            quality = quality.as_str(),
            presets = presets.len(),
            has_api_key = api_key.is_some(),
            "preferences loaded"
        );

        Self {
            store,
            quality,
            presets,
            api_key,
        }
    }

    pub fn quality(&self) -> OutputQuality {
        self.quality
    }

    pub fn set_quality(&mut self, quality: OutputQuality) -> GenResult<()> {
        self.store
            .put(QUALITY_KEY, Value::String(quality.as_str().to_string()))?;
        self.quality = quality;
        Ok(())
    }

    pub fn presets(&self) -> &[CharacterPreset] {
        &self.presets
    }

    pub fn preset(&self, id: &str) -> Option<&CharacterPreset> {
        self.presets.iter().find(|preset| preset.id == id)
    }

    pub fn add_preset(
        &mut self,
        name: &str,
        images: Vec<ImageData>,
        prompt: &str,
    ) -> GenResult<CharacterPreset> {
        let name = validate_name(name)?;
        validate_images(&images)?;

        let preset = CharacterPreset {
            id: self.next_preset_id(),
            name,
            images,
            prompt: prompt.trim().to_string(),
        };

        let mut next = self.presets.clone();
        next.push(preset.clone());
        self.save_presets(next)?;
        Ok(preset)
    }

    pub fn update_preset(&mut self, id: &str, update: PresetUpdate) -> GenResult<CharacterPreset> {
        let Some(index) = self.presets.iter().position(|preset| preset.id == id) else {
            return Err(GenError::validation(format!("Preset '{id}' was not found.")));
        };

        let mut preset = self.presets[index].clone();
        if let Some(name) = update.name {
            preset.name = validate_name(&name)?;
        }
        if let Some(images) = update.images {
            validate_images(&images)?;
            preset.images = images;
        }
        if let Some(prompt) = update.prompt {
            preset.prompt = prompt.trim().to_string();
        }

        let mut next = self.presets.clone();
        next[index] = preset.clone();
        self.save_presets(next)?;
        Ok(preset)
    }

    /// Returns whether a preset was removed. The order of the rest is unchanged.
    pub fn remove_preset(&mut self, id: &str) -> GenResult<bool> {
        let next: Vec<CharacterPreset> = self
            .presets
            .iter()
            .filter(|preset| preset.id != id)
            .cloned()
            .collect();
        if next.len() == self.presets.len() {
            return Ok(false);
        }
        self.save_presets(next)?;
        Ok(true)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, key: &str) -> GenResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(GenError::validation("API key cannot be empty."));
        }
        self.store.put(API_KEY_KEY, Value::String(key.to_string()))?;
        self.api_key = Some(key.to_string());
        Ok(())
    }

    pub fn clear_api_key(&mut self) -> GenResult<()> {
        self.store.remove(API_KEY_KEY)?;
        self.api_key = None;
        Ok(())
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn save_presets(&mut self, presets: Vec<CharacterPreset>) -> GenResult<()> {
        let value = serde_json::to_value(&presets)
            .map_err(|err| GenError::Storage(format!("Failed to encode presets: {err}")))?;
        self.store.put(PRESETS_KEY, value)?;
        self.presets = presets;
        Ok(())
    }

    fn next_preset_id(&self) -> String {
        let mut stamp = current_timestamp_millis();
        loop {
            let id = format!("preset_{stamp}");
            if self.preset(&id).is_none() {
                return id;
            }
            stamp += 1;
        }
    }
}

fn validate_name(name: &str) -> GenResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GenError::validation("Preset name cannot be empty."));
    }
    Ok(name.to_string())
}

fn validate_images(images: &[ImageData]) -> GenResult<()> {
    if images.is_empty() {
        return Err(GenError::validation(
            "A preset needs at least one character image.",
        ));
    }
    for (index, image) in images.iter().enumerate() {
        image.validate(&format!("Preset image {}", index + 1))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const PNG: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn png() -> ImageData {
        ImageData::from_bytes(&PNG, "image/png")
    }

    #[test]
    fn presets_survive_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");

        let mut prefs = Preferences::load(JsonFileStore::open(&path).unwrap());
        let first = prefs.add_preset("Linh", vec![png()], "street style").unwrap();
        let second = prefs.add_preset("Minh", vec![png(), png()], "").unwrap();
        assert_ne!(first.id, second.id);
        assert!(first.id.starts_with("preset_"));
        let saved = prefs.presets().to_vec();

        let reloaded = Preferences::load(JsonFileStore::open(&path).unwrap());
        assert_eq!(reloaded.presets(), saved.as_slice());
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut prefs = Preferences::load(MemoryStore::new());
        let a = prefs.add_preset("A", vec![png()], "").unwrap();
        let b = prefs.add_preset("B", vec![png()], "").unwrap();
        let c = prefs.add_preset("C", vec![png()], "").unwrap();

        assert!(prefs.remove_preset(&b.id).unwrap());
        assert!(!prefs.remove_preset("preset_missing").unwrap());

        let ids: Vec<&str> = prefs.presets().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), c.id.as_str()]);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let mut prefs = Preferences::load(MemoryStore::new());
        let preset = prefs.add_preset("Old", vec![png()], "keep me").unwrap();

        let updated = prefs
            .update_preset(
                &preset.id,
                PresetUpdate {
                    name: Some(" New ".into()),
                    ..PresetUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "New");
        assert_eq!(updated.prompt, "keep me");
        assert_eq!(prefs.preset(&preset.id), Some(&updated));
        assert!(prefs.update_preset("nope", PresetUpdate::default()).is_err());
    }

    #[test]
    fn add_rejects_blank_name_and_missing_images() {
        let mut prefs = Preferences::load(MemoryStore::new());
        assert!(prefs.add_preset("  ", vec![png()], "").is_err());
        assert!(prefs.add_preset("Name", vec![], "").is_err());
        assert!(
            prefs
                .add_preset("Name", vec![ImageData::from_bytes(&PNG, "")], "")
                .is_err()
        );
        assert!(prefs.presets().is_empty());
    }

    #[test]
    fn corrupt_presets_are_cleared() {
        let mut store = MemoryStore::new();
        store.put(PRESETS_KEY, json!({"not": "a list"})).unwrap();

        let prefs = Preferences::load(store);
        assert!(prefs.presets().is_empty());
        assert_eq!(prefs.into_store().get(PRESETS_KEY), None);
    }

    #[test]
    fn quality_defaults_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut prefs = Preferences::load(JsonFileStore::open(&path).unwrap());
        assert_eq!(prefs.quality(), OutputQuality::Standard);
        prefs.set_quality(OutputQuality::High).unwrap();

        let reloaded = Preferences::load(JsonFileStore::open(&path).unwrap());
        assert_eq!(reloaded.quality(), OutputQuality::High);

        let mut store = MemoryStore::new();
        store.put(QUALITY_KEY, json!("ultra")).unwrap();
        assert_eq!(Preferences::load(store).quality(), OutputQuality::Standard);
    }

    #[test]
    fn api_key_round_trip() {
        let mut prefs = Preferences::load(MemoryStore::new());
        assert_eq!(prefs.api_key(), None);
        assert!(prefs.set_api_key("   ").is_err());

        prefs.set_api_key(" key-123 ").unwrap();
        assert_eq!(prefs.api_key(), Some("key-123"));

        prefs.clear_api_key().unwrap();
        assert_eq!(prefs.api_key(), None);
    }

    #[test]
    fn unreadable_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get(QUALITY_KEY), None);
        assert_eq!(store.path(), path.as_path());
    }
}

use std::env;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_GENERATION_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_IMAGE_EDIT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

pub const DEFAULT_VARIATION_DELAY_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_MAX_POLLS: u32 = 30;
pub const DEFAULT_RATE_LIMIT_COOLDOWN_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Model identifiers per call shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSet {
    pub image_generation: String,
    pub image_edit: String,
    pub text: String,
    pub video: String,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            image_generation: DEFAULT_IMAGE_GENERATION_MODEL.to_string(),
            image_edit: DEFAULT_IMAGE_EDIT_MODEL.to_string(),
            text: DEFAULT_TEXT_MODEL.to_string(),
            video: DEFAULT_VIDEO_MODEL.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StudioConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub models: ModelSet,
    /// Pause between consecutive variation calls, keeps batches under the provider's rate limit.
    pub variation_delay: Duration,
    pub poll_interval: Duration,
    pub max_polls: u32,
    pub rate_limit_cooldown: Duration,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            models: ModelSet::default(),
            variation_delay: Duration::from_secs(DEFAULT_VARIATION_DELAY_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_polls: DEFAULT_MAX_POLLS,
            rate_limit_cooldown: Duration::from_secs(DEFAULT_RATE_LIMIT_COOLDOWN_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_level: "info".to_string(),
        }
    }
}

impl StudioConfig {
    /// Defaults overlaid with process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let models = ModelSet {
            image_generation: get("GEMINI_IMAGE_MODEL")
                .unwrap_or(defaults.models.image_generation),
            image_edit: get("GEMINI_EDIT_MODEL").unwrap_or(defaults.models.image_edit),
            text: get("GEMINI_TEXT_MODEL").unwrap_or(defaults.models.text),
            video: get("GEMINI_VIDEO_MODEL").unwrap_or(defaults.models.video),
        };

        Self {
            api_key: get("GEMINI_API_KEY"),
            base_url: get("GEMINI_BASE_URL")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            models,
            variation_delay: parse_secs(
                get("VARIATION_DELAY_SECS"),
                "VARIATION_DELAY_SECS",
                defaults.variation_delay,
            ),
            poll_interval: parse_secs(
                get("VIDEO_POLL_INTERVAL_SECS"),
                "VIDEO_POLL_INTERVAL_SECS",
                defaults.poll_interval,
            ),
            max_polls: parse_number(get("VIDEO_MAX_POLLS"), "VIDEO_MAX_POLLS", defaults.max_polls),
            rate_limit_cooldown: parse_secs(
                get("RATE_LIMIT_COOLDOWN_SECS"),
                "RATE_LIMIT_COOLDOWN_SECS",
                defaults.rate_limit_cooldown,
            ),
            request_timeout: parse_secs(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout,
            ),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }
}

fn parse_number<T: std::str::FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => match raw.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, value = %raw, "invalid value, using the default");
                default
            }
        },
    }
}

fn parse_secs(value: Option<String>, key: &str, default: Duration) -> Duration {
    Duration::from_secs(parse_number(value, key, default.as_secs()))
}

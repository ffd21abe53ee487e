pub const OUTPUT_DIR_NAME: &str = "output";
pub const PREFERENCES_FILE: &str = "preferences.json";
pub const IMAGE_FILE_PREFIX: &str = "image";
pub const VIDEO_FILE_PREFIX: &str = "video";

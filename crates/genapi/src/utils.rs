use anyhow::{Context, Result};
use base64::Engine as _;
use std::fs;
use std::path::Path;

pub fn detect_mime_type<P: AsRef<Path>>(path: P) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("image/jpeg")
        .to_string()
}

/// Sniffs the MIME type from the leading bytes, if the format is recognised.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

pub fn normalize_mime_type(mime_type: &str) -> String {
    let mime = mime_type.trim().to_lowercase();
    match mime.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => mime,
    }
}

pub fn read_file_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read image file: {}", path.display()))
}

pub fn encode_byte_to_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .context("Base64 decoding failed")
}

pub fn current_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

pub fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

/// Returns the body of a fenced code block (```` ```json ... ``` ````) or the trimmed
/// text when no fence is present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // skip the info string (e.g. "json") up to the first newline
    let body = match rest.find('\n') {
        Some(index) => &rest[index + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

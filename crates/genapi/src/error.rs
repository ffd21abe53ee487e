use serde::Serialize;
use thiserror::Error;

/// Stable category of a [`GenError`], forwarded to the UI so it can pick a message
/// and decide on cooldown or credential prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    QuotaExhausted,
    RateLimited,
    GenerationFailed,
    TransportFailure,
    Timeout,
    InvalidResponseFormat,
    Storage,
    CoolingDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// Missing or malformed input, raised before any provider call.
    #[error("{0}")]
    Validation(String),

    /// Account-level quota is gone; the user has to supply another key.
    #[error("API quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Transient throttle; the caller should cool down before the next submission.
    #[error("Rate limited by the provider: {0}")]
    RateLimited(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Request to the provider failed: {0}")]
    TransportFailure(String),

    #[error("Video generation timed out after {polls} status checks ({elapsed_secs}s)")]
    Timeout { polls: u32, elapsed_secs: u64 },

    #[error("Invalid suggestion format: {0}")]
    InvalidResponseFormat(String),

    #[error("Preferences storage error: {0}")]
    Storage(String),

    #[error("Please wait {remaining_secs}s before submitting another request")]
    CoolingDown { remaining_secs: u64 },
}

impl GenError {
    pub fn validation(message: impl Into<String>) -> Self {
        GenError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GenError::Validation(_) => ErrorKind::Validation,
            GenError::QuotaExhausted(_) => ErrorKind::QuotaExhausted,
            GenError::RateLimited(_) => ErrorKind::RateLimited,
            GenError::GenerationFailed(_) => ErrorKind::GenerationFailed,
            GenError::TransportFailure(_) => ErrorKind::TransportFailure,
            GenError::Timeout { .. } => ErrorKind::Timeout,
            GenError::InvalidResponseFormat(_) => ErrorKind::InvalidResponseFormat,
            GenError::Storage(_) => ErrorKind::Storage,
            GenError::CoolingDown { .. } => ErrorKind::CoolingDown,
        }
    }
}

pub type GenResult<T> = std::result::Result<T, GenError>;

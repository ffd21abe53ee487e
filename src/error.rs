use genapi::{ErrorKind, GenError};
use serde::Serialize;

/// Error shape returned by every command: a stable kind the UI switches on, plus text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
    pub kind: ErrorKind,
    pub message: String,
}

pub type CommandResult<T> = Result<T, CommandError>;

impl CommandError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Storage,
            message: message.into(),
        }
    }
}

impl From<GenError> for CommandError {
    fn from(err: GenError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

// File-system helpers report plain strings.
impl From<String> for CommandError {
    fn from(message: String) -> Self {
        Self::storage(message)
    }
}

//! Maps raw provider failures onto the user-facing error taxonomy.
//!
//! Structured fields are trusted first. Matching on the human-readable message is a
//! fallback only: provider wording changes and may be localized, so those phrase
//! lists are known to be fragile.

use std::fmt;

use crate::error::GenError;

/// Status string the provider uses for exhausted account resources.
pub const RESOURCE_EXHAUSTED_STATUS: &str = "RESOURCE_EXHAUSTED";

const QUOTA_PHRASES: &[&str] = &[
    "resource has been exhausted",
    "resource_exhausted",
    "quota",
    "billing",
];

const TRANSIENT_PHRASES: &[&str] = &[
    "rate limit",
    "rate-limit",
    "too many requests",
    "try again later",
    "overloaded",
];

const NO_OUTPUT_MESSAGE: &str =
    "The AI couldn't generate a valid image for this request. Try adjusting the prompt or images.";

/// A failed provider interaction before classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderFailure {
    /// The provider answered with an error payload.
    Api {
        http_status: Option<u16>,
        status: Option<String>,
        message: String,
    },
    /// The call succeeded but carried no usable output.
    NoOutput { explanation: Option<String> },
    /// Network, HTTP or decoding failure.
    Transport { message: String },
}

impl ProviderFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        ProviderFailure::Transport {
            message: message.into(),
        }
    }

    pub fn no_output(explanation: Option<String>) -> Self {
        ProviderFailure::NoOutput { explanation }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFailure::Api {
                http_status,
                status,
                message,
            } => {
                write!(f, "provider error")?;
                if let Some(code) = http_status {
                    write!(f, " {code}")?;
                }
                if let Some(status) = status {
                    write!(f, " {status}")?;
                }
                write!(f, ": {message}")
            }
            ProviderFailure::NoOutput { explanation } => match explanation {
                Some(text) => write!(f, "no output: {text}"),
                None => write!(f, "no output"),
            },
            ProviderFailure::Transport { message } => write!(f, "transport: {message}"),
        }
    }
}

pub fn classify(failure: ProviderFailure) -> GenError {
    match failure {
        ProviderFailure::NoOutput { explanation } => GenError::GenerationFailed(
            explanation
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| NO_OUTPUT_MESSAGE.to_string()),
        ),
        ProviderFailure::Api {
            http_status,
            status,
            message,
        } => classify_api(http_status, status.as_deref(), message),
        ProviderFailure::Transport { message } => {
            classify_message(&message).unwrap_or(GenError::TransportFailure(message))
        }
    }
}

fn classify_api(http_status: Option<u16>, status: Option<&str>, message: String) -> GenError {
    if let Some(status) = status.map(str::trim).filter(|value| !value.is_empty()) {
        if status.eq_ignore_ascii_case(RESOURCE_EXHAUSTED_STATUS) {
            return GenError::QuotaExhausted(message);
        }
    } else if http_status == Some(429) {
        return GenError::RateLimited(message);
    }

    if let Some(classified) = classify_message(&message) {
        return classified;
    }

    let detail = match http_status {
        Some(code) => format!("HTTP {code}: {message}"),
        None => message,
    };
    GenError::TransportFailure(detail)
}

fn classify_message(message: &str) -> Option<GenError> {
    let lowered = message.to_lowercase();
    if QUOTA_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return Some(GenError::QuotaExhausted(message.to_string()));
    }
    if TRANSIENT_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return Some(GenError::RateLimited(message.to_string()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn api(http_status: Option<u16>, status: Option<&str>, message: &str) -> ProviderFailure {
        ProviderFailure::Api {
            http_status,
            status: status.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn resource_exhausted_status_is_quota() {
        let err = classify(api(Some(429), Some("RESOURCE_EXHAUSTED"), "Try again later"));
        assert_eq!(err, GenError::QuotaExhausted("Try again later".into()));
    }

    #[test]
    fn bare_429_is_rate_limited() {
        let err = classify(api(Some(429), None, "slow down"));
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn transient_phrase_is_rate_limited() {
        let err = classify(api(
            Some(503),
            Some("UNAVAILABLE"),
            "The model is overloaded. Please try again later.",
        ));
        assert_eq!(
            err,
            GenError::RateLimited("The model is overloaded. Please try again later.".into())
        );
    }

    #[test]
    fn quota_phrase_without_status_is_quota() {
        let err = classify(api(None, None, "You exceeded your current quota"));
        assert_eq!(err.kind(), ErrorKind::QuotaExhausted);
    }

    #[test]
    fn transport_message_can_still_be_rate_limited() {
        let err = classify(ProviderFailure::transport("429 Too Many Requests"));
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn other_errors_are_transport_failures() {
        let err = classify(api(Some(400), Some("INVALID_ARGUMENT"), "bad image"));
        assert_eq!(err, GenError::TransportFailure("HTTP 400: bad image".into()));

        let err = classify(ProviderFailure::transport("connection reset"));
        assert_eq!(err, GenError::TransportFailure("connection reset".into()));
    }

    #[test]
    fn no_output_keeps_provider_explanation() {
        let err = classify(ProviderFailure::no_output(Some(
            "I can't help with that image.".into(),
        )));
        assert_eq!(
            err,
            GenError::GenerationFailed("I can't help with that image.".into())
        );

        let err = classify(ProviderFailure::no_output(None));
        assert_eq!(err, GenError::GenerationFailed(NO_OUTPUT_MESSAGE.into()));
    }
}

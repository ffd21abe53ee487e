use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{GenError, GenResult};
use crate::utils::{strip_code_fence, truncate_for_log};

#[derive(Debug, Deserialize)]
struct SuggestionPayload {
    suggestions: Vec<String>,
}

/// Response schema sent with structured suggestion calls.
pub fn suggestion_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "suggestions": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": ["suggestions"]
    })
}

/// Parses the provider's JSON text, tolerating a surrounding fenced code block.
pub fn parse_suggestions(text: &str) -> GenResult<Vec<String>> {
    let body = strip_code_fence(text);
    let payload: SuggestionPayload = serde_json::from_str(body).map_err(|err| {
        GenError::InvalidResponseFormat(format!(
            "{err} (response: {})",
            truncate_for_log(body, 200)
        ))
    })?;

    Ok(payload
        .suggestions
        .into_iter()
        .map(|suggestion| suggestion.trim().to_string())
        .filter(|suggestion| !suggestion.is_empty())
        .collect())
}

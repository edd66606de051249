//! Classification of non-success HTTP responses.

use crate::error::CogniError;

/// Build an `ApiError` from a failed response.
///
/// The message is taken from the body's `detail`, `error` or `message`
/// field when the body is JSON, otherwise from the raw text, otherwise from
/// the canonical reason phrase.
pub fn classify_http_error(status: u16, body: &str, fallback: Option<&str>) -> CogniError {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| extract_message(&v));

    let message = from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .or_else(|| fallback.map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());

    CogniError::api_error(status, message)
}

fn extract_message(value: &serde_json::Value) -> Option<String> {
    ["detail", "error", "message"].iter().find_map(|key| {
        let field = value.get(*key)?;
        match field {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => extract_message(field),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    })
}

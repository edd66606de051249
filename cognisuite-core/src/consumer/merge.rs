//! Payload merge rules.

use serde_json::Value;

/// Folds `Data` payloads into a feature's accumulated state.
///
/// `Clone` is required so the view model can snapshot the state at the start
/// of a round and restore it on cancel.
pub trait PayloadMerger: Clone + Send {
    /// Apply one payload. Payloads arrive strictly in stream order.
    fn merge(&mut self, payload: &Value);

    /// Roll back to the state captured when the round began.
    ///
    /// Override to keep state that must outlive a cancelled round.
    fn restore(&mut self, baseline: Self) {
        *self = baseline;
    }

    /// Called once when the round ends in `Error`, with the user-visible message.
    fn on_failure(&mut self, _message: &str) {}

    /// Message shown for an `[ERROR]` sentinel.
    fn server_error_message(&self) -> &'static str {
        "The server reported an error."
    }

    /// Message shown when the stream cannot be opened or drops.
    fn connect_error_message(&self) -> &'static str {
        "Failed to connect to the service."
    }
}

/// Look `key` up under `payload.output`, falling back to the top level only
/// when the nested value is absent (or `null`).
pub fn nested_or_top<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    let present = |v: &&Value| !v.is_null();
    payload
        .get("output")
        .and_then(|output| output.get(key))
        .filter(present)
        .or_else(|| payload.get(key).filter(present))
}

/// The payload's `error` field, if it carries a non-empty one.
pub fn payload_error(payload: &Value) -> Option<String> {
    match payload.get("error")? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

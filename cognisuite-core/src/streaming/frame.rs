//! Frame decoder
//!
//! Classifies one SSE `data` payload. The backend ends every stream with a
//! literal `[DONE]` or `[ERROR]` frame; everything else is expected to be a
//! JSON object.

use crate::defaults::protocol::{DATA_PREFIX, DONE_SENTINEL, ERROR_SENTINEL};

/// Result of decoding a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    /// `[DONE]`: the stream finished normally.
    Complete,
    /// `[ERROR]`: the server gave up.
    Error,
    /// Nothing to apply. Blank frames and malformed JSON both land here.
    Empty,
    Data(serde_json::Value),
}

impl DecodedEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// Decoder for the sentinel protocol shared by all streaming endpoints.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    label: String,
}

impl FrameDecoder {
    /// `label` only shows up in diagnostics (e.g. "doc-intel ask").
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Decode one frame. Never fails: a frame that is neither a sentinel nor
    /// valid JSON is logged and reported as `Empty` so the stream stays open.
    pub fn decode(&self, raw: &str) -> DecodedEvent {
        let frame = strip_data_prefix(raw);

        // Whole-frame comparison; `[DONE]` inside a JSON string is data.
        if frame == DONE_SENTINEL {
            return DecodedEvent::Complete;
        }
        if frame == ERROR_SENTINEL {
            return DecodedEvent::Error;
        }
        if frame.is_empty() {
            return DecodedEvent::Empty;
        }

        match serde_json::from_str::<serde_json::Value>(frame) {
            Ok(value) => DecodedEvent::Data(value),
            Err(e) => {
                tracing::warn!(
                    target: "cognisuite::stream",
                    label = %self.label,
                    frame = %frame,
                    error = %e,
                    "malformed frame skipped"
                );
                DecodedEvent::Empty
            }
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new("stream")
    }
}

fn strip_data_prefix(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix(DATA_PREFIX)
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn decode(raw: &str) -> DecodedEvent {
        FrameDecoder::default().decode(raw)
    }

    #[test]
    fn sentinels_are_recognised_with_whitespace_and_prefix() {
        for raw in ["[DONE]", "  [DONE]\n", "data: [DONE]", " data: [DONE] \r\n"] {
            assert_eq!(decode(raw), DecodedEvent::Complete, "frame {raw:?}");
        }
        for raw in ["[ERROR]", "\t[ERROR] ", "data: [ERROR]"] {
            assert_eq!(decode(raw), DecodedEvent::Error, "frame {raw:?}");
        }
    }

    #[test]
    fn sentinel_text_inside_json_is_data() {
        let event = decode(r#"{"answer":"[DONE]"}"#);
        assert_eq!(event, DecodedEvent::Data(json!({"answer": "[DONE]"})));

        let event = decode(r#"["[ERROR]"]"#);
        assert_eq!(event, DecodedEvent::Data(json!(["[ERROR]"])));
    }

    #[test]
    fn blank_frames_are_empty() {
        assert_eq!(decode(""), DecodedEvent::Empty);
        assert_eq!(decode("   \n"), DecodedEvent::Empty);
        assert_eq!(decode("data: "), DecodedEvent::Empty);
    }

    #[test]
    fn json_frames_are_data() {
        assert_eq!(
            decode(r#"data: {"delta":"He"}"#),
            DecodedEvent::Data(json!({"delta": "He"}))
        );
        assert_eq!(decode("42"), DecodedEvent::Data(json!(42)));
    }

    #[test]
    #[traced_test]
    fn malformed_frames_are_logged_and_skipped() {
        let decoder = FrameDecoder::new("vector svg");
        assert_eq!(decoder.decode("{not-json"), DecodedEvent::Empty);
        assert_eq!(decoder.decode("[DONE"), DecodedEvent::Empty);
        assert!(logs_contain("malformed frame skipped"));
    }

    #[test]
    fn terminal_events() {
        assert!(DecodedEvent::Complete.is_terminal());
        assert!(DecodedEvent::Error.is_terminal());
        assert!(!DecodedEvent::Empty.is_terminal());
        assert!(!DecodedEvent::Data(json!({})).is_terminal());
    }
}

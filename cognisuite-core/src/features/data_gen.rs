//! Structured data generator.
//!
//! The backend streams `{"output": {"generated_json": "<json text>"}}`; the
//! inner string is itself JSON and is re-rendered with two-space indents.

use std::sync::Arc;

use serde_json::Value;

use crate::consumer::{PayloadMerger, Status, StreamingConsumer, nested_or_top};
use crate::error::CogniError;
use crate::execution::{StreamRequest, Transport};
use crate::streaming::StreamHandle;

pub const GENERATE_PATH: &str = "/api/generate-data";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedData {
    pub value: Option<Value>,
    pub pretty: String,
}

impl GeneratedData {
    fn set(&mut self, value: Value) {
        match serde_json::to_string_pretty(&value) {
            Ok(pretty) => {
                self.pretty = pretty;
                self.value = Some(value);
            }
            Err(e) => {
                tracing::warn!(target: "cognisuite::consumer", err=%e, "cannot render generated data");
            }
        }
    }
}

impl PayloadMerger for GeneratedData {
    fn merge(&mut self, payload: &Value) {
        match nested_or_top(payload, "generated_json") {
            Some(Value::String(text)) if !text.trim().is_empty() => {
                match serde_json::from_str::<Value>(text) {
                    Ok(inner) => self.set(inner),
                    Err(e) => {
                        tracing::warn!(target: "cognisuite::consumer", err=%e, "generated_json is not valid JSON, skipped");
                    }
                }
            }
            Some(inner) if inner.is_object() || inner.is_array() => self.set(inner.clone()),
            _ => {}
        }
    }

    fn on_failure(&mut self, message: &str) {
        self.value = None;
        self.pretty = message.to_string();
    }

    fn server_error_message(&self) -> &'static str {
        "An error occurred on the server."
    }

    fn connect_error_message(&self) -> &'static str {
        "Failed to connect to the stream."
    }
}

pub struct DataGenerator {
    consumer: StreamingConsumer<GeneratedData>,
}

impl DataGenerator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            consumer: StreamingConsumer::new(transport, "data-gen", GeneratedData::default()),
        }
    }

    pub async fn start_generate(
        &mut self,
        prompt: &str,
        count: u32,
    ) -> Result<StreamHandle, CogniError> {
        if prompt.trim().is_empty() {
            return Err(CogniError::invalid_input("prompt must not be empty"));
        }
        if count < 1 {
            return Err(CogniError::invalid_input("count must be at least 1"));
        }

        let request = StreamRequest::new(GENERATE_PATH)
            .param("prompt", prompt)
            .param("count", count);
        self.consumer
            .start(request, |state| *state = GeneratedData::default())
            .await
    }

    pub async fn generate(&mut self, prompt: &str, count: u32) -> Result<Status, CogniError> {
        self.start_generate(prompt, count).await?;
        Ok(self.consumer.drive().await)
    }

    pub fn data(&self) -> &GeneratedData {
        self.consumer.state()
    }

    pub fn status(&self) -> Status {
        self.consumer.status()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.consumer.view().error_message()
    }

    pub fn cancel(&mut self) -> bool {
        self.consumer.cancel()
    }

    pub fn consumer_mut(&mut self) -> &mut StreamingConsumer<GeneratedData> {
        &mut self.consumer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn inner_json_is_parsed_and_pretty_printed() {
        let mut state = GeneratedData::default();
        state.merge(&json!({"output": {"generated_json": "[{\"name\":\"Ada\"}]"}}));
        assert_eq!(state.value, Some(json!([{"name": "Ada"}])));
        assert_eq!(state.pretty, "[\n  {\n    \"name\": \"Ada\"\n  }\n]");
    }

    #[test]
    fn top_level_generated_json_is_a_fallback() {
        let mut state = GeneratedData::default();
        state.merge(&json!({"generated_json": "{\"a\":1}", "output": {}}));
        assert_eq!(state.value, Some(json!({"a": 1})));
    }

    #[traced_test]
    #[test]
    fn unparseable_inner_json_keeps_previous_value() {
        let mut state = GeneratedData::default();
        state.merge(&json!({"output": {"generated_json": "[1,2]"}}));
        state.merge(&json!({"output": {"generated_json": "[1,2,"}}));
        assert_eq!(state.value, Some(json!([1, 2])));
        assert!(logs_contain("generated_json is not valid JSON"));
    }

    #[tokio::test]
    async fn generate_validates_input() {
        let transport = Arc::new(ScriptedTransport::default());
        let mut generator = DataGenerator::new(transport.clone());

        assert!(matches!(
            generator.generate("  ", 3).await.unwrap_err(),
            CogniError::InvalidInput(_)
        ));
        assert!(matches!(
            generator.generate("people", 0).await.unwrap_err(),
            CogniError::InvalidInput(_)
        ));
        assert!(transport.last_request().is_none());
    }

    #[tokio::test]
    async fn generate_streams_to_done() {
        let transport = Arc::new(ScriptedTransport::default().with_stream(&[
            r#"{"step":"draft","output":{"generated_json":"[{\"id\":1}]"}}"#,
            r#"{"step":"final","output":{"generated_json":"[{\"id\":1},{\"id\":2}]"}}"#,
            "[DONE]",
        ]));
        let mut generator = DataGenerator::new(transport.clone());

        let status = generator.generate("ids", 2).await.unwrap();
        assert_eq!(status, Status::Done);
        assert_eq!(generator.data().value, Some(json!([{"id": 1}, {"id": 2}])));

        let request = transport.last_request().unwrap();
        assert_eq!(request.url("http://h"), "http://h/api/generate-data?prompt=ids&count=2");
    }

    #[tokio::test]
    async fn connect_failure_shows_message_in_output() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .with_stream_error(CogniError::ConnectionError("refused".into())),
        );
        let mut generator = DataGenerator::new(transport);

        let err = generator.generate("ids", 1).await.unwrap_err();
        assert!(matches!(err, CogniError::ConnectionError(_)));
        assert_eq!(generator.status(), Status::Error);
        assert_eq!(generator.data().pretty, "Failed to connect to the stream.");
    }
}

//! Binds a view model to a transport.

use std::sync::Arc;

use super::merge::PayloadMerger;
use super::status::Status;
use super::view_model::{Flow, ViewModel};
use crate::error::CogniError;
use crate::execution::{StreamRequest, Transport};
use crate::streaming::StreamHandle;

/// Generic streaming consumer: one per feature session.
pub struct StreamingConsumer<M> {
    transport: Arc<dyn Transport>,
    view: ViewModel<M>,
}

impl<M: PayloadMerger> StreamingConsumer<M> {
    pub fn new(transport: Arc<dyn Transport>, label: impl Into<String>, state: M) -> Self {
        Self {
            transport,
            view: ViewModel::new(label, state),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn view(&self) -> &ViewModel<M> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewModel<M> {
        &mut self.view
    }

    pub fn state(&self) -> &M {
        self.view.state()
    }

    pub fn status(&self) -> Status {
        self.view.status()
    }

    /// Begin a round and open its stream.
    ///
    /// On a transport failure the view model moves to `Error` and the
    /// underlying error is returned.
    pub async fn start(
        &mut self,
        request: StreamRequest,
        prepare: impl FnOnce(&mut M),
    ) -> Result<StreamHandle, CogniError> {
        self.view.begin_submit(prepare);
        let label = self.view.label().to_string();
        match self.transport.open_stream(&label, &request).await {
            Ok(frames) => Ok(self.view.attach(frames)),
            Err(e) => {
                self.view.transport_failed(&e);
                Err(e)
            }
        }
    }

    pub async fn pump(&mut self) -> Option<Flow> {
        self.view.pump().await
    }

    pub async fn drive(&mut self) -> Status {
        self.view.drive().await
    }

    pub async fn drive_with(&mut self, observer: impl FnMut(&ViewModel<M>)) -> Status {
        self.view.drive_with(observer).await
    }

    /// `start` followed by `drive`.
    pub async fn run(
        &mut self,
        request: StreamRequest,
        prepare: impl FnOnce(&mut M),
    ) -> Result<Status, CogniError> {
        self.start(request, prepare).await?;
        Ok(self.drive().await)
    }

    pub fn cancel(&mut self) -> bool {
        self.view.cancel()
    }

    /// Release the open stream, if any. An in-flight round is cancelled so
    /// the view never stays busy without a stream behind it.
    pub fn close(&mut self) {
        self.view.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use serde_json::Value;

    #[derive(Debug, Clone, Default)]
    struct Answer(String);

    impl PayloadMerger for Answer {
        fn merge(&mut self, payload: &Value) {
            if let Some(a) = payload.get("answer").and_then(Value::as_str) {
                self.0 = a.to_string();
            }
        }
    }

    #[tokio::test]
    async fn run_drives_to_done() {
        let transport = Arc::new(ScriptedTransport::default().with_stream(&[
            r#"{"answer":"3"}"#,
            r#"{"answer":"4"}"#,
            "[DONE]",
        ]));
        let mut consumer = StreamingConsumer::new(transport.clone(), "test", Answer::default());

        let status = consumer
            .run(StreamRequest::new("/api/x").param("q", "2+2"), |_| {})
            .await
            .unwrap();
        assert_eq!(status, Status::Done);
        assert_eq!(consumer.state().0, "4");
        assert_eq!(transport.last_request().unwrap().path, "/api/x");
    }

    #[tokio::test]
    async fn open_failure_moves_to_error() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .with_stream_error(CogniError::ConnectionError("refused".into())),
        );
        let mut consumer = StreamingConsumer::new(transport, "test", Answer::default());

        let err = consumer
            .start(StreamRequest::new("/api/x"), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, CogniError::ConnectionError(_)));
        assert_eq!(consumer.status(), Status::Error);
        assert_eq!(
            consumer.view().error_message(),
            Some("Failed to connect to the service.")
        );
        assert!(!consumer.view().has_open_stream());
    }

    #[tokio::test]
    async fn close_mid_stream_returns_to_idle_and_allows_a_new_round() {
        let transport = Arc::new(
            ScriptedTransport::default()
                .with_stream(&[r#"{"answer":"partial answer"}"#, r#"{"answer":"more"}"#, "[DONE]"])
                .with_stream(&[r#"{"answer":"4"}"#, "[DONE]"]),
        );
        let mut consumer = StreamingConsumer::new(transport, "test", Answer::default());

        let handle = consumer.start(StreamRequest::new("/x"), |_| {}).await.unwrap();
        assert_eq!(consumer.pump().await, Some(Flow::Continue));
        assert_eq!(consumer.state().0, "partial answer");

        consumer.close();
        assert!(handle.is_closed());
        assert!(!consumer.view().has_open_stream());
        assert!(!consumer.status().is_busy());
        assert_eq!(consumer.status(), Status::Idle);
        assert_eq!(consumer.state().0, "");
        assert_eq!(consumer.pump().await, None);
        assert_eq!(consumer.drive().await, Status::Idle);

        let status = consumer.run(StreamRequest::new("/x"), |_| {}).await.unwrap();
        assert_eq!(status, Status::Done);
        assert_eq!(consumer.state().0, "4");
    }

    #[tokio::test]
    async fn close_when_idle_is_a_no_op() {
        let mut consumer = StreamingConsumer::new(
            Arc::new(ScriptedTransport::default()),
            "test",
            Answer::default(),
        );
        consumer.close();
        assert_eq!(consumer.status(), Status::Idle);
    }

    #[tokio::test]
    async fn drive_with_observes_every_frame() {
        let transport = Arc::new(ScriptedTransport::default().with_stream(&[
            r#"{"answer":"a"}"#,
            "",
            r#"{"answer":"b"}"#,
            "[DONE]",
        ]));
        let mut consumer = StreamingConsumer::new(transport, "test", Answer::default());
        consumer.start(StreamRequest::new("/x"), |_| {}).await.unwrap();

        let mut seen = Vec::new();
        consumer
            .drive_with(|vm| seen.push((vm.state().0.clone(), vm.status())))
            .await;
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), Status::Streaming),
                ("a".to_string(), Status::Streaming),
                ("b".to_string(), Status::Streaming),
                ("b".to_string(), Status::Done),
            ]
        );
    }
}

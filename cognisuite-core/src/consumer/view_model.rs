//! Per-feature view model and its transition function.

use futures_util::StreamExt;

use super::merge::{PayloadMerger, payload_error};
use super::status::Status;
use crate::error::CogniError;
use crate::streaming::{DecodedEvent, FrameDecoder, FrameStream, StreamHandle, make_closable_stream};

/// What the driver should do after applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Finished,
}

struct ActiveStream {
    frames: FrameStream,
    handle: StreamHandle,
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.handle.close();
    }
}

/// Accumulated UI state for one feature plus the stream feeding it.
///
/// At most one stream is open at a time. Opening another, finishing,
/// failing, cancelling and dropping the view model all close it.
pub struct ViewModel<M> {
    state: M,
    status: Status,
    error: Option<String>,
    active: Option<ActiveStream>,
    baseline: Option<M>,
    decoder: FrameDecoder,
    round: u64,
}

impl<M: PayloadMerger> ViewModel<M> {
    pub fn new(label: impl Into<String>, state: M) -> Self {
        Self {
            state,
            status: Status::Idle,
            error: None,
            active: None,
            baseline: None,
            decoder: FrameDecoder::new(label),
            round: 0,
        }
    }

    pub fn label(&self) -> &str {
        self.decoder.label()
    }

    pub fn state(&self) -> &M {
        &self.state
    }

    /// Direct access for user actions such as starting a new document.
    pub fn state_mut(&mut self) -> &mut M {
        &mut self.state
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// User-visible message of the last failed round.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_open_stream(&self) -> bool {
        self.active.is_some()
    }

    /// Number of submissions so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Start a round: close any open stream, let `prepare` record the user's
    /// submission, and move to `Submitting`.
    ///
    /// The baseline is taken before `prepare`, so a cancelled round leaves
    /// nothing of itself behind.
    pub fn begin_submit(&mut self, prepare: impl FnOnce(&mut M)) {
        self.close_stream();
        self.round += 1;
        self.error = None;
        self.baseline = Some(self.state.clone());
        prepare(&mut self.state);
        self.status = Status::Submitting;
        tracing::debug!(target: "cognisuite::consumer", label=%self.label(), round=self.round, "submitting");
    }

    /// Install `frames` as the open stream, closing the previous one first.
    pub fn attach(&mut self, frames: FrameStream) -> StreamHandle {
        self.close_stream();
        let (frames, handle) = make_closable_stream(frames);
        self.active = Some(ActiveStream {
            frames,
            handle: handle.clone(),
        });
        self.status = Status::Streaming;
        tracing::debug!(target: "cognisuite::consumer", label=%self.label(), round=self.round, "streaming");
        handle
    }

    /// The transition function. Events are ignored unless streaming.
    pub fn apply(&mut self, event: DecodedEvent) -> Flow {
        if self.status != Status::Streaming {
            tracing::trace!(target: "cognisuite::consumer", label=%self.label(), status=%self.status, "event ignored");
            return Flow::Finished;
        }

        match event {
            DecodedEvent::Complete => {
                self.finish(Status::Done);
                tracing::info!(target: "cognisuite::consumer", label=%self.label(), round=self.round, "stream complete");
                Flow::Finished
            }
            DecodedEvent::Error => {
                let message = self.state.server_error_message().to_string();
                self.fail(message);
                Flow::Finished
            }
            DecodedEvent::Empty => Flow::Continue,
            DecodedEvent::Data(payload) => {
                self.state.merge(&payload);
                match payload_error(&payload) {
                    Some(message) => {
                        self.fail(message);
                        Flow::Finished
                    }
                    None => Flow::Continue,
                }
            }
        }
    }

    /// Record a transport failure for the current round.
    pub fn transport_failed(&mut self, error: &CogniError) {
        tracing::error!(target: "cognisuite::consumer", label=%self.label(), err=%error, "transport failure");
        let message = self.state.connect_error_message().to_string();
        self.fail(message);
    }

    /// Abort the in-flight round, discarding what it produced.
    ///
    /// Returns `false` when nothing was in flight.
    pub fn cancel(&mut self) -> bool {
        if !self.status.is_busy() {
            return false;
        }
        self.close_stream();
        if let Some(baseline) = self.baseline.take() {
            self.state.restore(baseline);
        }
        self.error = None;
        self.status = Status::Idle;
        tracing::info!(target: "cognisuite::consumer", label=%self.label(), round=self.round, "cancelled");
        true
    }

    fn close_stream(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.close();
        }
    }

    /// Pull and apply the next frame. `None` when no stream is open.
    pub async fn pump(&mut self) -> Option<Flow> {
        let active = self.active.as_mut()?;
        let next = active.frames.next().await;
        let closed = active.handle.is_closed();

        Some(match next {
            Some(Ok(raw)) => {
                tracing::trace!(target: "cognisuite::stream", label=%self.label(), bytes=raw.len(), "frame");
                let event = self.decoder.decode(&raw);
                self.apply(event)
            }
            Some(Err(e)) => {
                self.transport_failed(&e);
                Flow::Finished
            }
            None if closed => {
                // Closed through a cloned handle.
                self.cancel();
                Flow::Finished
            }
            None => {
                self.transport_failed(&CogniError::StreamError(
                    "stream ended before completion".to_string(),
                ));
                Flow::Finished
            }
        })
    }

    /// Pump until the round reaches a terminal state.
    pub async fn drive(&mut self) -> Status {
        self.drive_with(|_| {}).await
    }

    /// Like [`drive`](Self::drive), calling `observer` after every frame.
    pub async fn drive_with(&mut self, mut observer: impl FnMut(&Self)) -> Status {
        while let Some(flow) = self.pump().await {
            observer(self);
            if flow == Flow::Finished {
                break;
            }
        }
        self.status
    }

    fn finish(&mut self, status: Status) {
        self.close_stream();
        self.baseline = None;
        self.status = status;
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(target: "cognisuite::consumer", label=%self.label(), round=self.round, message=%message, "round failed");
        self.state.on_failure(&message);
        self.error = Some(message);
        self.finish(Status::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use serde_json::{Value, json};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Text {
        text: String,
        failure: Option<String>,
    }

    impl PayloadMerger for Text {
        fn merge(&mut self, payload: &Value) {
            if let Some(delta) = payload.get("delta").and_then(Value::as_str) {
                self.text.push_str(delta);
            }
            if let Some(answer) = payload.get("answer").and_then(Value::as_str) {
                self.text = answer.to_string();
            }
        }

        fn on_failure(&mut self, message: &str) {
            self.failure = Some(message.to_string());
        }

        fn server_error_message(&self) -> &'static str {
            "server failed"
        }

        fn connect_error_message(&self) -> &'static str {
            "could not connect"
        }
    }

    type Tx = mpsc::UnboundedSender<Result<String, CogniError>>;

    fn channel() -> (Tx, FrameStream) {
        let (tx, rx) = mpsc::unbounded();
        (tx, Box::pin(rx))
    }

    fn frames(items: &[&str]) -> FrameStream {
        let items: Vec<Result<String, CogniError>> =
            items.iter().map(|s| Ok(s.to_string())).collect();
        Box::pin(futures_util::stream::iter(items))
    }

    fn streaming(items: &[&str]) -> (ViewModel<Text>, StreamHandle) {
        let mut vm = ViewModel::new("test", Text::default());
        vm.begin_submit(|_| {});
        let handle = vm.attach(frames(items));
        (vm, handle)
    }

    #[tokio::test]
    async fn deltas_concatenate_in_arrival_order() {
        let (mut vm, handle) = streaming(&[r#"{"delta":"He"}"#, r#"{"delta":"llo"}"#, "[DONE]"]);
        assert_eq!(vm.drive().await, Status::Done);
        assert_eq!(vm.state().text, "Hello");
        assert!(handle.is_closed());
        assert!(!vm.has_open_stream());

        let (mut vm, _) = streaming(&[r#"{"delta":"llo"}"#, r#"{"delta":"He"}"#, "[DONE]"]);
        vm.drive().await;
        assert_eq!(vm.state().text, "lloHe");
    }

    #[tokio::test]
    async fn malformed_and_empty_frames_do_not_end_the_stream() {
        let (mut vm, _) = streaming(&["", "{oops", r#"{"answer":"4"}"#, "  ", "[DONE]"]);
        assert_eq!(vm.drive().await, Status::Done);
        assert_eq!(vm.state().text, "4");
        assert!(vm.error_message().is_none());
    }

    #[tokio::test]
    async fn error_sentinel_fails_the_round() {
        let (mut vm, handle) =
            streaming(&[r#"{"answer":"partial"}"#, "[ERROR]", r#"{"answer":"late"}"#]);
        assert_eq!(vm.drive().await, Status::Error);
        assert_eq!(vm.error_message(), Some("server failed"));
        assert_eq!(vm.state().failure.as_deref(), Some("server failed"));
        assert_eq!(vm.state().text, "partial");
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn error_field_wins_over_other_fields() {
        let (mut vm, handle) =
            streaming(&[r#"{"answer":"x","error":"quota exceeded"}"#, "[ERROR]"]);
        assert_eq!(vm.drive().await, Status::Error);
        assert_eq!(vm.error_message(), Some("quota exceeded"));
        assert_eq!(vm.state().text, "x");
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn transport_error_and_early_eof_are_failures() {
        let mut vm = ViewModel::new("test", Text::default());
        vm.begin_submit(|_| {});
        let items: Vec<Result<String, CogniError>> = vec![
            Ok(r#"{"delta":"a"}"#.into()),
            Err(CogniError::StreamError("reset".into())),
        ];
        vm.attach(Box::pin(futures_util::stream::iter(items)));
        assert_eq!(vm.drive().await, Status::Error);
        assert_eq!(vm.error_message(), Some("could not connect"));

        let (mut vm, _) = streaming(&[r#"{"delta":"a"}"#]);
        assert_eq!(vm.drive().await, Status::Error);
        assert_eq!(vm.error_message(), Some("could not connect"));
    }

    #[tokio::test]
    async fn second_stream_closes_the_first() {
        let mut vm = ViewModel::new("test", Text::default());

        let (tx_a, stream_a) = channel();
        vm.begin_submit(|_| {});
        let handle_a = vm.attach(stream_a);
        tx_a.unbounded_send(Ok(r#"{"delta":"A1"}"#.into())).unwrap();
        assert_eq!(vm.pump().await, Some(Flow::Continue));
        assert_eq!(vm.state().text, "A1");

        let (tx_b, stream_b) = channel();
        vm.begin_submit(|s| s.text.clear());
        assert!(handle_a.is_closed());
        let handle_b = vm.attach(stream_b);

        // Late frames for the discarded stream go nowhere.
        let _ = tx_a.unbounded_send(Ok(r#"{"delta":"A2"}"#.into()));
        tx_b.unbounded_send(Ok(r#"{"delta":"B1"}"#.into())).unwrap();
        tx_b.unbounded_send(Ok("[DONE]".into())).unwrap();

        assert!(vm.has_open_stream());
        assert!(!handle_b.is_closed());
        assert_eq!(vm.drive().await, Status::Done);
        assert_eq!(vm.state().text, "B1");
        assert!(handle_b.is_closed());
    }

    #[tokio::test]
    async fn attach_alone_also_replaces() {
        let mut vm = ViewModel::new("test", Text::default());
        vm.begin_submit(|_| {});
        let (_tx_a, stream_a) = channel();
        let first = vm.attach(stream_a);
        let second = vm.attach(frames(&["[DONE]"]));
        assert!(first.is_closed());
        assert!(!second.is_closed());
    }

    #[tokio::test]
    async fn cancel_discards_partial_output() {
        let mut vm = ViewModel::new("test", Text::default());
        let (tx, stream) = channel();
        vm.begin_submit(|s| s.text.clear());
        let handle = vm.attach(stream);
        tx.unbounded_send(Ok(r#"{"answer":"partial answer"}"#.into())).unwrap();
        vm.pump().await;
        assert_eq!(vm.state().text, "partial answer");

        assert!(vm.cancel());
        assert_eq!(vm.status(), Status::Idle);
        assert_eq!(vm.state().text, "");
        assert!(handle.is_closed());
        assert!(!vm.has_open_stream());
        assert!(vm.error_message().is_none());

        assert!(!vm.cancel());
    }

    #[tokio::test]
    async fn closing_a_cloned_handle_cancels() {
        let mut vm = ViewModel::new("test", Text::default());
        let (tx, stream) = channel();
        vm.begin_submit(|_| {});
        let handle = vm.attach(stream);
        tx.unbounded_send(Ok(r#"{"delta":"par"}"#.into())).unwrap();
        vm.pump().await;

        handle.close();
        assert_eq!(vm.drive().await, Status::Idle);
        assert_eq!(vm.state().text, "");
    }

    #[tokio::test]
    async fn dropping_the_view_model_closes_its_stream() {
        let (vm, handle) = streaming(&[r#"{"delta":"a"}"#]);
        assert!(!handle.is_closed());
        drop(vm);
        assert!(handle.is_closed());
    }

    #[test]
    fn events_outside_streaming_are_ignored() {
        let mut vm = ViewModel::new("test", Text::default());
        assert_eq!(vm.apply(DecodedEvent::Data(json!({"delta":"x"}))), Flow::Finished);
        assert_eq!(vm.apply(DecodedEvent::Complete), Flow::Finished);
        assert_eq!(vm.status(), Status::Idle);
        assert_eq!(vm.state().text, "");
    }

    #[tokio::test]
    async fn terminal_states_accept_a_new_submission() {
        let (mut vm, _) = streaming(&[r#"{"answer":"one"}"#, "[DONE]"]);
        vm.drive().await;
        assert_eq!(vm.round(), 1);

        vm.begin_submit(|_| {});
        assert_eq!(vm.status(), Status::Submitting);
        assert_eq!(vm.round(), 2);
        // Accumulated state is left to the feature.
        assert_eq!(vm.state().text, "one");
    }
}

//! Document inspector: upload a document, then ask questions about it.
//!
//! Answers accumulate into a transcript that survives across questions and
//! is cleared only when a new document is uploaded.

use std::sync::Arc;

use serde_json::Value;

use super::UploadFile;
use crate::consumer::{PayloadMerger, SessionCorrelator, Status, StreamingConsumer};
use crate::error::CogniError;
use crate::execution::{StreamRequest, Transport, UploadRequest};
use crate::streaming::StreamHandle;

pub const UPLOAD_PATH: &str = "/api/doc-intel/upload";
pub const ASK_PATH: &str = "/api/doc-intel/ask";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocTranscript {
    pub entries: Vec<TranscriptEntry>,
}

impl PayloadMerger for DocTranscript {
    fn merge(&mut self, payload: &Value) {
        let Some(answer) = payload.get("answer").and_then(Value::as_str) else {
            return;
        };
        if answer.is_empty() {
            return;
        }
        if let Some(entry) = self.entries.last_mut() {
            entry.answer = answer.to_string();
        }
    }

    fn server_error_message(&self) -> &'static str {
        "An error occurred while answering the question."
    }

    fn connect_error_message(&self) -> &'static str {
        "Failed to connect to the document service."
    }
}

pub struct DocInspector {
    consumer: StreamingConsumer<DocTranscript>,
    thread: SessionCorrelator,
}

impl DocInspector {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            consumer: StreamingConsumer::new(transport, "doc-intel", DocTranscript::default()),
            thread: SessionCorrelator::new(),
        }
    }

    /// Upload a document and start a fresh transcript for it.
    pub async fn upload(&mut self, file: UploadFile) -> Result<String, CogniError> {
        let request = file.attach(UploadRequest::new(UPLOAD_PATH), "file")?;

        self.consumer.cancel();
        self.consumer.view_mut().state_mut().entries.clear();
        self.thread.reset();

        let response = self
            .consumer
            .transport()
            .upload_json("doc-intel upload", request)
            .await?;

        self.thread.observe(&response);
        self.thread.get().map(str::to_string).ok_or_else(|| {
            CogniError::ParseError("Upload failed to return thread_id".to_string())
        })
    }

    pub async fn start_ask(&mut self, question: &str) -> Result<StreamHandle, CogniError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CogniError::invalid_input("question must not be empty"));
        }
        let thread_id = self
            .thread
            .get()
            .ok_or_else(|| CogniError::invalid_input("upload a document before asking"))?
            .to_string();

        let request = StreamRequest::new(ASK_PATH)
            .param("thread_id", thread_id)
            .param("question", question);
        let question = question.to_string();
        self.consumer
            .start(request, move |state| {
                state.entries.push(TranscriptEntry {
                    question,
                    answer: String::new(),
                })
            })
            .await
    }

    pub async fn ask(&mut self, question: &str) -> Result<Status, CogniError> {
        self.start_ask(question).await?;
        Ok(self.consumer.drive().await)
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.consumer.state().entries
    }

    pub fn last_answer(&self) -> Option<&str> {
        self.transcript().last().map(|e| e.answer.as_str())
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread.get()
    }

    pub fn status(&self) -> Status {
        self.consumer.status()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.consumer.view().error_message()
    }

    pub fn consumer_mut(&mut self) -> &mut StreamingConsumer<DocTranscript> {
        &mut self.consumer
    }
}

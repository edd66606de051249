//! Code analyzer: upload one source file, stream a single analysis.

use std::sync::Arc;

use serde_json::Value;

use super::UploadFile;
use crate::consumer::{PayloadMerger, SessionCorrelator, Status, StreamingConsumer};
use crate::error::CogniError;
use crate::execution::{StreamRequest, Transport, UploadRequest};
use crate::streaming::StreamHandle;

pub const UPLOAD_PATH: &str = "/api/code-analyzer/upload";
pub const ANALYZE_PATH: &str = "/api/code-analyzer/analyze";

/// Latest analysis text. Each payload carries the full text so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeAnalysis {
    pub analysis: String,
}

impl PayloadMerger for CodeAnalysis {
    fn merge(&mut self, payload: &Value) {
        if let Some(text) = payload.get("analysis").and_then(Value::as_str)
            && !text.is_empty()
        {
            self.analysis = text.to_string();
        }
    }

    fn server_error_message(&self) -> &'static str {
        "An error occurred during analysis."
    }

    fn connect_error_message(&self) -> &'static str {
        "Failed to connect to the analysis service."
    }
}

pub struct CodeAnalyzer {
    consumer: StreamingConsumer<CodeAnalysis>,
    thread: SessionCorrelator,
}

impl CodeAnalyzer {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            consumer: StreamingConsumer::new(transport, "code-analyzer", CodeAnalysis::default()),
            thread: SessionCorrelator::new(),
        }
    }

    /// Upload a file, replacing any previous one. Returns the new thread id.
    pub async fn upload(&mut self, file: UploadFile) -> Result<String, CogniError> {
        let request = file.attach(UploadRequest::new(UPLOAD_PATH), "file")?;

        self.consumer.cancel();
        self.consumer.view_mut().state_mut().analysis.clear();
        self.thread.reset();

        let response = self
            .consumer
            .transport()
            .upload_json("code-analyzer upload", request)
            .await?;

        self.thread.observe(&response);
        self.thread.get().map(str::to_string).ok_or_else(|| {
            CogniError::ParseError("Upload failed to return thread_id".to_string())
        })
    }

    /// Open the analysis stream for the uploaded file.
    pub async fn start_analysis(&mut self) -> Result<StreamHandle, CogniError> {
        let thread_id = self
            .thread
            .get()
            .ok_or_else(|| CogniError::invalid_input("upload a code file before analyzing"))?
            .to_string();

        let request = StreamRequest::new(ANALYZE_PATH).param("thread_id", thread_id);
        self.consumer
            .start(request, |state| state.analysis.clear())
            .await
    }

    pub async fn analyze(&mut self) -> Result<Status, CogniError> {
        self.start_analysis().await?;
        Ok(self.consumer.drive().await)
    }

    /// Upload then analyze.
    pub async fn analyze_file(&mut self, file: UploadFile) -> Result<Status, CogniError> {
        self.upload(file).await?;
        self.analyze().await
    }

    pub fn analysis(&self) -> &str {
        &self.consumer.state().analysis
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

    pub fn consumer_mut(&mut self) -> &mut StreamingConsumer<CodeAnalysis> {
        &mut self.consumer
    }
}

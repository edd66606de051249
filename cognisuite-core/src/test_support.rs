//! Test doubles shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CogniError;
use crate::execution::{BinaryResponse, StreamRequest, Transport, UploadRequest};
use crate::streaming::FrameStream;

/// In-memory transport serving canned frames and JSON bodies.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    pub streams: Mutex<VecDeque<Result<Vec<String>, CogniError>>>,
    pub uploads: Mutex<VecDeque<Result<Value, CogniError>>>,
    pub binaries: Mutex<VecDeque<Result<BinaryResponse, CogniError>>>,
    pub requests: Mutex<Vec<StreamRequest>>,
    pub upload_requests: Mutex<Vec<UploadRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn with_stream(self, frames: &[&str]) -> Self {
        self.streams
            .lock()
            .unwrap()
            .push_back(Ok(frames.iter().map(|s| s.to_string()).collect()));
        self
    }

    pub(crate) fn with_stream_error(self, error: CogniError) -> Self {
        self.streams.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn with_upload(self, body: Value) -> Self {
        self.uploads.lock().unwrap().push_back(Ok(body));
        self
    }

    pub(crate) fn with_binary(self, response: Result<BinaryResponse, CogniError>) -> Self {
        self.binaries.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn last_request(&self) -> Option<StreamRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open_stream(
        &self,
        _label: &str,
        request: &StreamRequest,
    ) -> Result<FrameStream, CogniError> {
        self.requests.lock().unwrap().push(request.clone());
        let frames = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CogniError::ConnectionError("no script".into())))?;
        let items: Vec<Result<String, CogniError>> = frames.into_iter().map(Ok).collect();
        Ok(Box::pin(futures_util::stream::iter(items)))
    }

    async fn upload_json(
        &self,
        _label: &str,
        request: UploadRequest,
    ) -> Result<Value, CogniError> {
        self.upload_requests.lock().unwrap().push(request);
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CogniError::ConnectionError("no script".into())))
    }

    async fn upload_bytes(
        &self,
        _label: &str,
        request: UploadRequest,
    ) -> Result<BinaryResponse, CogniError> {
        self.upload_requests.lock().unwrap().push(request);
        self.binaries
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CogniError::ConnectionError("no script".into())))
    }

    async fn get_json(
        &self,
        _label: &str,
        request: &StreamRequest,
    ) -> Result<Value, CogniError> {
        self.requests.lock().unwrap().push(request.clone());
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CogniError::ConnectionError("no script".into())))
    }
}

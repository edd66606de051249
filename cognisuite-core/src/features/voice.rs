//! Voice assistant: one recorded clip in, one synthesized reply out.
//!
//! There is no stream here; the reply is a single binary body.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use super::UploadFile;
use crate::consumer::Status;
use crate::defaults;
use crate::error::CogniError;
use crate::execution::{Transport, UploadRequest};

pub const CHAT_PATH: &str = "/api/voice-assistant/chat";
pub const RECORDING_FILE_NAME: &str = "recording.webm";
pub const RECORDING_MIME: &str = "audio/webm";
pub const DEFAULT_REPLY_MIME: &str = "audio/mpeg";

const FAILURE_MESSAGE: &str = "Failed to get audio response from server.";

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceReply {
    pub audio: Bytes,
    pub content_type: String,
}

impl VoiceReply {
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), CogniError> {
        tokio::fs::write(path.as_ref(), &self.audio).await?;
        Ok(())
    }
}

pub struct VoiceAssistant {
    transport: Arc<dyn Transport>,
    status: Status,
    error: Option<String>,
    last_reply: Option<VoiceReply>,
}

impl VoiceAssistant {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            status: Status::Idle,
            error: None,
            last_reply: None,
        }
    }

    /// Send a browser-style WebM recording.
    ///
    /// Every clip starts its own backend thread.
    pub async fn send_audio(&mut self, audio: impl Into<Bytes>) -> Result<VoiceReply, CogniError> {
        let file = UploadFile::new(RECORDING_FILE_NAME, audio).with_mime(RECORDING_MIME);
        self.send_recording(file).await
    }

    pub async fn send_recording(&mut self, file: UploadFile) -> Result<VoiceReply, CogniError> {
        let request = file
            .attach(UploadRequest::new(CHAT_PATH), "file")?
            .text("thread_id", defaults::protocol::UNASSIGNED_THREAD);

        self.status = Status::Submitting;
        self.error = None;

        match self.transport.upload_bytes("voice", request).await {
            Ok(response) => {
                let reply = VoiceReply {
                    audio: response.bytes,
                    content_type: response
                        .content_type
                        .unwrap_or_else(|| DEFAULT_REPLY_MIME.to_string()),
                };
                tracing::info!(target: "cognisuite::voice", bytes=reply.audio.len(), content_type=%reply.content_type, "voice reply received");
                self.status = Status::Done;
                self.last_reply = Some(reply.clone());
                Ok(reply)
            }
            Err(e) => {
                tracing::error!(target: "cognisuite::voice", err=%e, "voice request failed");
                self.status = Status::Error;
                self.error = Some(FAILURE_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_reply(&self) -> Option<&VoiceReply> {
        self.last_reply.as_ref()
    }
}

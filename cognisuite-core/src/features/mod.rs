//! Feature sessions.
//!
//! Each session owns one view model and plays the role of a page: it
//! validates input, builds the request, and exposes the accumulated state.

pub mod assistant;
pub mod code_analyzer;
pub mod data_gen;
pub mod doc_intel;
pub mod vector;
pub mod voice;

use std::path::Path;

use bytes::Bytes;

use crate::error::CogniError;
use crate::execution::UploadRequest;

pub use assistant::{ChatAssistant, ChatHistory, ChatMessage, ChatRole};
pub use code_analyzer::{CodeAnalysis, CodeAnalyzer};
pub use data_gen::{DataGenerator, GeneratedData};
pub use doc_intel::{DocInspector, DocTranscript, TranscriptEntry};
pub use vector::{
    ColorScheme, Complexity, Style, SupportedFormats, ValidationReport, VectorFormat,
    VectorOutput, VectorRequest, VectorStudio,
};
pub use voice::{VoiceAssistant, VoiceReply};

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    /// Guessed from the file name when `None`.
    pub mime: Option<String>,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CogniError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            CogniError::InvalidInput(format!("Cannot read '{}': {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    /// Add this file to `request` under `field`. Empty files are rejected.
    pub(crate) fn attach(
        self,
        request: UploadRequest,
        field: &str,
    ) -> Result<UploadRequest, CogniError> {
        if self.bytes.is_empty() {
            return Err(CogniError::invalid_input(format!(
                "'{}' is empty",
                self.file_name
            )));
        }
        Ok(match self.mime {
            Some(mime) => request.file_with_mime(field, self.file_name, mime, self.bytes),
            None => request.file(field, self.file_name, self.bytes),
        })
    }
}

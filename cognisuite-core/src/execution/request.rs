//! Request descriptions handed to a [`Transport`](super::Transport).

use bytes::Bytes;

/// A GET request against a backend path with ordered query parameters.
///
/// Used for streaming endpoints and for small JSON lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl StreamRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Full URL with every key and value percent-encoded, in insertion order.
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        for (i, (key, value)) in self.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }
}

#[derive(Debug, Clone)]
pub enum UploadPart {
    File {
        field: String,
        file_name: String,
        /// Guessed from `file_name` when `None`.
        mime: Option<String>,
        bytes: Bytes,
    },
    Text {
        field: String,
        value: String,
    },
}

/// A multipart POST.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: String,
    pub parts: Vec<UploadPart>,
}

impl UploadRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parts: Vec::new(),
        }
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(UploadPart::File {
            field: field.into(),
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        });
        self
    }

    pub fn file_with_mime(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(UploadPart::File {
            field: field.into(),
            file_name: file_name.into(),
            mime: Some(mime.into()),
            bytes: bytes.into(),
        });
        self
    }

    pub fn text(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(UploadPart::Text {
            field: field.into(),
            value: value.into(),
        });
        self
    }
}

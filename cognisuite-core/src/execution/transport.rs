//! Transport seam
//!
//! The consumer only ever talks to the backend through [`Transport`]; the
//! reqwest-backed [`HttpTransport`] is the production implementation.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_TYPE};

use super::http::errors::classify_http_error;
use super::http::{HttpInterceptor, HttpRequestContext};
use super::{StreamRequest, UploadPart, UploadRequest};
use crate::error::CogniError;
use crate::streaming::{FrameStream, stream_sse_frames};
use crate::types::ClientConfig;

/// Raw response body plus its declared media type.
#[derive(Debug, Clone)]
pub struct BinaryResponse {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a one-way event stream. Resolves once response headers arrive.
    async fn open_stream(
        &self,
        label: &str,
        request: &StreamRequest,
    ) -> Result<FrameStream, CogniError>;

    /// Multipart POST answered with a JSON body.
    async fn upload_json(
        &self,
        label: &str,
        request: UploadRequest,
    ) -> Result<serde_json::Value, CogniError>;

    /// Multipart POST answered with an opaque binary body.
    async fn upload_bytes(
        &self,
        label: &str,
        request: UploadRequest,
    ) -> Result<BinaryResponse, CogniError>;

    /// Plain GET answered with a JSON body.
    async fn get_json(
        &self,
        label: &str,
        request: &StreamRequest,
    ) -> Result<serde_json::Value, CogniError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, CogniError> {
        let client = config.http.build_client()?;
        Ok(Self::with_client(config, client))
    }

    /// Use a pre-built client; `config.http` is then only consulted for
    /// per-request behavior such as stream compression.
    pub fn with_client(config: ClientConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            config,
            interceptors: Vec::new(),
        }
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn HttpInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn send(
        &self,
        ctx: &HttpRequestContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, CogniError> {
        let mut rb = builder;
        for it in &self.interceptors {
            rb = it.on_before_send(ctx, rb)?;
        }

        let resp = match rb.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let error = CogniError::from(e);
                self.notify_error(ctx, &error);
                return Err(error);
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            let error = classify_http_error(status.as_u16(), &body, status.canonical_reason());
            self.notify_error(ctx, &error);
            return Err(error);
        }

        for it in &self.interceptors {
            it.on_response(ctx, &resp)?;
        }
        Ok(resp)
    }

    fn notify_error(&self, ctx: &HttpRequestContext, error: &CogniError) {
        tracing::error!(target: "cognisuite::http", label=%ctx.label, url=%ctx.url, err=%error, "request failed");
        for it in &self.interceptors {
            it.on_error(ctx, error);
        }
    }

    async fn send_multipart(
        &self,
        label: &str,
        request: UploadRequest,
    ) -> Result<reqwest::Response, CogniError> {
        let url = self.url_for(&request.path);
        let ctx = HttpRequestContext::new(label, &url, false);
        let form = build_form(request.parts)?;
        let rb = self.client.post(&url).multipart(form);
        self.send(&ctx, rb).await
    }
}

fn build_form(parts: Vec<UploadPart>) -> Result<reqwest::multipart::Form, CogniError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part {
            UploadPart::File {
                field,
                file_name,
                mime,
                bytes,
            } => {
                let mime = mime.unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .essence_str()
                        .to_string()
                });
                let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                    .file_name(file_name)
                    .mime_str(&mime)
                    .map_err(|e| {
                        CogniError::InvalidInput(format!("Invalid MIME type '{mime}': {e}"))
                    })?;
                form.part(field, part)
            }
            UploadPart::Text { field, value } => form.text(field, value),
        };
    }
    Ok(form)
}

fn parse_json_body(label: &str, text: &str) -> Result<serde_json::Value, CogniError> {
    serde_json::from_str(text).map_err(|e| {
        CogniError::ParseError(format!("Failed to parse response JSON ({label}): {e}"))
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open_stream(
        &self,
        label: &str,
        request: &StreamRequest,
    ) -> Result<FrameStream, CogniError> {
        let url = request.url(&self.config.base_url);
        let ctx = HttpRequestContext::new(label, &url, true);

        let mut rb = self
            .client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if self.config.http.stream_disable_compression {
            rb = rb.header(ACCEPT_ENCODING, "identity");
        }

        tracing::debug!(target: "cognisuite::http", label=%label, url=%url, "opening event stream");
        let resp = self.send(&ctx, rb).await?;

        let byte_stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| CogniError::StreamError(format!("Stream error: {e}"))));

        Ok(stream_sse_frames(byte_stream, self.interceptors.clone(), ctx))
    }

    async fn upload_json(
        &self,
        label: &str,
        request: UploadRequest,
    ) -> Result<serde_json::Value, CogniError> {
        let resp = self.send_multipart(label, request).await?;
        let text = resp.text().await?;
        parse_json_body(label, &text)
    }

    async fn upload_bytes(
        &self,
        label: &str,
        request: UploadRequest,
    ) -> Result<BinaryResponse, CogniError> {
        let resp = self.send_multipart(label, request).await?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?;
        Ok(BinaryResponse {
            bytes,
            content_type,
        })
    }

    async fn get_json(
        &self,
        label: &str,
        request: &StreamRequest,
    ) -> Result<serde_json::Value, CogniError> {
        let url = request.url(&self.config.base_url);
        let ctx = HttpRequestContext::new(label, &url, false);
        let resp = self.send(&ctx, self.client.get(&url)).await?;
        let text = resp.text().await?;
        parse_json_body(label, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_rejects_invalid_mime() {
        let parts = vec![UploadPart::File {
            field: "file".into(),
            file_name: "a.txt".into(),
            mime: Some("not a mime".into()),
            bytes: Bytes::from_static(b"x"),
        }];
        assert!(matches!(build_form(parts), Err(CogniError::InvalidInput(_))));
    }

    #[test]
    fn form_guesses_mime_from_file_name() {
        let parts = vec![
            UploadPart::File {
                field: "file".into(),
                file_name: "main.rs".into(),
                mime: None,
                bytes: Bytes::from_static(b"fn main() {}"),
            },
            UploadPart::Text {
                field: "thread_id".into(),
                value: "new".into(),
            },
        ];
        assert!(build_form(parts).is_ok());
    }

    #[test]
    fn json_body_errors_are_parse_errors() {
        let err = parse_json_body("upload", "<html>").unwrap_err();
        assert!(matches!(err, CogniError::ParseError(msg) if msg.contains("upload")));
    }
}

//! HTTP Interceptor interfaces
//!
//! Interceptors can observe and tweak request builders before send, observe
//! responses, be notified of errors, and receive streaming SSE events. The
//! hooks are best-effort and should avoid expensive work.

use crate::error::CogniError;

/// Context passed to interceptors describing the request.
#[derive(Clone, Debug)]
pub struct HttpRequestContext {
    pub request_id: String,
    /// Feature label, e.g. "doc-intel ask".
    pub label: String,
    pub url: String,
    pub stream: bool,
}

impl HttpRequestContext {
    pub fn new(label: impl Into<String>, url: impl Into<String>, stream: bool) -> Self {
        Self {
            request_id: generate_request_id(),
            label: label.into(),
            url: url.into(),
            stream,
        }
    }
}

pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub trait HttpInterceptor: Send + Sync {
    /// Called before sending a request. Return the (possibly modified)
    /// builder or an error to short-circuit the request.
    fn on_before_send(
        &self,
        _ctx: &HttpRequestContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, CogniError> {
        Ok(builder)
    }

    /// Called after a successful response is received.
    fn on_response(
        &self,
        _ctx: &HttpRequestContext,
        _response: &reqwest::Response,
    ) -> Result<(), CogniError> {
        Ok(())
    }

    fn on_error(&self, _ctx: &HttpRequestContext, _error: &CogniError) {}

    /// Called for every SSE event of a streaming request.
    fn on_sse_event(
        &self,
        _ctx: &HttpRequestContext,
        _event: &eventsource_stream::Event,
    ) -> Result<(), CogniError> {
        Ok(())
    }
}

/// Logs request lifecycle through `tracing`. Request bodies are not logged.
#[derive(Clone, Default)]
pub struct LoggingInterceptor;

impl HttpInterceptor for LoggingInterceptor {
    fn on_before_send(
        &self,
        ctx: &HttpRequestContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, CogniError> {
        tracing::debug!(target: "cognisuite::http", request_id=%ctx.request_id, label=%ctx.label, url=%ctx.url, stream=%ctx.stream, "sending request");
        Ok(builder)
    }

    fn on_response(
        &self,
        ctx: &HttpRequestContext,
        response: &reqwest::Response,
    ) -> Result<(), CogniError> {
        tracing::debug!(target: "cognisuite::http", request_id=%ctx.request_id, label=%ctx.label, status=%response.status().as_u16(), "response received");
        Ok(())
    }

    fn on_error(&self, ctx: &HttpRequestContext, error: &CogniError) {
        tracing::debug!(target: "cognisuite::http", request_id=%ctx.request_id, label=%ctx.label, url=%ctx.url, err=%error, "request error");
    }

    fn on_sse_event(
        &self,
        ctx: &HttpRequestContext,
        event: &eventsource_stream::Event,
    ) -> Result<(), CogniError> {
        tracing::trace!(target: "cognisuite::http", request_id=%ctx.request_id, label=%ctx.label, bytes=event.data.len(), "sse event");
        Ok(())
    }
}

//! SSE frame extraction
//!
//! Turns a response byte stream into the sequence of SSE `data` payloads.
//! Classification is left to [`FrameDecoder`](super::FrameDecoder).

use std::pin::Pin;
use std::sync::Arc;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};

use crate::error::CogniError;
use crate::execution::http::interceptor::{HttpInterceptor, HttpRequestContext};

/// Raw frames in arrival order. Transport failures surface as `Err` items.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, CogniError>> + Send>>;

/// Parse SSE events out of `byte_stream` and yield their `data` fields.
///
/// - Calls `HttpInterceptor::on_sse_event` for every event.
/// - Ends after the first transport or SSE decoding error.
pub fn stream_sse_frames<S, B>(
    byte_stream: S,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
    ctx: HttpRequestContext,
) -> FrameStream
where
    S: Stream<Item = Result<B, CogniError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let out = async_stream::stream! {
        let mut sse_stream = Box::pin(byte_stream.eventsource());

        while let Some(item) = sse_stream.next().await {
            let event = match item {
                Ok(ev) => ev,
                Err(e) => {
                    let message = format!("SSE stream error ({}): {e}", ctx.label);
                    yield Err(CogniError::StreamError(message));
                    return;
                }
            };

            for it in &interceptors {
                if let Err(e) = it.on_sse_event(&ctx, &event) {
                    yield Err(e);
                    return;
                }
            }

            yield Ok(event.data);
        }
    };

    Box::pin(out)
}

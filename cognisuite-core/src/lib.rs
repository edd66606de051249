//! cognisuite-core
//!
//! Streaming runtime shared by every CogniSuite feature: SSE framing, the
//! per-feature view model, the HTTP transport, and the feature sessions.
#![deny(unsafe_code)]

pub mod consumer;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod features;
pub mod streaming;
pub mod types;

#[cfg(test)]
mod test_support;

pub use consumer::{Flow, PayloadMerger, SessionCorrelator, Status, StreamingConsumer, ViewModel};
pub use error::CogniError;
pub use execution::{HttpTransport, StreamRequest, Transport, UploadRequest};
pub use streaming::{DecodedEvent, FrameDecoder, StreamHandle};
pub use types::{ClientConfig, HttpConfig};

//! Streaming Module
//!
//! Everything between raw response bytes and a classified event:
//! - SSE framing (`data:` payload extraction) via eventsource-stream
//! - Frame classification into sentinels, empty frames and JSON payloads
//! - Close handles that end an open stream on demand

mod frame;
mod handle;
mod sse_frames;

pub use frame::*;
pub use handle::*;
pub use sse_frames::*;

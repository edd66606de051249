//! Streaming Response Consumer
//!
//! One generic implementation of the submit → stream → terminal cycle that
//! every feature session runs:
//! - [`ViewModel`]: status machine, accumulated state, the single open stream
//! - [`PayloadMerger`]: per-feature rules for folding a payload into state
//! - [`SessionCorrelator`]: server-issued thread identifier bookkeeping
//! - [`StreamingConsumer`]: binds a view model to a [`Transport`](crate::execution::Transport)

mod correlator;
mod driver;
mod merge;
mod status;
mod view_model;

pub use correlator::{SessionCorrelator, SessionId};
pub use driver::StreamingConsumer;
pub use merge::{PayloadMerger, nested_or_top, payload_error};
pub use status::Status;
pub use view_model::{Flow, ViewModel};

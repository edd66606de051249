//! # CogniSuite
//!
//! Client for the CogniSuite backend: code analysis, document Q&A,
//! structured data generation, vector graphics, a chat assistant and a voice
//! assistant. Every streamed feature is driven by the same view model from
//! `cognisuite-core`.
//!
//! ```rust,no_run
//! use cognisuite::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CogniError> {
//!     let suite = CogniSuite::builder().base_url("http://localhost:8000").build()?;
//!     let mut chat = suite.chat_assistant();
//!     chat.send("Hello!").await?;
//!     println!("{}", chat.messages()[1].content);
//!     Ok(())
//! }
//! ```
#![deny(unsafe_code)]

pub mod builder;
pub mod observability;

pub use builder::{CogniSuite, CogniSuiteBuilder};
pub use cognisuite_core as core;
pub use cognisuite_core::{CogniError, Status, features};

pub mod prelude {
    pub use crate::builder::{CogniSuite, CogniSuiteBuilder};
    pub use crate::observability::tracing::{OutputFormat, TracingConfig, init_tracing};
    pub use cognisuite_core::features::*;
    pub use cognisuite_core::{CogniError, Status, StreamHandle};
}

//! Error Handling Module
//!
//! One error enum for every failure a feature session can run into:
//! - input validation (rejected before any request is made)
//! - transport failures (connect, dropped stream, non-2xx responses)
//! - server-signaled errors (`[ERROR]` sentinel or an `error` payload field)
//! - parsing failures of response bodies
//!
//! # Example
//!
//! ```rust,ignore
//! use cognisuite_core::error::{CogniError, ErrorCategory};
//!
//! let error = CogniError::invalid_input("prompt must not be empty");
//! assert_eq!(error.category(), ErrorCategory::Validation);
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;

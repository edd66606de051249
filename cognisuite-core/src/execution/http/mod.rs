//! HTTP helpers shared by the transport.

pub mod errors;
pub mod interceptor;

pub use interceptor::{HttpInterceptor, HttpRequestContext, LoggingInterceptor};

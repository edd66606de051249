//! Configuration types.

mod config;
mod http;

pub use config::ClientConfig;
pub use http::HttpConfig;

//! Default values shared across the crate.

pub mod http {
    use std::time::Duration;

    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &str = concat!("cognisuite/", env!("CARGO_PKG_VERSION"));
}

pub mod backend {
    pub const BASE_URL: &str = "http://localhost:8000";
    pub const BASE_URL_ENV: &str = "COGNISUITE_BASE_URL";
    pub const STREAM_DISABLE_COMPRESSION_ENV: &str = "COGNISUITE_STREAM_DISABLE_COMPRESSION";
}

pub mod protocol {
    /// Terminal frame for a successful stream.
    pub const DONE_SENTINEL: &str = "[DONE]";
    /// Terminal frame for a failed stream.
    pub const ERROR_SENTINEL: &str = "[ERROR]";
    /// Literal prefix some proxies leave in front of the SSE payload.
    pub const DATA_PREFIX: &str = "data: ";
    /// Wire value for a session that has no server-issued identifier yet.
    pub const UNASSIGNED_THREAD: &str = "new";
}

//! Client configuration.

use super::HttpConfig;
use crate::defaults;

/// Where the backend lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash.
    pub base_url: String,
    pub http: HttpConfig,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            http: HttpConfig::default(),
        }
    }

    /// Read `COGNISUITE_BASE_URL`, falling back to the local development backend.
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::backend::BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| defaults::backend::BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(defaults::backend::BASE_URL)
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let cfg = ClientConfig::new("http://backend:8000/");
        assert_eq!(cfg.base_url, "http://backend:8000");
    }

    #[test]
    fn default_points_at_local_backend() {
        assert_eq!(ClientConfig::default().base_url, "http://localhost:8000");
    }
}

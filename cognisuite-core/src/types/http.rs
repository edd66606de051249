//! HTTP settings for the reqwest client behind [`HttpTransport`](crate::HttpTransport).

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::defaults;
use crate::error::CogniError;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout.
    ///
    /// Applies to the body as well, so a value here also bounds how long a
    /// stream may stay open. Unset by default: streams end on a sentinel,
    /// a transport error, or cancellation.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// Sent with every request.
    pub headers: HashMap<String, String>,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    /// Whether streaming requests send `Accept-Encoding: identity`.
    ///
    /// Intermediary compression can buffer long-lived SSE responses.
    pub stream_disable_compression: bool,
}

impl HttpConfig {
    /// Build the shared client. Bad header names, header values or proxy
    /// URLs are configuration errors.
    pub fn build_client(&self) -> Result<reqwest::Client, CogniError> {
        let mut builder = reqwest::Client::builder().default_headers(self.header_map()?);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(url) = &self.proxy {
            let proxy = reqwest::Proxy::all(url).map_err(|e| {
                CogniError::ConfigurationError(format!("Invalid proxy '{url}': {e}"))
            })?;
            builder = builder.proxy(proxy);
        }
        builder.build().map_err(|e| {
            CogniError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
        })
    }

    fn header_map(&self) -> Result<HeaderMap, CogniError> {
        self.headers
            .iter()
            .map(|(name, value)| -> Result<(HeaderName, HeaderValue), CogniError> {
                let name = HeaderName::try_from(name.as_str()).map_err(|e| {
                    CogniError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
                })?;
                let value = HeaderValue::try_from(value.as_str()).map_err(|e| {
                    CogniError::ConfigurationError(format!("Invalid value for '{name}': {e}"))
                })?;
                Ok((name, value))
            })
            .collect()
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(val) => !matches!(val.trim().to_lowercase().as_str(), "false" | "0" | "off" | "no"),
        Err(_) => default,
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Some(defaults::http::CONNECT_TIMEOUT),
            headers: HashMap::new(),
            proxy: None,
            user_agent: Some(defaults::http::USER_AGENT.to_string()),
            stream_disable_compression: env_flag(
                defaults::backend::STREAM_DISABLE_COMPRESSION_ENV,
                true,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_request_timeout() {
        let cfg = HttpConfig::default();
        assert!(cfg.timeout.is_none());
        assert_eq!(cfg.connect_timeout, Some(defaults::http::CONNECT_TIMEOUT));
        assert!(cfg.build_client().is_ok());
    }

    #[test]
    fn headers_become_default_headers() {
        let mut cfg = HttpConfig::default();
        cfg.headers.insert("X-Team".into(), "docs".into());
        let map = cfg.header_map().unwrap();
        assert_eq!(map.get("x-team").and_then(|v| v.to_str().ok()), Some("docs"));
    }

    #[test]
    fn invalid_header_or_proxy_is_a_configuration_error() {
        let mut cfg = HttpConfig::default();
        cfg.headers.insert("Bad Header".into(), "v".into());
        assert!(matches!(cfg.build_client(), Err(CogniError::ConfigurationError(_))));

        let mut cfg = HttpConfig::default();
        cfg.headers.insert("X-Ok".into(), "line\nbreak".into());
        assert!(matches!(cfg.build_client(), Err(CogniError::ConfigurationError(_))));

        let cfg = HttpConfig {
            proxy: Some("not a url".into()),
            ..HttpConfig::default()
        };
        assert!(matches!(cfg.build_client(), Err(CogniError::ConfigurationError(_))));
    }
}

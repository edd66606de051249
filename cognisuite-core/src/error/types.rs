//! Core error types.

use thiserror::Error;

/// Coarse classification used for presentation and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Network,
    Server,
    Parsing,
    Configuration,
    Cancelled,
}

#[derive(Debug, Clone, Error)]
pub enum CogniError {
    /// Required input missing or out of range. No request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Backend answered with a non-success status.
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Backend signaled a failure inside an open stream.
    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl CogniError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::ConnectionError(_) | Self::HttpError(_) | Self::StreamError(_) => {
                ErrorCategory::Network
            }
            Self::ApiError { status, .. } if *status < 500 => ErrorCategory::Validation,
            Self::ApiError { .. } | Self::ServerError(_) => ErrorCategory::Server,
            Self::ParseError(_) | Self::JsonError(_) => ErrorCategory::Parsing,
            Self::ConfigurationError(_) | Self::IoError(_) => ErrorCategory::Configuration,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// HTTP status code, when the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether resubmitting the same request could plausibly succeed.
    ///
    /// Informational only: nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::HttpError(_) | Self::StreamError(_) => true,
            Self::ApiError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(
            CogniError::invalid_input("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CogniError::api_error(503, "down").category(),
            ErrorCategory::Server
        );
        assert_eq!(
            CogniError::api_error(404, "missing").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CogniError::ConnectionError("refused".into()).category(),
            ErrorCategory::Network
        );
    }

    #[test]
    fn retryable_only_for_transport_and_5xx() {
        assert!(CogniError::ConnectionError("x".into()).is_retryable());
        assert!(CogniError::api_error(502, "bad gateway").is_retryable());
        assert!(!CogniError::api_error(400, "bad request").is_retryable());
        assert!(!CogniError::ServerError("boom".into()).is_retryable());
        assert!(!CogniError::invalid_input("x").is_retryable());
    }

    #[test]
    fn status_code_only_on_api_error() {
        assert_eq!(CogniError::api_error(401, "no").status_code(), Some(401));
        assert_eq!(CogniError::Cancelled.status_code(), None);
    }
}

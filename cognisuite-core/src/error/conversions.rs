//! Type Conversions for CogniError

use super::types::CogniError;

impl From<reqwest::Error> for CogniError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::ConnectionError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CogniError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for CogniError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

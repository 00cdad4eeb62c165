use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    BadGateway,
}

/// JSON error payload returned by the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("unknown environment '{0}', expected 'dev' or 'preview'")]
    UnknownEnvironment(String),
    #[error("route prefix '{0}' must start with '/' and not end with '/'")]
    InvalidPrefix(String),
    #[error("route target '{0}' must be an http(s) origin")]
    InvalidTarget(String),
}

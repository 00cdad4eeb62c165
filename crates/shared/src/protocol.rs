use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message carried in [`RequestResult::data`] whenever a call fails, whatever the cause.
pub const FAILURE_MESSAGE: &str = "Oops, something went wrong.";

/// Status reported when no response was captured before the failure.
pub const DEFAULT_FAILURE_STATUS: u16 = 500;

/// Responses below this status are treated as successful.
pub const FAILURE_STATUS_THRESHOLD: u16 = 400;

pub fn is_success_status(status: u16) -> bool {
    status < FAILURE_STATUS_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one HTTP call.
///
/// `url` is either absolute or a logical path such as `/api/scheduler/get-pop-schedules`.
/// Logical paths are resolved root-relative by the executor, so a missing leading
/// slash is tolerated. The builder methods consume `self`; once handed to an
/// executor the descriptor is only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Normalized outcome of a call. Never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
    pub status: u16,
    pub data: Value,
}

impl RequestResult {
    pub fn success(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    pub fn failure(status: u16) -> Self {
        Self {
            status,
            data: Value::String(FAILURE_MESSAGE.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        is_success_status(self.status)
    }

    /// Text form of `data`, as shown to users when the call did not load.
    pub fn message(&self) -> String {
        match &self.data {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

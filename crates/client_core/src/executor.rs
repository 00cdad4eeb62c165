use async_trait::async_trait;
use reqwest::{Client, Method as HttpMethod};
use serde_json::Value;
use shared::protocol::{
    is_success_status, Method, RequestDescriptor, RequestResult, DEFAULT_FAILURE_STATUS,
};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// Performs one call and reports its outcome as a [`RequestResult`].
///
/// Implementations are fault barriers: every failure is folded into the
/// result, nothing is returned as an error.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, descriptor: &RequestDescriptor) -> RequestResult;
}

/// Failure before a complete response was captured.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct HttpExecutor {
    http: Client,
    base_url: Url,
}

impl HttpExecutor {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let parsed = Url::parse(base_url).map_err(|source| TransportError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self::with_client(Client::new(), parsed))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute http(s) URLs pass through; anything else is a root-relative path on the base URL.
    pub fn resolve_url(&self, raw: &str) -> Result<Url, TransportError> {
        if let Ok(absolute) = Url::parse(raw) {
            if matches!(absolute.scheme(), "http" | "https") {
                return Ok(absolute);
            }
        }

        let path = format!("/{}", raw.trim_start_matches('/'));
        self.base_url
            .join(&path)
            .map_err(|source| TransportError::InvalidUrl {
                url: raw.to_string(),
                source,
            })
    }

    async fn call(&self, descriptor: &RequestDescriptor) -> Result<(u16, Vec<u8>), TransportError> {
        let url = self.resolve_url(&descriptor.url)?;
        let mut request = self.http.request(http_method(descriptor.method), url);
        for (name, value) in &descriptor.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        // The status only counts once the body is in; a failed read is a transport failure.
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, descriptor: &RequestDescriptor) -> RequestResult {
        match self.call(descriptor).await {
            Ok((status, body)) if is_success_status(status) => {
                RequestResult::success(status, decode_body(&body))
            }
            Ok((status, _)) => {
                debug!(
                    method = %descriptor.method,
                    url = %descriptor.url,
                    status,
                    "request: backend answered with failure status"
                );
                RequestResult::failure(status)
            }
            Err(error) => {
                error!(
                    method = %descriptor.method,
                    url = %descriptor.url,
                    %error,
                    "request: no response received"
                );
                RequestResult::failure(DEFAULT_FAILURE_STATUS)
            }
        }
    }
}

fn http_method(method: Method) -> HttpMethod {
    match method {
        Method::Get => HttpMethod::GET,
        Method::Post => HttpMethod::POST,
        Method::Put => HttpMethod::PUT,
        Method::Patch => HttpMethod::PATCH,
        Method::Delete => HttpMethod::DELETE,
    }
}

/// JSON when the body parses as JSON, otherwise the body text.
fn decode_body(body: &[u8]) -> Value {
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[cfg(test)]
#[path = "tests/executor_tests.rs"]
mod tests;

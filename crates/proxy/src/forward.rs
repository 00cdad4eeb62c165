use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{
        header::{self, HeaderName},
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use reqwest::{redirect, Client};
use shared::{
    error::{ApiError, ErrorCode},
    routes::{ProxyRoute, RouteTable},
};
use tracing::{debug, error};

pub struct ProxyState {
    http: Client,
    routes: RouteTable,
}

impl ProxyState {
    pub fn new(routes: RouteTable) -> reqwest::Result<Self> {
        // Redirects go back to the caller, with their location rewritten onto the prefix.
        let http = Client::builder().redirect(redirect::Policy::none()).build()?;
        Ok(Self { http, routes })
    }
}

pub fn build_router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .fallback(forward)
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

fn api_error(status: StatusCode, code: ErrorCode, message: String) -> Response {
    (status, Json(ApiError::new(code, message))).into_response()
}

async fn forward(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let Some(target) = state.routes.resolve(path_and_query) else {
        debug!(path = %uri.path(), "proxy: no route");
        return api_error(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            format!("no backend route for {}", uri.path()),
        );
    };

    let mut request = state.http.request(method.clone(), &target.url);
    for (name, value) in headers.iter() {
        if name == header::HOST || is_hop_by_hop(name) {
            continue;
        }
        request = request.header(name, value);
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = match request.send().await {
        Ok(upstream) => upstream,
        Err(err) => {
            error!(
                %method,
                path = %uri.path(),
                upstream = %target.url,
                error = %err,
                "proxy: upstream unreachable"
            );
            return api_error(
                StatusCode::BAD_GATEWAY,
                ErrorCode::BadGateway,
                format!("backend for {} is unavailable", target.route.prefix),
            );
        }
    };

    debug!(
        %method,
        path = %uri.path(),
        upstream = %target.url,
        status = upstream.status().as_u16(),
        "proxy: forwarded"
    );
    relay(target.route, upstream).await
}

async fn relay(route: &ProxyRoute, upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let upstream_headers = upstream.headers().clone();
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(
                prefix = %route.prefix,
                error = %err,
                "proxy: failed to read upstream body"
            );
            return api_error(
                StatusCode::BAD_GATEWAY,
                ErrorCode::BadGateway,
                format!("backend for {} closed the response early", route.prefix),
            );
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    for (name, value) in upstream_headers.iter() {
        if is_hop_by_hop(name) || name == header::CONTENT_LENGTH {
            continue;
        }
        if name == header::LOCATION {
            headers.append(name, rewrite_location(route, value));
            continue;
        }
        headers.append(name, value.clone());
    }
    response
}

/// Maps an absolute redirect into the backend back under the route prefix.
fn rewrite_location(route: &ProxyRoute, value: &HeaderValue) -> HeaderValue {
    let Ok(location) = value.to_str() else {
        return value.clone();
    };
    let Some(rest) = location.strip_prefix(route.target.as_str()) else {
        return value.clone();
    };
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('?')) {
        return value.clone();
    }
    HeaderValue::from_str(&format!("{}{rest}", route.prefix)).unwrap_or_else(|_| value.clone())
}

#[cfg(test)]
#[path = "tests/forward_tests.rs"]
mod tests;

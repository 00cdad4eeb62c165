use super::*;
use crate::test_support::{refused_base_url, spawn_backend, ErrorLogCounter};
use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::protocol::FAILURE_MESSAGE;
use tracing_subscriber::layer::SubscriberExt;

async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let source = headers
        .get("x-request-source")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "body": body, "source": source }))
}

fn backend() -> Router {
    Router::new()
        .route("/items", get(|| async { Json(json!([{"id": 1}])) }))
        .route(
            "/created",
            get(|| async { (StatusCode::CREATED, Json(json!({"id": "new"}))) }),
        )
        .route(
            "/edge-399",
            get(|| async {
                (
                    StatusCode::from_u16(399).expect("status"),
                    Json(json!({"edge": true})),
                )
            }),
        )
        .route(
            "/edge-400",
            get(|| async { (StatusCode::BAD_REQUEST, Json(json!({"detail": "bad"}))) }),
        )
        .route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance window") }),
        )
        .route("/plain", get(|| async { "not json" }))
        .route("/echo", post(echo))
}

#[tokio::test]
async fn success_returns_status_and_body() {
    let base = spawn_backend(backend()).await;
    let executor = HttpExecutor::new(&base).expect("executor");

    let result = executor.execute(&RequestDescriptor::get("/items")).await;

    assert_eq!(result, RequestResult::success(200, json!([{"id": 1}])));
}

#[tokio::test]
async fn non_200_success_status_is_preserved() {
    let base = spawn_backend(backend()).await;
    let executor = HttpExecutor::new(&base).expect("executor");

    let result = executor.execute(&RequestDescriptor::get("/created")).await;

    assert_eq!(result.status, 201);
    assert_eq!(result.data, json!({"id": "new"}));
}

#[tokio::test]
async fn status_399_succeeds_and_400_fails() {
    let base = spawn_backend(backend()).await;
    let executor = HttpExecutor::new(&base).expect("executor");

    let ok = executor.execute(&RequestDescriptor::get("/edge-399")).await;
    assert_eq!(ok.status, 399);
    assert_eq!(ok.data, json!({"edge": true}));

    let failed = executor.execute(&RequestDescriptor::get("/edge-400")).await;
    assert_eq!(failed.status, 400);
    assert_eq!(failed.data, json!(FAILURE_MESSAGE));
}

#[tokio::test]
async fn application_failure_discards_body_and_keeps_status() {
    let base = spawn_backend(backend()).await;
    let executor = HttpExecutor::new(&base).expect("executor");

    let result = executor.execute(&RequestDescriptor::get("/down")).await;

    assert_eq!(result, RequestResult::failure(503));
    assert_eq!(result.message(), FAILURE_MESSAGE);
}

#[tokio::test]
async fn unknown_route_is_an_application_failure() {
    let base = spawn_backend(backend()).await;
    let executor = HttpExecutor::new(&base).expect("executor");

    let result = executor.execute(&RequestDescriptor::get("/missing")).await;

    assert_eq!(result, RequestResult::failure(404));
}

#[tokio::test]
async fn connection_refused_reports_500_and_logs_once() {
    let counter = ErrorLogCounter::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(counter.clone()));
    let base = refused_base_url().await;
    let executor = HttpExecutor::new(&base).expect("executor");

    let result = executor.execute(&RequestDescriptor::get("/items")).await;

    assert_eq!(result, RequestResult::failure(500));
    assert_eq!(counter.count(), 1);
}

#[tokio::test]
async fn application_failure_is_not_logged_as_error() {
    let counter = ErrorLogCounter::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(counter.clone()));
    let base = spawn_backend(backend()).await;
    let executor = HttpExecutor::new(&base).expect("executor");

    let result = executor.execute(&RequestDescriptor::get("/down")).await;

    assert_eq!(result.status, 503);
    assert_eq!(counter.count(), 0);
}

#[tokio::test]
async fn non_json_body_is_returned_as_text() {
    let base = spawn_backend(backend()).await;
    let executor = HttpExecutor::new(&base).expect("executor");

    let result = executor.execute(&RequestDescriptor::get("/plain")).await;

    assert_eq!(result, RequestResult::success(200, json!("not json")));
}

#[tokio::test]
async fn post_forwards_json_body_and_headers() {
    let base = spawn_backend(backend()).await;
    let executor = HttpExecutor::new(&base).expect("executor");
    let descriptor = RequestDescriptor::post("echo")
        .with_json(json!({"schedule": "week-12"}))
        .with_header("x-request-source", "console");

    let result = executor.execute(&descriptor).await;

    assert_eq!(result.status, 200);
    assert_eq!(
        result.data,
        json!({"body": {"schedule": "week-12"}, "source": "console"})
    );
}

#[tokio::test]
async fn invalid_header_name_is_folded_into_transport_failure() {
    let base = spawn_backend(backend()).await;
    let executor = HttpExecutor::new(&base).expect("executor");
    let descriptor = RequestDescriptor::get("/items").with_header("bad header", "x");

    let result = executor.execute(&descriptor).await;

    assert_eq!(result, RequestResult::failure(500));
}

#[test]
fn logical_paths_resolve_root_relative_with_or_without_slash() {
    let executor = HttpExecutor::new("http://localhost:3000/schedules/12").expect("executor");

    let with_slash = executor
        .resolve_url("/api/scheduler/get-pop-schedules")
        .expect("url");
    let without_slash = executor
        .resolve_url("api/scheduler/get-pop-schedules")
        .expect("url");

    assert_eq!(with_slash, without_slash);
    assert_eq!(
        with_slash.as_str(),
        "http://localhost:3000/api/scheduler/get-pop-schedules"
    );
}

#[test]
fn absolute_urls_pass_through() {
    let executor = HttpExecutor::new("http://localhost:3000").expect("executor");

    let url = executor
        .resolve_url("http://sched:4000/get-pop-schedules?limit=2")
        .expect("url");

    assert_eq!(url.as_str(), "http://sched:4000/get-pop-schedules?limit=2");
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = HttpExecutor::new("not a url").expect_err("must fail");
    assert!(matches!(err, TransportError::InvalidUrl { .. }));
}

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use land_registry::workflows::registry::{registry_router, RegistryCatalog, VerificationQueue};
use land_registry::workflows::wizard::TracingNotifier;

fn app() -> Router {
    let catalog = Arc::new(RegistryCatalog::seeded().expect("seed data"));
    let queue = VerificationQueue::new(catalog, Arc::new(TracingNotifier), Duration::ZERO);
    registry_router(Arc::new(queue))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn queue_lists_and_filters_registrations() {
    let app = app();

    let (status, body) = get_json(&app, "/api/v1/verification/queue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registrations"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["counts"]["pending"], 2);
    assert_eq!(body["counts"]["high_priority"], 1);

    let (status, body) = get_json(&app, "/api/v1/verification/queue?status=under_review").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filter"], "under_review");
    assert_eq!(body["registrations"][0]["plot_number"], "KAN-2024-002");
    assert_eq!(body["registrations"][0]["priority"], "high");
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, get(uri)).await
}

#[tokio::test]
async fn approving_twice_conflicts() {
    let app = app();

    let (status, body) = send(
        &app,
        post(
            "/api/v1/verification/queue/1/approve",
            json!({ "officer": "Sarah Johnson" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "verified");
    assert_eq!(body["decided_by"], "Sarah Johnson");

    let (status, body) = send(&app, post("/api/v1/verification/queue/1/reject", json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("already been decided")));

    let (status, body) = get_json(&app, "/api/v1/verification/queue/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "verified");
}

#[tokio::test]
async fn unknown_registration_is_not_found() {
    let app = app();
    let (status, body) = send(&app, post("/api/v1/verification/queue/99/approve", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "registration 99 is not in the verification queue"
    );
}

#[tokio::test]
async fn public_search_masks_the_owner() {
    let app = app();

    let (status, body) = get_json(&app, "/api/v1/verification/search?q=COL-07-2024-001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"]["name"], "John D***");
    assert_eq!(body["owner"]["nic"], "1990*****678");
    assert_eq!(body["land_area"], "10 perches");

    let (status, _) = get_json(&app, "/api/v1/verification/search?q=NOPE-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(&app, "/api/v1/verification/search?q=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overview_reflects_decisions() {
    let app = app();
    send(
        &app,
        post(
            "/api/v1/verification/queue/3/reject",
            json!({ "officer": "Emily Davis", "note": "survey mismatch" }),
        ),
    )
    .await;

    let (status, body) = get_json(&app, "/api/v1/registry/overview").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_properties"], 3);
    assert_eq!(body["rejected_applications"], 1);
    assert_eq!(body["pending_verification"], 2);
    assert_eq!(body["recent_activities"][0]["action"], "Application Rejected");
}

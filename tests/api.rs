//! HTTP-level tests for the task service.
//!
//! These drive the full router (access gate included) against the in-memory
//! store.

#![cfg(feature = "service")]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use taskmaster_service::service::{create_router, ServiceState, MAX_CLAIM_BODY_BYTES};
use taskmaster_service::{
    DeploymentMode, Identity, InMemoryTaskStore, TaskId, TaskStore, TaskUpdate, TokenService,
};

/// Test HMAC secret for API tests
const TEST_SECRET: &[u8] = b"test_secret_for_api_integration_tests";

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn build_app(mode: DeploymentMode) -> (Router, Arc<InMemoryTaskStore>) {
    let store = Arc::new(InMemoryTaskStore::new());
    let state = ServiceState::with_shared_store(
        Arc::clone(&store),
        TokenService::new(TEST_SECRET),
        mode,
    );
    (create_router(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, cookies, body)
}

fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Authenticate and return the `token=...` pair for a Cookie header.
async fn login(app: &Router, email: &str, user_id: &str) -> String {
    let (status, cookies, _) = send(
        app,
        json_request(Method::POST, "/authenticate", None, json!({"email": email, "userId": user_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    cookies[0].split(';').next().unwrap().to_string()
}

async fn seed_task(store: &InMemoryTaskStore, owner: &str, title: &str) -> TaskId {
    let document = json!({"userEmail": owner, "title": title, "category": "work"});
    let Value::Object(map) = document else { unreachable!() };
    store.insert(map).await.unwrap().inserted_id
}

fn update_body(email: &str, user_id: &str, title: &str) -> Value {
    json!({
        "email": email,
        "userId": user_id,
        "blogData": {"title": title}
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_banner() {
    let (app, _) = build_app(DeploymentMode::Development);
    let (status, _, body) = send(&app, get_request("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("TaskMaster Server Running".to_string()));
}

#[tokio::test]
async fn test_authenticate_sets_verifiable_cookie() {
    let (app, _) = build_app(DeploymentMode::Development);
    let (status, cookies, body) = send(
        &app,
        json_request(Method::POST, "/authenticate", None, json!({"email": "a@x.com", "userId": "1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("token="));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("SameSite=Strict"));

    let raw = cookies[0].split(';').next().unwrap().trim_start_matches("token=");
    let identity = TokenService::new(TEST_SECRET)
        .verify(&taskmaster_service::SessionToken::from_string(raw.to_string()))
        .unwrap();
    assert_eq!(identity, Identity::new("a@x.com", "1"));
}

#[tokio::test]
async fn test_authenticate_production_cookie_attributes() {
    let (app, _) = build_app(DeploymentMode::Production);
    let (_, cookies, _) = send(
        &app,
        json_request(Method::POST, "/authenticate", None, json!({"email": "a@x.com", "userId": "1"})),
    )
    .await;

    assert!(cookies[0].contains("Secure"));
    assert!(cookies[0].contains("SameSite=None"));
}

#[tokio::test]
async fn test_authenticate_requires_identity() {
    let (app, _) = build_app(DeploymentMode::Development);
    let (status, cookies, body) = send(
        &app,
        json_request(Method::POST, "/authenticate", None, json!({"email": "a@x.com"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(cookies.is_empty());
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let (app, _) = build_app(DeploymentMode::Development);

    for _ in 0..2 {
        let (status, cookies, body) =
            send(&app, json_request(Method::POST, "/logout", None, json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
        assert!(cookies[0].starts_with("token=;"));
        assert!(cookies[0].contains("Max-Age=0"));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Open task endpoints
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_then_list_by_owner() {
    let (app, store) = build_app(DeploymentMode::Development);

    let (status, _, ack) = send(
        &app,
        json_request(
            Method::POST,
            "/create-task",
            None,
            json!({"userEmail": "a@x.com", "title": "Write report", "_id": "client-chosen"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["acknowledged"], true);
    let inserted_id = ack["insertedId"].as_str().unwrap().to_string();
    assert!(TaskId::parse(&inserted_id).is_ok());

    seed_task(&store, "b@x.com", "Someone else's").await;
    seed_task(&store, "a@x.com", "Second").await;

    let (status, _, tasks) = send(&app, get_request("/allTasks?email=a%40x.com")).await;
    assert_eq!(status, StatusCode::OK);

    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t["userEmail"] == "a@x.com"));
    assert_eq!(tasks[0]["_id"], inserted_id.as_str());
    assert_eq!(tasks[0]["title"], "Write report");
}

#[tokio::test]
async fn test_list_without_email_is_empty() {
    let (app, store) = build_app(DeploymentMode::Development);
    seed_task(&store, "a@x.com", "Task").await;

    let (status, _, tasks) = send(&app, get_request("/allTasks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks, json!([]));
}

// ─────────────────────────────────────────────────────────────────────────────
// Protected update
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_allowed_then_denied_with_same_cookie() {
    let (app, store) = build_app(DeploymentMode::Development);
    let id = seed_task(&store, "a@x.com", "Original").await;
    let cookie = login(&app, "a@x.com", "1").await;
    let uri = format!("/updateBlog/{id}");

    let (status, _, ack) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&cookie), update_body("a@x.com", "1", "Allowed")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matchedCount"], 1);
    assert_eq!(ack["modifiedCount"], 1);
    assert_eq!(ack["upsertedId"], Value::Null);

    let (status, _, body) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&cookie), update_body("b@x.com", "2", "Denied")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "unauthorized"}));

    // Denied request never reached the store
    assert_eq!(store.get(&id).unwrap().document()["title"], "Allowed");
}

#[tokio::test]
async fn test_update_allowed_when_only_one_field_matches() {
    let (app, store) = build_app(DeploymentMode::Development);
    let id = seed_task(&store, "a@x.com", "Original").await;
    let cookie = login(&app, "a@x.com", "1").await;
    let uri = format!("/updateBlog/{id}");

    let (status, _, _) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&cookie), update_body("other@x.com", "1", "By id")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&cookie), update_body("a@x.com", "999", "By email")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.get(&id).unwrap().document()["title"], "By email");
}

#[tokio::test]
async fn test_update_without_claim_is_denied() {
    let (app, store) = build_app(DeploymentMode::Development);
    let id = seed_task(&store, "a@x.com", "Original").await;
    let cookie = login(&app, "a@x.com", "1").await;

    let (status, _, _) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/updateBlog/{id}"),
            Some(&cookie),
            json!({"blogData": {"title": "No claim"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_without_cookie_is_unauthorized() {
    let (app, store) = build_app(DeploymentMode::Development);
    let id = seed_task(&store, "a@x.com", "Original").await;

    let (status, _, body) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/updateBlog/{id}"),
            None,
            update_body("a@x.com", "1", "Nope"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "unauthorized"}));
}

#[tokio::test]
async fn test_update_with_tampered_cookie_is_unauthorized() {
    let (app, store) = build_app(DeploymentMode::Development);
    let id = seed_task(&store, "a@x.com", "Original").await;
    let cookie = login(&app, "a@x.com", "1").await;

    // Flip the first payload character to a different hex digit
    let (name, value) = cookie.split_once('=').unwrap();
    let mut chars: Vec<char> = value.chars().collect();
    chars[0] = if chars[0] == '7' { '6' } else { '7' };
    let tampered = format!("{name}={}", chars.into_iter().collect::<String>());

    let (status, _, _) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/updateBlog/{id}"),
            Some(&tampered),
            update_body("a@x.com", "1", "Forged"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(store.get(&id).unwrap().document()["title"], "Original");
}

#[tokio::test]
async fn test_update_with_expired_token_is_unauthorized() {
    let (app, store) = build_app(DeploymentMode::Development);
    let id = seed_task(&store, "a@x.com", "Original").await;

    let stale = TokenService::new(TEST_SECRET)
        .issue_at(&Identity::new("a@x.com", "1"), Utc::now() - Duration::hours(25));
    let cookie = format!("token={stale}");

    let (status, _, _) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/updateBlog/{id}"),
            Some(&cookie),
            update_body("a@x.com", "1", "Late"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_unknown_id_matches_nothing() {
    let (app, store) = build_app(DeploymentMode::Development);
    seed_task(&store, "a@x.com", "Original").await;
    let cookie = login(&app, "a@x.com", "1").await;

    let (status, _, ack) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/updateBlog/{}", TaskId::generate()),
            Some(&cookie),
            update_body("a@x.com", "1", "Ghost"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matchedCount"], 0);
    assert_eq!(ack["upsertedCount"], 0);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_update_of_another_users_record_matches_nothing() {
    let (app, store) = build_app(DeploymentMode::Development);
    let id = seed_task(&store, "b@x.com", "Owned by B").await;
    let cookie = login(&app, "a@x.com", "1").await;

    // The claim passes the gate for A, but the record belongs to B
    let (status, _, ack) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/updateBlog/{id}"),
            Some(&cookie),
            update_body("a@x.com", "1", "Hijacked"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matchedCount"], 0);
    assert_eq!(ack["modifiedCount"], 0);

    let record = store.get(&id).unwrap();
    assert_eq!(record.document()["title"], "Owned by B");
    assert_eq!(record.owner(), Some("b@x.com"));
}

#[tokio::test]
async fn test_update_with_oversized_body_is_payload_too_large() {
    let (app, store) = build_app(DeploymentMode::Development);
    let id = seed_task(&store, "a@x.com", "Original").await;
    let cookie = login(&app, "a@x.com", "1").await;

    let body = json!({
        "email": "a@x.com",
        "userId": "1",
        "blogData": {"longDescription": "x".repeat(MAX_CLAIM_BODY_BYTES + 1)}
    });
    let (status, _, body) = send(
        &app,
        json_request(Method::PUT, &format!("/updateBlog/{id}"), Some(&cookie), body),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(store.get(&id).unwrap().document()["title"], "Original");
}

#[tokio::test]
async fn test_update_malformed_id_is_bad_request() {
    let (app, _) = build_app(DeploymentMode::Development);
    let cookie = login(&app, "a@x.com", "1").await;

    let (status, _, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/updateBlog/not-a-task-id",
            Some(&cookie),
            update_body("a@x.com", "1", "Whatever"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TASK_ID");
}

#[tokio::test]
async fn test_update_keeps_unlisted_fields() {
    let (app, store) = build_app(DeploymentMode::Development);
    let id = seed_task(&store, "a@x.com", "Original").await;
    let cookie = login(&app, "a@x.com", "1").await;

    let body = json!({
        "email": "a@x.com",
        "userId": "1",
        "blogData": {"shortDescription": "short", "userEmail": "thief@x.com"}
    });
    let (status, _, _) = send(
        &app,
        json_request(Method::PUT, &format!("/updateBlog/{id}"), Some(&cookie), body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let record = store.get(&id).unwrap();
    assert_eq!(record.document()["shortDescription"], "short");
    assert_eq!(record.document()["title"], "Original");
    assert_eq!(record.document()["category"], "work");
    // Owner is not a replaceable field
    assert_eq!(record.owner(), Some("a@x.com"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_probes() {
    let (app, _) = build_app(DeploymentMode::Development);

    let (status, _, body) = send(&app, get_request("/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, _, body) = send(&app, get_request("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_store_update_directly_matches_http_semantics() {
    let store = InMemoryTaskStore::new();
    let id = seed_task(&store, "a@x.com", "Original").await;
    let update = TaskUpdate {
        title: Some("Original".to_string()),
        ..Default::default()
    };

    let ack = store.update_fields(&id, "a@x.com", &update).await.unwrap();
    assert_eq!((ack.matched_count, ack.modified_count), (1, 0));

    let foreign = store.update_fields(&id, "b@x.com", &update).await.unwrap();
    assert_eq!((foreign.matched_count, foreign.modified_count), (0, 0));
}

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use telegate::models::TokenPair;
use telegate::services::{CookieJarStore, LoginFlow, LoginLocks, OAuthClient, SessionStore, TokenStore};
use telegate::{AppState, Configuration};

/// How the mock vehicle backend resolves a command.
#[derive(Clone, Copy)]
enum Resolution {
    /// The initial POST already carries the terminal payload.
    Immediate,
    /// The status URL reports success on the nth poll.
    CompleteAfter(usize),
    /// The status URL never leaves inProgress.
    Never,
    /// The initial POST answers 500.
    Reject,
    /// The status URL answers 500 for the first n polls, then success.
    FailPolls(usize),
    /// The status URL points at a port nothing listens on.
    Unreachable,
}

#[derive(Clone)]
struct MockApi {
    base: String,
    resolution: Resolution,
    exchange_hits: Arc<AtomicUsize>,
    poll_hits: Arc<AtomicUsize>,
}

async fn exchange_token(State(api): State<MockApi>) -> Json<Value> {
    api.exchange_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"access_token": "api-at", "expires_in": 1800}))
}

async fn submit_command(State(api): State<MockApi>) -> (StatusCode, Json<Value>) {
    match api.resolution {
        Resolution::Immediate => (
            StatusCode::OK,
            Json(json!({
                "commandResponse": {"status": "success", "type": "lockDoor"}
            })),
        ),
        Resolution::Reject => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "backend unavailable"})),
        ),
        Resolution::Unreachable => (
            StatusCode::OK,
            Json(json!({
                "commandResponse": {
                    "status": "inProgress",
                    "url": "http://127.0.0.1:9/poll/status",
                }
            })),
        ),
        _ => (
            StatusCode::OK,
            Json(json!({
                "commandResponse": {
                    "status": "inProgress",
                    "url": format!("{}/poll/status", api.base),
                }
            })),
        ),
    }
}

async fn poll_status(State(api): State<MockApi>) -> (StatusCode, Json<Value>) {
    let polls = api.poll_hits.fetch_add(1, Ordering::SeqCst) + 1;
    if matches!(api.resolution, Resolution::FailPolls(n) if polls <= n) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "status backend flaked"})),
        );
    }
    let done = matches!(api.resolution, Resolution::CompleteAfter(n) if polls >= n)
        || matches!(api.resolution, Resolution::FailPolls(_));
    let status = if done { "success" } else { "inProgress" };
    (
        StatusCode::OK,
        Json(json!({
            "commandResponse": {
                "status": status,
                "url": format!("{}/poll/status", api.base),
            }
        })),
    )
}

async fn list_vehicles() -> Json<Value> {
    Json(json!({"vehicles": {"size": 1, "vehicle": [{"vin": "1G1FZ6S03L4100001"}]}}))
}

async fn spawn_api(resolution: Resolution) -> MockApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let api = MockApi {
        base,
        resolution,
        exchange_hits: Arc::new(AtomicUsize::new(0)),
        poll_hits: Arc::new(AtomicUsize::new(0)),
    };
    let router = Router::new()
        .route("/sec/authz/v3/oauth/token", post(exchange_token))
        .route("/api/v1/account/vehicles", post(list_vehicles))
        .route(
            "/api/v1/account/vehicles/{vin}/commands/{command}",
            post(submit_command),
        )
        .route("/poll/status", get(poll_status))
        .with_state(api.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    api
}

fn build_state(api_base: &str, data_dir: &Path, dispatch: (u32, u64)) -> AppState {
    let mut configuration = Configuration::default();
    configuration.vehicle_api.base_url = api_base.to_string();
    configuration.storage.data_dir = data_dir.to_path_buf();
    configuration.dispatch.max_attempts = dispatch.0;
    configuration.dispatch.poll_interval_seconds = dispatch.1;

    let configuration = Arc::new(configuration);
    let oauth = Arc::new(OAuthClient::new(&configuration.provider).unwrap());
    let session_store = Arc::new(SessionStore::new(configuration.storage.sessions_dir()).unwrap());
    let token_store = Arc::new(
        TokenStore::new(configuration.storage.tokens_dir(), oauth.clone()).unwrap(),
    );
    let cookie_store = Arc::new(CookieJarStore::new(configuration.storage.cookies_dir()).unwrap());
    let login_flow = Arc::new(LoginFlow::new(
        configuration.clone(),
        oauth,
        session_store.clone(),
        token_store.clone(),
        cookie_store.clone(),
    ));
    AppState {
        configuration,
        session_store,
        token_store,
        cookie_store,
        login_flow,
        login_locks: Arc::new(LoginLocks::new()),
    }
}

async fn spawn_bridge(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = telegate::app(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn seed_tokens(state: &AppState, identity: &str) {
    let pair = TokenPair {
        access_token: "first-stage-at".to_string(),
        refresh_token: Some("rt-1".to_string()),
        id_token: None,
        expires_at: Utc::now() + Duration::hours(1),
    };
    state.token_store.save(identity, &pair).unwrap();
}

fn command_request() -> Value {
    json!({
        "email": "driver@example.com",
        "vin": "1G1FZ6S03L4100001",
        "uuid": "6f0a7f5e-90df-4d3c-9a1b-2f8e14c3d001",
    })
}

#[tokio::test]
async fn terminal_command_returns_without_polling() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::Immediate).await;
    let state = build_state(&api.base, dir.path(), (3, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/lockDoor"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["response"]["commandResponse"]["status"], json!("success"));
    assert_eq!(api.poll_hits.load(Ordering::SeqCst), 0);
    assert_eq!(api.exchange_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn async_command_polls_until_complete() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::CompleteAfter(2)).await;
    let state = build_state(&api.base, dir.path(), (5, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/start"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["response"]["commandResponse"]["status"], json!("success"));
    assert_eq!(api.poll_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stuck_command_times_out_after_attempt_budget() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::Never).await;
    let state = build_state(&api.base, dir.path(), (3, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/unlockDoor"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 408);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    // The budget is consumed exactly, then the engine gives up.
    assert_eq!(api.poll_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn rejected_submit_is_fatal_not_a_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::Reject).await;
    let state = build_state(&api.base, dir.path(), (3, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/lockDoor"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("rejected"));
    // A rejected submit never enters the poll loop.
    assert_eq!(api.poll_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_polls_consume_attempts_then_complete() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::FailPolls(2)).await;
    let state = build_state(&api.base, dir.path(), (5, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/start"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["response"]["commandResponse"]["status"], json!("success"));
    // Two 500s plus the successful poll.
    assert_eq!(api.poll_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failed_polls_count_against_the_budget() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::FailPolls(5)).await;
    let state = build_state(&api.base, dir.path(), (2, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/unlockDoor"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 408);
    assert_eq!(api.poll_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreachable_status_url_still_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::Unreachable).await;
    let state = build_state(&api.base, dir.path(), (2, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/alert"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    // Connection errors on the status URL consume attempts like any
    // other failed poll; the outcome is still a timeout.
    assert_eq!(resp.status(), 408);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(api.poll_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn polls_are_spaced_by_the_configured_interval() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::Never).await;
    let state = build_state(&api.base, dir.path(), (2, 1));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let started = tokio::time::Instant::now();
    let resp = reqwest::Client::new()
        .post(format!("{bridge}/alert"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 408);
    assert!(started.elapsed() >= std::time::Duration::from_secs(2));
}

#[tokio::test]
async fn unknown_command_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::Immediate).await;
    let state = build_state(&api.base, dir.path(), (3, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/selfDestruct"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Unknown command"));
    // Rejected before any token exchange happens.
    assert_eq!(api.exchange_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_device_uuid_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::Immediate).await;
    let state = build_state(&api.base, dir.path(), (3, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let mut req = command_request();
    req["uuid"] = json!("not-a-uuid");
    let resp = reqwest::Client::new()
        .post(format!("{bridge}/lockDoor"))
        .json(&req)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("UUID"));
}

#[tokio::test]
async fn command_without_stored_tokens_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::Immediate).await;
    let state = build_state(&api.base, dir.path(), (3, 0));
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/lockDoor"))
        .json(&command_request())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Authenticate first"));
}

#[tokio::test]
async fn vehicle_listing_round_trips_the_account_payload() {
    let dir = tempfile::tempdir().unwrap();
    let api = spawn_api(Resolution::Immediate).await;
    let state = build_state(&api.base, dir.path(), (3, 0));
    seed_tokens(&state, "driver@example.com");
    let bridge = spawn_bridge(state).await;

    let resp = reqwest::Client::new()
        .post(format!("{bridge}/vehicles"))
        .json(&json!({
            "email": "driver@example.com",
            "uuid": "6f0a7f5e-90df-4d3c-9a1b-2f8e14c3d001",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(
        body["response"]["vehicles"]["vehicle"][0]["vin"],
        json!("1G1FZ6S03L4100001")
    );
}

//! API integration tests.
//!
//! Drive the full router (auth middleware included) against a mock
//! database connection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
};
use afisha_api::{AppState, auth_middleware, router as api_router};
use afisha_common::JwtService;
use afisha_core::{EventService, PollService, StatsService, UserService};
use afisha_db::{
    entities::{event, user},
    repositories::{
        EventRepository, PollRepository, ReminderRepository, SavedEventRepository, UserRepository,
        VoteRepository,
    },
};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use sha2::Sha256;
use std::sync::Arc;
use tower::ServiceExt;

const BOT_TOKEN: &str = "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11";
const JWT_SECRET: &str = "test-secret-key-that-is-long-enough";

/// Build app state over the given mock connection.
fn test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);

    let user_repo = UserRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));
    let saved_repo = SavedEventRepository::new(Arc::clone(&db));
    let reminder_repo = ReminderRepository::new(Arc::clone(&db));
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));

    let jwt = JwtService::new(JWT_SECRET, 900);
    AppState {
        user_service: UserService::new(user_repo.clone(), jwt, vec![]),
        event_service: EventService::new(
            event_repo.clone(),
            saved_repo,
            reminder_repo,
            Duration::minutes(60),
        ),
        poll_service: PollService::new(poll_repo.clone(), vote_repo.clone()),
        stats_service: StatsService::new(user_repo, event_repo, poll_repo, vote_repo),
        bot_token: BOT_TOKEN.to_string(),
    }
}

/// Router with the auth middleware applied, as in production.
fn test_router(db: DatabaseConnection) -> Router {
    let state = test_state(db);
    api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn test_user(is_admin: bool) -> user::Model {
    let now = Utc::now();
    user::Model {
        id: 1,
        telegram_id: 42,
        username: Some("tester".to_string()),
        is_admin,
        created_at: now.into(),
        last_active_at: now.into(),
    }
}

fn test_event() -> event::Model {
    let now = Utc::now();
    event::Model {
        id: 1,
        title: "Community meetup".to_string(),
        description: None,
        starts_at: (now + Duration::days(7)).into(),
        ends_at: None,
        location: Some("Tech park".to_string()),
        category: "meetup".to_string(),
        max_participants: None,
        created_by: None,
        created_at: now.into(),
    }
}

/// Sign an initData string the way Telegram does.
fn signed_init_data(telegram_id: i64) -> String {
    type HmacSha256 = Hmac<Sha256>;

    fn sign(key: &[u8], message: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(key).unwrap();
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }

    let auth_date = Utc::now().timestamp().to_string();
    let user_json = format!(r#"{{"id":{telegram_id},"first_name":"Test","username":"tester"}}"#);
    let mut pairs = vec![
        ("auth_date", auth_date.as_str()),
        ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"),
        ("user", user_json.as_str()),
    ];
    pairs.sort_by_key(|(k, _)| *k);

    let check_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");
    let secret = sign(BOT_TOKEN.as_bytes(), b"WebAppData");
    let hash = hex::encode(sign(&secret, check_string.as_bytes()));

    let mut encoded: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect();
    encoded.push(format!("hash={hash}"));
    encoded.join("&")
}

#[tokio::test]
async fn events_listing_is_public() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![test_event()]])
        .into_connection();

    let response = test_router(db)
        .oneshot(
            Request::builder()
                .uri("/events?type=upcoming")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_event_is_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<event::Model>::new()])
        .into_connection();

    let response = test_router(db)
        .oneshot(
            Request::builder()
                .uri("/events/99")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn vote_requires_auth() {
    let response = test_router(empty_db())
        .oneshot(
            Request::builder()
                .uri("/polls/1/vote")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"optionIndex":0}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn event_creation_requires_auth() {
    let response = test_router(empty_db())
        .oneshot(
            Request::builder()
                .uri("/events")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"title":"x","startsAt":"2026-09-01T18:00:00Z"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stats_rejects_non_admins() {
    // Middleware resolves the token to a regular user, then the admin
    // guard turns them away.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![test_user(false)]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let state_jwt = JwtService::new(JWT_SECRET, 900);
    let token = state_jwt.issue(42).unwrap();

    let response = test_router(db)
        .oneshot(
            Request::builder()
                .uri("/stats")
                .method("GET")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stats_rejects_missing_token() {
    let response = test_router(empty_db())
        .oneshot(
            Request::builder()
                .uri("/stats")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_init_without_init_data_is_bad_request() {
    let response = test_router(empty_db())
        .oneshot(
            Request::builder()
                .uri("/auth/init")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn auth_init_with_bad_signature_is_unauthorized() {
    let response = test_router(empty_db())
        .oneshot(
            Request::builder()
                .uri("/auth/init")
                .method("POST")
                .header("X-Telegram-Init-Data", "auth_date=1700000000&hash=deadbeef")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_init_with_valid_signature_creates_user() {
    // Lookup misses, insert returns the fresh row.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new(), vec![test_user(false)]])
        .into_connection();

    let init_data = signed_init_data(42);
    let body = serde_json::json!({ "initData": init_data }).to_string();

    let response = test_router(db)
        .oneshot(
            Request::builder()
                .uri("/auth/init")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["userId"], 42);
    assert!(json["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn unknown_endpoint_returns_404() {
    let response = test_router(empty_db())
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

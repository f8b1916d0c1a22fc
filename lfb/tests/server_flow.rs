//! Drives the router end to end: guard, login cookie, and role handlers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use lfb::prelude::*;
use lfb::server::{router, AppState, SESSION_COOKIE};
use tower::ServiceExt;

async fn state_with(settings: Settings) -> AppState {
    let store = InMemoryStore::new();
    lfb::account::create_user(&store, "alice", "pw", "admin")
        .await
        .unwrap()
        .unwrap();
    AppState::new(Arc::new(store), settings).unwrap()
}

async fn app() -> Router {
    router(state_with(Settings::default()).await)
}

async fn post(
    app: &Router,
    path: &str,
    body: &str,
    cookie: Option<&str>,
) -> (Option<String>, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (set_cookie, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_anonymous_requests_are_rejected() {
    let app = app().await;
    let (cookie, body) = post(&app, "/role/list", "", None).await;
    assert!(cookie.is_none());
    assert_eq!(body["status"], "10007");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_then_manage_roles() {
    let app = app().await;

    let (cookie, body) = post(&app, "/login", "username=alice&password=bad", None).await;
    assert_eq!(body["status"], "10003");
    assert!(cookie.is_none());

    let (cookie, body) = post(&app, "/login", "username=alice&password=pw", None).await;
    assert_eq!(body["status"], "00000");
    let cookie = cookie.unwrap();
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));

    let (_, body) = post(&app, "/role/create", "roleName=ops", Some(&cookie)).await;
    assert_eq!(body["status"], "00000");
    assert_eq!(body["data"]["operator"], "alice");

    let (_, body) = post(&app, "/role/create", "roleName=ops", Some(&cookie)).await;
    assert_eq!(body["status"], "10005");

    let (_, body) = post(&app, "/role/list", "search=op", Some(&cookie)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = post(&app, "/detail/user", "", Some(&cookie)).await;
    assert_eq!(body["data"]["username"], "alice");

    let (_, body) = post(&app, "/logout", "", Some(&cookie)).await;
    assert_eq!(body["success"], true);

    let (_, body) = post(&app, "/role/list", "", Some(&cookie)).await;
    assert_eq!(body["status"], "10007");
}

#[tokio::test]
async fn test_expired_sessions_are_dropped() {
    let mut settings = Settings::default();
    settings.session.login_expiry_secs = 1;
    let state = state_with(settings).await;
    let app = router(state.clone());

    let (cookie, body) = post(&app, "/login", "username=alice&password=pw", None).await;
    assert_eq!(body["status"], "00000");
    let cookie = cookie.unwrap();
    assert_eq!(state.session_count().await, 1);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let (_, body) = post(&app, "/role/list", "", Some(&cookie)).await;
    assert_eq!(body["status"], "10007");
    assert_eq!(state.session_count().await, 0);
}

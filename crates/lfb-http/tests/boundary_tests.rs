//! Request-to-envelope flow across the HTTP boundary types.

use axum::response::IntoResponse;
use lfb_core::settings_loader;
use lfb_http::{ApiResponse, ApiStatus, LoginRequired, QueryDict, Session};

#[test]
fn test_guard_from_loaded_settings() {
    let settings = settings_loader::from_toml_str(
        r#"
        login_exempt_urls = ["^login", "^health$"]

        [session]
        request_expiry_secs = 60
        "#,
    )
    .unwrap();
    let guard = LoginRequired::from_settings(&settings).unwrap();
    assert!(guard.is_exempt("/health"));
    assert!(!guard.is_exempt("/healthz"));
    assert!(!guard.is_exempt("/logout"));
}

#[test]
fn test_login_then_guarded_request() {
    let guard = LoginRequired::new(&["^login"], 3600).unwrap();
    let mut session = Session::new(0);

    let login_args = QueryDict::parse("username=alice&password=secret");
    let anonymous = session.is_authenticated();
    assert!(guard.process("/login/", &mut session, anonymous).is_ok());
    session.login(login_args.get("username").unwrap(), 1200);

    let authenticated = session.is_authenticated();
    assert!(guard.process("/roles/", &mut session, authenticated).is_ok());
    assert_eq!(session.username(), Some("alice"));
}

#[tokio::test]
async fn test_rejection_is_a_json_envelope() {
    let guard = LoginRequired::new(&["^login"], 3600).unwrap();
    let mut session = Session::new(0);
    let rejection = guard.process("/roles/", &mut session, false).unwrap_err();
    assert_eq!(rejection, ApiResponse::fail(ApiStatus::LoginRequired));

    let response = rejection.into_response();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "success": false,
            "status": "10007",
            "msg": "login required",
            "data": null,
        })
    );
}

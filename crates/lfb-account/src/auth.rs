//! Login, logout, and the current user's detail.

use chrono::Utc;
use lfb_core::settings::Settings;
use lfb_core::{LfbError, LfbResult};
use lfb_db::{Model, Projection, Q, Record, RecordStore, Value};
use lfb_forms::{ArgSpec, ArgsValidator, ExpectedType};
use lfb_http::{ApiResponse, ApiStatus, QueryDict, Session};

use crate::hashers::{check_password, make_password};
use crate::models::{User, LAST_LOGIN, OPERATOR, PASSWORD, USERNAME};
use crate::respond;

/// Creates a user with a hashed password.
///
/// Returns `None` if the username is taken.
///
/// # Errors
///
/// Returns an error if hashing or the store fails.
pub async fn create_user(
    store: &dyn RecordStore,
    username: &str,
    password: &str,
    operator: &str,
) -> LfbResult<Option<Record>> {
    let hash = make_password(password).await?;
    let fields = Record::new()
        .with(USERNAME, username)
        .with(PASSWORD, hash)
        .with(OPERATOR, operator);
    User::objects(store)
        .create_with_field_check(Q::exact(USERNAME, username), fields)
        .await
}

/// Authenticates `username`/`password` and logs the session in.
///
/// - no arguments: `10001`
/// - a missing or blank argument: `10002` with the validation message
/// - unknown user or wrong password: `10003`
///
/// On success the session expires `session.login_expiry_secs` from now and
/// the user's `last_login` is stamped.
pub async fn login(
    store: &dyn RecordStore,
    args: &QueryDict,
    session: &mut Session,
    settings: &Settings,
) -> ApiResponse {
    respond(try_login(store, args, session, settings).await)
}

async fn try_login(
    store: &dyn RecordStore,
    args: &QueryDict,
    session: &mut Session,
    settings: &Settings,
) -> LfbResult<ApiResponse> {
    if args.is_empty() {
        return Ok(ApiResponse::fail(ApiStatus::MissingParameter));
    }
    let mut validator = ArgsValidator::new(args);
    let username = validator.validate(
        &ArgSpec::new(USERNAME)
            .expect(ExpectedType::String)
            .required(),
    );
    let password = validator.validate(
        &ArgSpec::new(PASSWORD)
            .expect(ExpectedType::String)
            .required(),
    );
    validator.check().map_err(LfbError::from)?;
    let (Some(Value::String(username)), Some(Value::String(password))) = (username, password)
    else {
        return Ok(ApiResponse::fail(ApiStatus::MissingParameter));
    };

    let users = User::objects(store);
    let Some(user) = users.filter(Q::exact(USERNAME, username.as_str())).first().await? else {
        tracing::warn!(username = %username, "login failed: unknown user");
        return Ok(ApiResponse::fail(ApiStatus::WrongCredentials));
    };
    let hash = user.get(PASSWORD).and_then(Value::as_str).unwrap_or_default();
    if !check_password(&password, hash).await? {
        tracing::warn!(username = %username, "login failed: wrong password");
        return Ok(ApiResponse::fail(ApiStatus::WrongCredentials));
    }

    session.login(&username, settings.session.login_expiry_secs);
    if let Some(id) = user.id() {
        let stamp = Record::new().with(LAST_LOGIN, Value::DateTime(Utc::now().naive_utc()));
        users.update_by_id(id, stamp).await?;
    }
    tracing::info!(username = %username, "user logged in");
    Ok(ApiResponse::empty())
}

/// Clears the session.
pub fn logout(session: &mut Session) -> ApiResponse {
    if let Some(username) = session.username() {
        tracing::info!(username, "user logged out");
    }
    session.logout();
    ApiResponse::empty()
}

/// The logged-in user's display fields, or `10006` if the user is gone.
pub async fn user_detail(store: &dyn RecordStore, username: &str) -> ApiResponse {
    respond(try_user_detail(store, username).await)
}

async fn try_user_detail(store: &dyn RecordStore, username: &str) -> LfbResult<ApiResponse> {
    let user = User::objects(store)
        .get_by_field(Q::exact(USERNAME, username), &Projection::default())
        .await?;
    if user.is_empty() {
        return Ok(ApiResponse::fail(ApiStatus::NotFound));
    }
    Ok(ApiResponse::ok(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lfb_db::InMemoryStore;

    #[tokio::test]
    async fn test_create_user_rejects_duplicates() {
        let store = InMemoryStore::new();
        let first = create_user(&store, "alice", "pw", "admin").await.unwrap();
        assert!(first.is_some());
        assert!(create_user(&store, "alice", "other", "admin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_empty_args() {
        let store = InMemoryStore::new();
        let mut session = Session::new(0);
        let resp = login(&store, &QueryDict::new(), &mut session, &Settings::default()).await;
        assert_eq!(resp.status, ApiStatus::MissingParameter);
    }

    #[tokio::test]
    async fn test_login_blank_password() {
        let store = InMemoryStore::new();
        let mut session = Session::new(0);
        let args = QueryDict::parse("username=alice&password=");
        let resp = login(&store, &args, &mut session, &Settings::default()).await;
        assert_eq!(resp.status, ApiStatus::InvalidParameter);
        assert_eq!(resp.msg, "password missing.");
    }

    #[tokio::test]
    async fn test_user_detail_hides_password() {
        let store = InMemoryStore::new();
        create_user(&store, "alice", "pw", "admin").await.unwrap();
        let resp = user_detail(&store, "alice").await;
        assert!(resp.success);
        assert_eq!(resp.data["username"], "alice");
        assert!(resp.data.get("password").is_none());

        let resp = user_detail(&store, "ghost").await;
        assert_eq!(resp.status, ApiStatus::NotFound);
    }
}

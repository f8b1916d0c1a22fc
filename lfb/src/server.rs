//! HTTP wiring for the account handlers.
//!
//! Every endpoint takes `POST` arguments either as a form body or as a JSON
//! object, falling back to the query string when the body is empty. Requests
//! pass the login guard first; sessions are kept in memory and identified by
//! the [`SESSION_COOKIE`] cookie.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, MethodRouter};
use axum::Router;
use lfb_core::logging::request_span;
use lfb_core::{LfbResult, Settings};
use lfb_db::RecordStore;
use lfb_http::{ApiResponse, LoginRequired, QueryDict, Session};
use tokio::sync::RwLock;
use tracing::Instrument;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sessionid";

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    guard: Arc<LoginRequired>,
    settings: Arc<Settings>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("guard", &self.guard)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// One request's session, loaded before the handler runs.
struct Exchange {
    id: String,
    session: Session,
    fresh: bool,
}

impl AppState {
    /// Builds the state; the login guard comes from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if a login exempt pattern is not a valid regex.
    pub fn new(store: Arc<dyn RecordStore>, settings: Settings) -> LfbResult<Self> {
        let guard = LoginRequired::from_settings(&settings)?;
        Ok(Self {
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            guard: Arc::new(guard),
            settings: Arc::new(settings),
        })
    }

    /// The record store.
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    async fn begin(&self, path: &str, headers: &HeaderMap) -> Result<Exchange, ApiResponse> {
        let known = match session_id(headers) {
            Some(id) => self.live_session(id).await,
            None => None,
        };
        let mut exchange = match known {
            Some((id, session)) => Exchange {
                id,
                session,
                fresh: false,
            },
            None => Exchange {
                id: uuid::Uuid::new_v4().simple().to_string(),
                session: Session::new(self.settings.session.request_expiry_secs),
                fresh: true,
            },
        };
        let authenticated = exchange.session.is_authenticated();
        self.guard
            .process(path, &mut exchange.session, authenticated)?;
        Ok(exchange)
    }

    /// Number of sessions currently held.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Looks up the cookie's session, dropping it if it has expired.
    async fn live_session(&self, id: String) -> Option<(String, Session)> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get(&id)?.clone();
        if session.is_expired() {
            sessions.remove(&id);
            tracing::debug!(session = %id, "expired session dropped");
            return None;
        }
        Some((id, session))
    }

    async fn finish(&self, exchange: Exchange, response: ApiResponse) -> Response {
        let Exchange { id, session, fresh } = exchange;
        let authenticated = session.is_authenticated();
        {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|_, s| !s.is_expired());
            if authenticated {
                sessions.insert(id.clone(), session);
            } else {
                sessions.remove(&id);
            }
        }
        let mut http = response.into_response();
        if fresh && authenticated {
            let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly");
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                http.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
        http
    }
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Request arguments from a form or JSON body, or the query string.
fn request_args(headers: &HeaderMap, query: Option<&str>, body: &str) -> QueryDict {
    if body.trim().is_empty() {
        return QueryDict::parse(query.unwrap_or_default());
    }
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => QueryDict::from_json(&value),
            Err(e) => {
                tracing::warn!(error = %e, "malformed JSON body");
                QueryDict::new()
            }
        }
    } else {
        QueryDict::parse(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Login,
    Logout,
    UserDetail,
    RoleCreate,
    RoleUpdate,
    RoleDelete,
    RoleList,
}

impl Endpoint {
    const ALL: [Self; 7] = [
        Self::Login,
        Self::Logout,
        Self::UserDetail,
        Self::RoleCreate,
        Self::RoleUpdate,
        Self::RoleDelete,
        Self::RoleList,
    ];

    const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Logout => "/logout",
            Self::UserDetail => "/detail/user",
            Self::RoleCreate => "/role/create",
            Self::RoleUpdate => "/role/update",
            Self::RoleDelete => "/role/delete",
            Self::RoleList => "/role/list",
        }
    }
}

async fn handle(
    endpoint: Endpoint,
    state: AppState,
    headers: HeaderMap,
    query: Option<String>,
    body: String,
) -> Response {
    let mut exchange = match state.begin(endpoint.path(), &headers).await {
        Ok(exchange) => exchange,
        Err(denied) => return denied.into_response(),
    };
    let args = request_args(&headers, query.as_deref(), &body);
    let username = exchange.session.username().unwrap_or_default().to_string();
    let store = state.store();

    let response = match endpoint {
        Endpoint::Login => {
            lfb_account::login(store, &args, &mut exchange.session, &state.settings).await
        }
        Endpoint::Logout => lfb_account::logout(&mut exchange.session),
        Endpoint::UserDetail => lfb_account::user_detail(store, &username).await,
        Endpoint::RoleCreate => lfb_account::role_create(store, &args, &username).await,
        Endpoint::RoleUpdate => lfb_account::role_update(store, &args, &username).await,
        Endpoint::RoleDelete => lfb_account::role_delete(store, &args, &username).await,
        Endpoint::RoleList => lfb_account::role_list(store, &args).await,
    };
    tracing::debug!(path = endpoint.path(), status = %response.status, "request handled");
    state.finish(exchange, response).await
}

fn route(endpoint: Endpoint) -> MethodRouter<AppState> {
    post(
        move |State(state): State<AppState>,
              headers: HeaderMap,
              RawQuery(query): RawQuery,
              body: String| {
            let span = request_span(&uuid::Uuid::new_v4().to_string());
            handle(endpoint, state, headers, query, body).instrument(span)
        },
    )
}

/// The application router.
pub fn router(state: AppState) -> Router {
    Endpoint::ALL
        .into_iter()
        .fold(Router::new(), |app, endpoint| {
            app.route(endpoint.path(), route(endpoint))
        })
        .with_state(state)
}

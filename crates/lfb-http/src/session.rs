//! Sessions and the login-required guard.
//!
//! A [`Session`] expires at a fixed absolute time. Logging in sets it
//! `login_expiry_secs` ahead; every authenticated request passing through
//! [`LoginRequired`] pushes it `request_expiry_secs` ahead again.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use lfb_core::settings::Settings;
use lfb_core::{LfbError, LfbResult};
use regex::Regex;

use crate::response::{ApiResponse, ApiStatus};

/// Session key holding the logged-in username.
pub const USERNAME_KEY: &str = "username";

/// Data associated with a user session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The session data stored as a map of string keys to JSON values.
    pub data: HashMap<String, serde_json::Value>,
    /// The timestamp when this session expires.
    pub expire_date: DateTime<Utc>,
}

impl Session {
    /// Creates an empty session expiring `lifetime_secs` from now.
    pub fn new(lifetime_secs: u64) -> Self {
        let mut session = Self {
            data: HashMap::new(),
            expire_date: Utc::now(),
        };
        session.set_expiry(lifetime_secs);
        session
    }

    /// Sets the expiry to `secs` seconds from now.
    pub fn set_expiry(&mut self, secs: u64) {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        self.expire_date = Utc::now()
            .checked_add_signed(Duration::try_seconds(secs).unwrap_or(Duration::MAX))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    /// Returns `true` if the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expire_date
    }

    /// Gets a value from the session by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Sets a value in the session.
    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        self.data.insert(key.to_string(), value);
    }

    /// Records a login for `username` and sets the login expiry.
    pub fn login(&mut self, username: &str, expiry_secs: u64) {
        self.set(USERNAME_KEY, serde_json::Value::String(username.to_string()));
        self.set_expiry(expiry_secs);
    }

    /// Clears the session.
    pub fn logout(&mut self) {
        self.data.clear();
    }

    /// The logged-in username, if the session is live.
    pub fn username(&self) -> Option<&str> {
        if self.is_expired() {
            return None;
        }
        self.get(USERNAME_KEY).and_then(serde_json::Value::as_str)
    }

    /// Returns `true` if a user is logged in and the session is live.
    pub fn is_authenticated(&self) -> bool {
        self.username().is_some()
    }
}

/// Guard that rejects unauthenticated requests unless the path is exempt.
///
/// Exempt patterns are regular expressions matched at the start of the path
/// with its leading `/` removed, so `^login` and `login` both exempt
/// `/login/`.
///
/// # Examples
///
/// ```
/// use lfb_http::{LoginRequired, Session};
///
/// let guard = LoginRequired::new(&["^login"], 3600).unwrap();
/// let mut session = Session::new(0);
///
/// assert!(guard.process("/login/", &mut session, false).is_ok());
/// let denied = guard.process("/roles/", &mut session, false).unwrap_err();
/// assert_eq!(denied.status.code(), "10007");
/// ```
#[derive(Debug, Clone)]
pub struct LoginRequired {
    exempt: Vec<Regex>,
    request_expiry_secs: u64,
}

impl LoginRequired {
    /// Compiles the exempt patterns.
    ///
    /// # Errors
    ///
    /// Returns [`LfbError::Configuration`] if a pattern is not a valid regex.
    pub fn new<S: AsRef<str>>(exempt_urls: &[S], request_expiry_secs: u64) -> LfbResult<Self> {
        let exempt = exempt_urls
            .iter()
            .map(|expr| {
                let expr = expr.as_ref();
                Regex::new(&format!("^(?:{expr})")).map_err(|e| {
                    LfbError::Configuration(format!("invalid login exempt pattern '{expr}': {e}"))
                })
            })
            .collect::<LfbResult<Vec<_>>>()?;
        Ok(Self {
            exempt,
            request_expiry_secs,
        })
    }

    /// Builds the guard from `login_exempt_urls` and `session.request_expiry_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`LfbError::Configuration`] if a pattern is not a valid regex.
    pub fn from_settings(settings: &Settings) -> LfbResult<Self> {
        Self::new(&settings.login_exempt_urls, settings.session.request_expiry_secs)
    }

    /// Returns `true` if `path` needs no login.
    pub fn is_exempt(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        self.exempt.iter().any(|re| re.is_match(path))
    }

    /// Checks one request.
    ///
    /// Unauthenticated requests to non-exempt paths are answered with
    /// `10007`. Requests that pass have their session expiry reset.
    ///
    /// # Errors
    ///
    /// Returns the `login required` response to send instead of handling the request.
    pub fn process(
        &self,
        path: &str,
        session: &mut Session,
        is_authenticated: bool,
    ) -> Result<(), ApiResponse> {
        if !is_authenticated && !self.is_exempt(path) {
            tracing::debug!(path, "rejecting unauthenticated request");
            return Err(ApiResponse::fail(ApiStatus::LoginRequired));
        }
        session.set_expiry(self.request_expiry_secs);
        Ok(())
    }
}

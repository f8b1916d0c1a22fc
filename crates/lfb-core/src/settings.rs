//! Settings for the lfb backend.
//!
//! This module provides the [`Settings`] struct, which holds all backend configuration,
//! and [`LazySettings`], a globally-accessible, lazily-initialized settings instance.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Cache/queue store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// The store location (connection string). Empty means in-process memory.
    pub location: String,
    /// Default entry timeout in seconds.
    pub timeout: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            location: String::new(),
            timeout: 300,
        }
    }
}

/// Session expiry configuration.
///
/// Both expiries are absolute: the session expires the given number of
/// seconds after it was last reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Expiry set by a successful login.
    pub login_expiry_secs: u64,
    /// Expiry reset on every authenticated request.
    pub request_expiry_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            login_expiry_secs: 1200,
            request_expiry_secs: 3600,
        }
    }
}

/// The complete set of backend settings.
///
/// # Examples
///
/// ```
/// use lfb_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.session.request_expiry_secs, 3600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The secret key used for session signing.
    pub secret_key: String,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level filter (e.g. "info", "debug", "lfb_db=trace").
    pub log_level: String,
    /// Directory for the daily-rotating log file (debug mode only).
    pub log_dir: Option<PathBuf>,

    // ── Collaborators ────────────────────────────────────────────────

    /// Cache/queue store configuration.
    pub cache: CacheSettings,

    // ── Auth ─────────────────────────────────────────────────────────

    /// Session expiry configuration.
    pub session: SessionSettings,
    /// Path regexes (matched against the path without its leading `/`)
    /// that do not require an authenticated user.
    pub login_exempt_urls: Vec<String>,

    // ── Queries ──────────────────────────────────────────────────────

    /// Days added to the end of a closed date range.
    pub date_range_days: f64,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            secret_key: String::new(),
            log_level: "info".to_string(),
            log_dir: None,
            cache: CacheSettings::default(),
            session: SessionSettings::default(),
            login_exempt_urls: vec!["^login".to_string(), "^logout".to_string()],
            date_range_days: 1.5,
            extra: HashMap::new(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup to set the
/// settings, then use [`get`](LazySettings::get) to access them.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, if any.
    pub fn try_get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

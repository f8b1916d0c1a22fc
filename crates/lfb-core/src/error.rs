//! Core error types for the lfb backend.
//!
//! [`LfbError`] covers the failure kinds the toolkit can actually surface:
//! user operation mistakes, bad data, cache and external-service failures,
//! validation, storage, configuration, and I/O. "Not found" and uniqueness
//! conflicts on the CRUD helpers are deliberately not represented here; those
//! helpers report them through empty results.

use std::fmt;

use thiserror::Error;

/// Represents the first failing request argument.
///
/// # Examples
///
/// ```
/// use lfb_core::error::ValidationError;
///
/// let err = ValidationError::new("age type error.", "type_error").with_field("age");
/// assert_eq!(err.to_string(), "age type error.");
/// assert_eq!(err.field.as_deref(), Some("age"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The human-readable message.
    pub message: String,
    /// A short code identifying the failure (`missing`, `type_error`, `value_error`).
    pub code: String,
    /// The argument that failed, if known.
    pub field: Option<String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            field: None,
        }
    }

    /// Attaches the failing field name.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for the lfb backend.
#[derive(Error, Debug)]
pub enum LfbError {
    // ── Caller-facing ────────────────────────────────────────────────

    /// The user attempted an operation that is not allowed.
    #[error("[operation error] {0}")]
    Operational(String),

    /// User or system data is malformed (bad date text, broken JSON, ...).
    #[error("[data error] {0}")]
    Data(String),

    /// A request argument failed validation.
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    /// A lookup that the caller required to succeed found nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness rule would be broken by the requested write.
    #[error("Conflict: {0}")]
    Conflict(String),

    // ── Collaborators ────────────────────────────────────────────────

    /// The cache/queue store failed.
    #[error("[cache error] {0}")]
    Cache(String),

    /// An outbound HTTP request to an external service failed.
    #[error("[request error] {0}")]
    External(String),

    /// The record store failed.
    #[error("Database error: {0}")]
    Database(String),

    // ── Configuration / plumbing ─────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LfbError {
    /// Returns the response status code associated with this error.
    ///
    /// - `Validation`, `Data` -> `10002` (invalid parameter)
    /// - `NotFound` -> `10006`
    /// - `Conflict` -> `10005`
    /// - `Operational` -> `10008`
    /// - everything else -> `10000` (system error)
    pub const fn status_code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Data(_) => "10002",
            Self::Conflict(_) => "10005",
            Self::NotFound(_) => "10006",
            Self::Operational(_) => "10008",
            Self::Cache(_)
            | Self::External(_)
            | Self::Database(_)
            | Self::Configuration(_)
            | Self::Serialization(_)
            | Self::Io(_) => "10000",
        }
    }
}

impl From<ValidationError> for LfbError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<serde_json::Error> for LfbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A convenience type alias for `Result<T, LfbError>`.
pub type LfbResult<T> = Result<T, LfbError>;

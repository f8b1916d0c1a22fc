//! The JSON response envelope.
//!
//! Every API answer has the shape `{success, status, msg, data}` where
//! `status` is a short numeric string from [`ApiStatus`] and `msg` defaults
//! to that status's fixed message. Failures are communicated through the
//! envelope; the HTTP status is always `200 OK`.

use std::fmt;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use lfb_core::LfbError;
use serde::Serialize;

/// UTF-8 byte order mark written at the start of CSV downloads.
pub const UTF8_BOM: &str = "\u{feff}";

/// Response status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiStatus {
    /// `00000`
    Success,
    /// `10000`
    SystemError,
    /// `10001`
    MissingParameter,
    /// `10002`
    InvalidParameter,
    /// `10003`
    WrongCredentials,
    /// `10004`
    PermissionDenied,
    /// `10005`
    AlreadyExists,
    /// `10006`
    NotFound,
    /// `10007`
    LoginRequired,
    /// `10008`
    IllegalOperation,
}

impl ApiStatus {
    /// Every status, in code order.
    pub const ALL: [Self; 10] = [
        Self::Success,
        Self::SystemError,
        Self::MissingParameter,
        Self::InvalidParameter,
        Self::WrongCredentials,
        Self::PermissionDenied,
        Self::AlreadyExists,
        Self::NotFound,
        Self::LoginRequired,
        Self::IllegalOperation,
    ];

    /// The wire code, e.g. `"10001"`.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Success => "00000",
            Self::SystemError => "10000",
            Self::MissingParameter => "10001",
            Self::InvalidParameter => "10002",
            Self::WrongCredentials => "10003",
            Self::PermissionDenied => "10004",
            Self::AlreadyExists => "10005",
            Self::NotFound => "10006",
            Self::LoginRequired => "10007",
            Self::IllegalOperation => "10008",
        }
    }

    /// The fixed human-readable message.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::SystemError => "system error",
            Self::MissingParameter => "missing parameter",
            Self::InvalidParameter => "invalid parameter",
            Self::WrongCredentials => "wrong username or password",
            Self::PermissionDenied => "permission denied",
            Self::AlreadyExists => "record already exists",
            Self::NotFound => "record not found",
            Self::LoginRequired => "login required",
            Self::IllegalOperation => "illegal operation",
        }
    }

    /// Looks a status up by its wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ApiStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// The `{success, status, msg, data}` envelope.
///
/// # Examples
///
/// ```
/// use lfb_http::{ApiResponse, ApiStatus};
///
/// let resp = ApiResponse::fail(ApiStatus::MissingParameter);
/// assert_eq!(
///     resp.to_json(),
///     serde_json::json!({
///         "success": false,
///         "status": "10001",
///         "msg": "missing parameter",
///         "data": null,
///     })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// The status code.
    pub status: ApiStatus,
    /// A message; the status message unless overridden.
    pub msg: String,
    /// The payload, `null` when absent.
    pub data: serde_json::Value,
}

impl ApiResponse {
    /// A successful response carrying `data`.
    pub fn ok(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                data,
                ..Self::empty()
            },
            Err(e) => {
                tracing::error!(error = %e, "response payload could not be serialized");
                Self::fail(ApiStatus::SystemError)
            }
        }
    }

    /// A successful response without data.
    pub fn empty() -> Self {
        Self {
            success: true,
            status: ApiStatus::Success,
            msg: ApiStatus::Success.message().to_string(),
            data: serde_json::Value::Null,
        }
    }

    /// A failed response with the status's fixed message.
    pub fn fail(status: ApiStatus) -> Self {
        Self {
            success: false,
            status,
            msg: status.message().to_string(),
            data: serde_json::Value::Null,
        }
    }

    /// Replaces the message.
    #[must_use]
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = msg.into();
        self
    }

    /// The envelope as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": self.success,
            "status": self.status.code(),
            "msg": self.msg,
            "data": self.data,
        })
    }
}

impl From<&LfbError> for ApiResponse {
    /// A failed response for an error. Validation errors keep their message;
    /// other errors answer the status's fixed message and are logged.
    fn from(err: &LfbError) -> Self {
        let status = ApiStatus::from_code(err.status_code()).unwrap_or(ApiStatus::SystemError);
        match err {
            LfbError::Validation(v) => Self::fail(status).with_msg(v.message.clone()),
            other => {
                tracing::error!(error = %other, status = %status, "request failed");
                Self::fail(status)
            }
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self.to_json())).into_response()
    }
}

/// An attachment download response: `text/csv`, a
/// `Content-Disposition: attachment; filename="{file_name}.{file_type}"`
/// header, and `content` prefixed with the UTF-8 byte order mark.
pub fn csv_download(file_name: &str, file_type: &str, content: &str) -> Response {
    let disposition = format!("attachment; filename=\"{file_name}.{file_type}\"");
    let mut response = (StatusCode::OK, format!("{UTF8_BOM}{content}")).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => {
            tracing::warn!(error = %e, file_name, "invalid download file name");
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment"),
            );
        }
    }
    response
}

//! # lfb-http
//!
//! The HTTP boundary of the lfb backend: untyped request arguments in,
//! the `{success, status, msg, data}` JSON envelope out.
//!
//! ## Modules
//!
//! - [`querydict`] - Request arguments with multiple values per key
//! - [`response`] - Status codes, the JSON envelope, and download headers
//! - [`session`] - Sessions with fixed expiry and the login-required guard

pub mod querydict;
pub mod response;
pub mod session;

pub use querydict::QueryDict;
pub use response::{csv_download, ApiResponse, ApiStatus};
pub use session::{LoginRequired, Session};

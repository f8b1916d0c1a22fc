//! # lfb-account
//!
//! Users, roles, and permissions, and the request handlers that manage them.
//!
//! ## Modules
//!
//! - [`models`] - The [`User`], [`Role`], [`Permission`], and [`RolePermission`] models
//! - [`hashers`] - Argon2 password hashing
//! - [`auth`] - Login, logout, and the current user's detail
//! - [`roles`] - Role creation, update, soft deletion, and listing

pub mod auth;
pub mod hashers;
pub mod models;
pub mod roles;

pub use auth::{create_user, login, logout, user_detail};
pub use models::{Permission, Role, RolePermission, User};
pub use roles::{role_create, role_delete, role_list, role_permission_ids, role_update};

use lfb_core::LfbResult;
use lfb_http::ApiResponse;

/// Turns a handler's result into the envelope sent to the caller.
pub(crate) fn respond(result: LfbResult<ApiResponse>) -> ApiResponse {
    result.unwrap_or_else(|err| ApiResponse::from(&err))
}

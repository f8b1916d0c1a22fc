//! Account models.
//!
//! Roles and permissions are soft-deletable and renamed on deletion so their
//! names can be reused. A role's permissions live in the [`RolePermission`]
//! join table.

use lfb_db::{Model, ModelMeta};

/// Field holding a user's login name.
pub const USERNAME: &str = "username";
/// Field holding a user's encoded password hash.
pub const PASSWORD: &str = "password";
/// Field stamped on every successful login.
pub const LAST_LOGIN: &str = "last_login";
/// Field naming a role or permission.
pub const NAME: &str = "name";
/// Field holding the username of whoever last changed a record.
pub const MODIFIER: &str = "modifier";
/// Field holding the username of whoever created a record.
pub const OPERATOR: &str = "operator";
/// Permission flag: private permissions are granted explicitly, public ones
/// are attached to every new role.
pub const IS_PRIVATE: &str = "is_private";
/// Join table field referencing a role.
pub const ROLE_ID: &str = "role_id";
/// Join table field referencing a permission.
pub const PERMISSION_ID: &str = "permission_id";

/// A system user.
#[derive(Debug)]
pub struct User;

impl Model for User {
    fn meta() -> &'static ModelMeta {
        static META: ModelMeta = ModelMeta {
            app_label: "account",
            model_name: "user",
            table: "lfb_user",
            display_fields: &[USERNAME, LAST_LOGIN, "created", "modified", "id"],
            rename_field: Some(USERNAME),
            soft_deletable: false,
            timestamped: true,
        };
        &META
    }
}

/// A named set of permissions.
#[derive(Debug)]
pub struct Role;

impl Model for Role {
    fn meta() -> &'static ModelMeta {
        static META: ModelMeta = ModelMeta {
            app_label: "permission_mgmt",
            model_name: "role",
            table: "lfb_role",
            display_fields: &[NAME, MODIFIER, OPERATOR, "created", "modified", "id"],
            rename_field: Some(NAME),
            soft_deletable: true,
            timestamped: true,
        };
        &META
    }
}

/// Access to one interface.
#[derive(Debug)]
pub struct Permission;

impl Model for Permission {
    fn meta() -> &'static ModelMeta {
        static META: ModelMeta = ModelMeta {
            app_label: "permission_mgmt",
            model_name: "permission",
            table: "lfb_permission",
            display_fields: &[
                NAME,
                MODIFIER,
                OPERATOR,
                "created",
                "modified",
                "id",
                "displayed",
                "editable",
            ],
            rename_field: Some(NAME),
            soft_deletable: true,
            timestamped: true,
        };
        &META
    }
}

/// One permission granted to one role.
#[derive(Debug)]
pub struct RolePermission;

impl Model for RolePermission {
    fn meta() -> &'static ModelMeta {
        static META: ModelMeta = ModelMeta {
            app_label: "permission_mgmt",
            model_name: "role_permission",
            table: "lfb_role_permission",
            display_fields: &[ROLE_ID, PERMISSION_ID, "id"],
            rename_field: None,
            soft_deletable: false,
            timestamped: false,
        };
        &META
    }
}

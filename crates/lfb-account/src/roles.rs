//! Role management handlers.
//!
//! Every handler answers an [`ApiResponse`]. A request with no arguments at
//! all is `10001`; an argument that fails validation is `10002` carrying the
//! validator's message.

use lfb_core::{LfbError, LfbResult, SETTINGS};
use lfb_db::query::filters::DEFAULT_RANGE_DAYS;
use lfb_db::record::{CREATED, ID, IS_DELETED};
use lfb_db::{DateRange, Lookup, Model, Projection, Q, Record, RecordStore, Value};
use lfb_forms::{ArgSpec, ArgsValidator, ExpectedType};
use lfb_http::{ApiResponse, ApiStatus, QueryDict};

use crate::models::{
    Permission, Role, RolePermission, IS_PRIVATE, MODIFIER, NAME, OPERATOR, PERMISSION_ID, ROLE_ID,
};
use crate::respond;

fn role_name_spec() -> ArgSpec {
    ArgSpec::new("roleName")
        .expect(ExpectedType::String)
        .required()
        .note("role name")
}

fn role_id_spec() -> ArgSpec {
    ArgSpec::new("roleId")
        .expect(ExpectedType::Integer)
        .required()
        .note("role id")
}

fn live_name(name: &str) -> Q {
    Q::exact(NAME, name) & Q::exact(IS_DELETED, false)
}

fn project(record: &Record) -> Record {
    Projection::default().apply(Role::meta(), record)
}

/// Creates a role and grants it every public permission.
///
/// `roleName` must not name another live role (`10005`).
pub async fn role_create(store: &dyn RecordStore, args: &QueryDict, username: &str) -> ApiResponse {
    respond(try_role_create(store, args, username).await)
}

async fn try_role_create(
    store: &dyn RecordStore,
    args: &QueryDict,
    username: &str,
) -> LfbResult<ApiResponse> {
    if args.is_empty() {
        return Ok(ApiResponse::fail(ApiStatus::MissingParameter));
    }
    let mut validator = ArgsValidator::new(args);
    let name = validator.validate(&role_name_spec());
    validator.check().map_err(LfbError::from)?;
    let Some(Value::String(name)) = name else {
        return Ok(ApiResponse::fail(ApiStatus::MissingParameter));
    };

    let fields = Record::new()
        .with(NAME, name.as_str())
        .with(MODIFIER, username)
        .with(OPERATOR, username);
    let Some(role) = Role::objects(store)
        .create_with_field_check(live_name(&name), fields)
        .await?
    else {
        return Ok(ApiResponse::fail(ApiStatus::AlreadyExists));
    };

    let role_id = role.id().unwrap_or_default();
    let public = Permission::objects(store)
        .existed()
        .filter(Q::exact(IS_PRIVATE, false))
        .values_flat(ID)
        .await?;
    let grants = RolePermission::objects(store);
    for permission_id in public {
        grants
            .create(
                Record::new()
                    .with(ROLE_ID, role_id)
                    .with(PERMISSION_ID, permission_id),
            )
            .await?;
    }
    Ok(ApiResponse::ok(project(&role)))
}

/// Renames a live role.
///
/// Unknown or deleted `roleId` is `10006`; a name held by another live role
/// is `10005`.
pub async fn role_update(store: &dyn RecordStore, args: &QueryDict, username: &str) -> ApiResponse {
    respond(try_role_update(store, args, username).await)
}

async fn try_role_update(
    store: &dyn RecordStore,
    args: &QueryDict,
    username: &str,
) -> LfbResult<ApiResponse> {
    if args.is_empty() {
        return Ok(ApiResponse::fail(ApiStatus::MissingParameter));
    }
    let mut validator = ArgsValidator::new(args);
    let id = validator.validate(&role_id_spec());
    let name = validator.validate(&role_name_spec());
    validator.check().map_err(LfbError::from)?;
    let (Some(Value::Int(id)), Some(Value::String(name))) = (id, name) else {
        return Ok(ApiResponse::fail(ApiStatus::MissingParameter));
    };

    let roles = Role::objects(store).existed();
    if !roles.clone().filter(Q::exact(ID, id)).exists().await? {
        return Ok(ApiResponse::fail(ApiStatus::NotFound));
    }
    let fields = Record::new()
        .with(NAME, name.as_str())
        .with(MODIFIER, username);
    let updated = roles
        .update_with_field_check(live_name(&name), id, fields)
        .await?;
    match updated.iter().find(|r| r.id() == Some(id)) {
        Some(role) => Ok(ApiResponse::ok(project(role))),
        None => Ok(ApiResponse::fail(ApiStatus::AlreadyExists)),
    }
}

/// Soft deletes a role. Its name gains a `_deleted_{id}` suffix so it can be
/// reused.
pub async fn role_delete(store: &dyn RecordStore, args: &QueryDict, username: &str) -> ApiResponse {
    respond(try_role_delete(store, args, username).await)
}

async fn try_role_delete(
    store: &dyn RecordStore,
    args: &QueryDict,
    username: &str,
) -> LfbResult<ApiResponse> {
    if args.is_empty() {
        return Ok(ApiResponse::fail(ApiStatus::MissingParameter));
    }
    let mut validator = ArgsValidator::new(args);
    let id = validator.validate(&role_id_spec());
    validator.check().map_err(LfbError::from)?;
    let Some(Value::Int(id)) = id else {
        return Ok(ApiResponse::fail(ApiStatus::MissingParameter));
    };

    let fields = Record::new()
        .with(IS_DELETED, true)
        .with(MODIFIER, username);
    match Role::objects(store).existed().update_by_id(id, fields).await? {
        Some(role) => Ok(ApiResponse::ok(project(&role))),
        None => Ok(ApiResponse::fail(ApiStatus::NotFound)),
    }
}

/// Lists live roles.
///
/// Optional arguments:
/// - `search`: space separated words that must all appear in the name
/// - `start`, `end`: bounds on `created`
/// - `order`: `1` for oldest first, `-1` (default) for newest first
pub async fn role_list(store: &dyn RecordStore, args: &QueryDict) -> ApiResponse {
    respond(try_role_list(store, args).await)
}

async fn try_role_list(store: &dyn RecordStore, args: &QueryDict) -> LfbResult<ApiResponse> {
    let mut validator = ArgsValidator::new(args);
    let search = validator.validate(&ArgSpec::new("search").expect(ExpectedType::String));
    let start = validator.validate(&ArgSpec::new("start").expect(ExpectedType::String));
    let end = validator.validate(&ArgSpec::new("end").expect(ExpectedType::String));
    let order = validator.validate(
        &ArgSpec::new("order")
            .expect(ExpectedType::Integer)
            .choices([1, -1])
            .default(-1),
    );
    validator.check().map_err(LfbError::from)?;

    let days = SETTINGS
        .try_get()
        .map_or(DEFAULT_RANGE_DAYS, |s| s.date_range_days);
    let range = DateRange::new(CREATED)
        .maybe_start(start.as_ref().and_then(Value::as_str))
        .maybe_end(end.as_ref().and_then(Value::as_str))
        .days(days);

    let mut roles = Role::objects(store).existed().range(&range)?;
    if let Some(search) = search.as_ref().and_then(Value::as_str) {
        roles = roles.fuzzy_filter(NAME, search, " ");
    }
    let order = order
        .as_ref()
        .and_then(Value::as_int)
        .and_then(|o| i32::try_from(o).ok())
        .unwrap_or(-1);
    let rows = roles
        .order_by_field(CREATED, order)
        .values(&Projection::default())
        .await?;
    tracing::debug!(count = rows.len(), "roles listed");
    Ok(ApiResponse::ok(rows))
}

/// Ids of the live permissions granted to `role_id`.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn role_permission_ids(store: &dyn RecordStore, role_id: i64) -> LfbResult<Vec<i64>> {
    let granted = RolePermission::objects(store)
        .filter(Q::exact(ROLE_ID, role_id))
        .values_flat(PERMISSION_ID)
        .await?;
    let live = Permission::objects(store)
        .existed()
        .filter(Q::filter(ID, Lookup::In(granted)))
        .values_flat(ID)
        .await?;
    Ok(live.iter().filter_map(Value::as_int).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lfb_db::InMemoryStore;

    #[tokio::test]
    async fn test_create_requires_args() {
        let store = InMemoryStore::new();
        let resp = role_create(&store, &QueryDict::new(), "admin").await;
        assert_eq!(resp.status, ApiStatus::MissingParameter);

        let resp = role_create(&store, &QueryDict::parse("roleName="), "admin").await;
        assert_eq!(resp.status, ApiStatus::InvalidParameter);
        assert_eq!(resp.msg, "roleName missing.");
    }

    #[tokio::test]
    async fn test_update_rejects_bad_id() {
        let store = InMemoryStore::new();
        let args = QueryDict::parse("roleId=abc&roleName=ops");
        let resp = role_update(&store, &args, "admin").await;
        assert_eq!(resp.status, ApiStatus::InvalidParameter);
        assert_eq!(resp.msg, "roleId type error.");
    }

    #[tokio::test]
    async fn test_list_rejects_bad_order() {
        let store = InMemoryStore::new();
        let resp = role_list(&store, &QueryDict::parse("order=2")).await;
        assert_eq!(resp.status, ApiStatus::InvalidParameter);
        assert_eq!(resp.msg, "order value error.");
    }
}

//! Model metadata.
//!
//! A [`Model`] names a table and declares which of the well-known fields it
//! carries. Records themselves stay opaque; the query strategies consult
//! [`ModelMeta`] to decide whether soft-delete restrictions, timestamps, or
//! rename-on-delete apply.

use lfb_core::{LfbError, LfbResult};

use crate::query::queryset::Manager;
use crate::record::{CREATED, ID, MODIFIED};
use crate::store::RecordStore;

/// An ordered list of field names, e.g. a model's display fields.
pub type FieldSet = &'static [&'static str];

/// Static metadata for a model type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMeta {
    /// The application label (e.g., "account").
    pub app_label: &'static str,
    /// The model name in lowercase (e.g., "role").
    pub model_name: &'static str,
    /// The table the records live in.
    pub table: &'static str,
    /// Fields shown to API callers. Must contain `id`.
    pub display_fields: FieldSet,
    /// Field rewritten to `"{value}_deleted_{id}"` on soft delete.
    pub rename_field: Option<&'static str>,
    /// Whether records carry an `is_deleted` flag.
    pub soft_deletable: bool,
    /// Whether records carry `created` and `modified` stamps.
    pub timestamped: bool,
}

impl ModelMeta {
    /// Returns `true` if records of this model carry `field`, either as a
    /// display field or as an implied timestamp.
    pub fn declares(&self, field: &str) -> bool {
        self.display_fields.contains(&field)
            || (self.timestamped && (field == CREATED || field == MODIFIED))
    }

    /// Verifies the metadata is usable by the query strategies.
    ///
    /// # Errors
    ///
    /// Returns [`LfbError::Configuration`] if the display fields do not
    /// include `id` or the rename field is not a display field.
    pub fn check(&self) -> LfbResult<()> {
        if !self.display_fields.contains(&ID) {
            return Err(LfbError::Configuration(format!(
                "{}.{}: display fields must contain '{ID}'",
                self.app_label, self.model_name
            )));
        }
        if let Some(field) = self.rename_field {
            if !self.display_fields.contains(&field) {
                return Err(LfbError::Configuration(format!(
                    "{}.{}: rename field '{field}' is not a display field",
                    self.app_label, self.model_name
                )));
            }
        }
        Ok(())
    }
}

/// A record type stored in a [`RecordStore`].
///
/// # Examples
///
/// ```
/// use lfb_db::model::{Model, ModelMeta};
///
/// struct Tag;
///
/// impl Model for Tag {
///     fn meta() -> &'static ModelMeta {
///         static META: ModelMeta = ModelMeta {
///             app_label: "blog",
///             model_name: "tag",
///             table: "blog_tag",
///             display_fields: &["name", "id"],
///             rename_field: Some("name"),
///             soft_deletable: true,
///             timestamped: true,
///         };
///         &META
///     }
/// }
///
/// assert!(Tag::meta().check().is_ok());
/// assert!(Tag::meta().declares("created"));
/// ```
pub trait Model: Send + Sync + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns a manager over this model's table in `store`.
    fn objects(store: &dyn RecordStore) -> Manager<'_, Self>
    where
        Self: Sized,
    {
        Manager::new(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: ModelMeta = ModelMeta {
        app_label: "account",
        model_name: "role",
        table: "account_role",
        display_fields: &["name", "operator", "id"],
        rename_field: Some("name"),
        soft_deletable: true,
        timestamped: false,
    };

    #[test]
    fn test_declares() {
        assert!(META.declares("name"));
        assert!(!META.declares("created"));
        let stamped = ModelMeta {
            timestamped: true,
            ..META
        };
        assert!(stamped.declares("created"));
        assert!(stamped.declares("modified"));
    }

    #[test]
    fn test_check_ok() {
        assert!(META.check().is_ok());
    }

    #[test]
    fn test_check_requires_id() {
        let meta = ModelMeta {
            display_fields: &["name"],
            ..META
        };
        assert!(matches!(meta.check(), Err(LfbError::Configuration(_))));
    }

    #[test]
    fn test_check_rename_field_displayed() {
        let meta = ModelMeta {
            rename_field: Some("code"),
            ..META
        };
        assert!(meta.check().is_err());
    }
}

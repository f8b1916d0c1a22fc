//! Display projection.
//!
//! A [`Projection`] decides which fields of a record are exposed to callers.
//! By default a model's display fields are returned together with any extra
//! fields requested; `use_fields_only` narrows the result to exactly the
//! extra fields. The bookkeeping fields `id`, `created`, and `modified` are
//! always included when the model declares them, unless excluded.

use crate::model::ModelMeta;
use crate::record::{Record, CREATED, ID, MODIFIED};

const ALWAYS_INCLUDED: [&str; 3] = [ID, CREATED, MODIFIED];

/// Field selection strategy for `values` / `values_list` queries.
///
/// # Examples
///
/// ```
/// use lfb_db::model::ModelMeta;
/// use lfb_db::query::projection::Projection;
///
/// let meta = ModelMeta {
///     app_label: "account",
///     model_name: "role",
///     table: "account_role",
///     display_fields: &["name", "id"],
///     rename_field: Some("name"),
///     soft_deletable: true,
///     timestamped: true,
/// };
///
/// assert_eq!(
///     Projection::default().fields(&meta),
///     vec!["name", "id", "created", "modified"]
/// );
/// assert_eq!(
///     Projection::only(["desc"]).exclude(["created"]).fields(&meta),
///     vec!["desc", "id", "modified"]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    extra_fields: Vec<String>,
    use_fields_only: bool,
    exclude: Vec<String>,
}

impl Projection {
    /// The display fields plus `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra_fields: extra.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Exactly `fields`, without the display fields.
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            use_fields_only: true,
            ..Self::with_extra(fields)
        }
    }

    /// Drops `fields` from the result, including the always-included ones.
    #[must_use]
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if only the extra fields are used.
    pub const fn uses_fields_only(&self) -> bool {
        self.use_fields_only
    }

    /// Resolves the ordered, de-duplicated field list for a model.
    pub fn fields(&self, meta: &ModelMeta) -> Vec<String> {
        let mut candidates: Vec<&str> = Vec::new();
        if !self.use_fields_only {
            candidates.extend_from_slice(meta.display_fields);
        }
        candidates.extend(self.extra_fields.iter().map(String::as_str));
        candidates.extend(ALWAYS_INCLUDED.iter().copied().filter(|f| meta.declares(f)));

        let mut out: Vec<String> = Vec::new();
        for field in candidates {
            if !self.exclude.iter().any(|e| e == field) && !out.iter().any(|f| f == field) {
                out.push(field.to_string());
            }
        }
        out
    }

    /// Restricts a record to the resolved fields. Fields the record lacks are skipped.
    pub fn apply(&self, meta: &ModelMeta, record: &Record) -> Record {
        record.restrict(&self.fields(meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    const META: ModelMeta = ModelMeta {
        app_label: "account",
        model_name: "role",
        table: "account_role",
        display_fields: &["name", "operator", "id"],
        rename_field: Some("name"),
        soft_deletable: true,
        timestamped: true,
    };

    #[test]
    fn test_default_uses_display_fields() {
        assert_eq!(
            Projection::default().fields(&META),
            vec!["name", "operator", "id", "created", "modified"]
        );
    }

    #[test]
    fn test_extra_fields_are_appended_once() {
        let p = Projection::with_extra(["desc", "name"]);
        assert_eq!(
            p.fields(&META),
            vec!["name", "operator", "id", "desc", "created", "modified"]
        );
    }

    #[test]
    fn test_fields_only() {
        let p = Projection::only(["desc"]);
        assert!(p.uses_fields_only());
        assert_eq!(p.fields(&META), vec!["desc", "id", "created", "modified"]);
    }

    #[test]
    fn test_exclude_beats_always_included() {
        let p = Projection::default().exclude(["modified", "operator"]);
        assert_eq!(p.fields(&META), vec!["name", "id", "created"]);
    }

    #[test]
    fn test_untimestamped_model_skips_stamps() {
        let meta = ModelMeta {
            timestamped: false,
            ..META
        };
        assert_eq!(
            Projection::only(["name"]).fields(&meta),
            vec!["name", "id"]
        );
    }

    #[test]
    fn test_apply_skips_missing_fields() {
        let record = Record::new()
            .with("id", 1)
            .with("name", "ops")
            .with("secret", "x")
            .with("created", "2020-01-01");
        let projected = Projection::default().apply(&META, &record);
        assert_eq!(projected.len(), 3);
        assert_eq!(projected.get("secret"), None);
        assert_eq!(projected.get("created"), Some(&Value::from("2020-01-01")));
    }
}

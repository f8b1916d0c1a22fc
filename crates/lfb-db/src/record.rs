//! Opaque persisted entities.
//!
//! A [`Record`] is a mapping from field name to [`Value`]. The toolkit only
//! relies on a handful of well-known fields: `id`, `created`, `modified`,
//! `is_deleted`, and a model's rename field.

use std::collections::BTreeMap;

use crate::value::Value;

/// Primary key field name.
pub const ID: &str = "id";
/// Creation timestamp field name.
pub const CREATED: &str = "created";
/// Modification timestamp field name.
pub const MODIFIED: &str = "modified";
/// Soft-delete flag field name.
pub const IS_DELETED: &str = "is_deleted";

/// One persisted entity, or a set of field assignments for a write.
///
/// # Examples
///
/// ```
/// use lfb_db::record::Record;
/// use lfb_db::value::Value;
///
/// let role = Record::new().with("id", 5).with("name", "admin");
/// assert_eq!(role.id(), Some(5));
/// assert_eq!(role.get("name"), Some(&Value::from("admin")));
/// assert!(!role.is_deleted());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field and returns the record (builder style).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Returns `true` if the field is present (even when `Null`).
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns `true` if the field is absent or `Null`.
    pub fn is_unset(&self, field: &str) -> bool {
        self.fields.get(field).map_or(true, Value::is_null)
    }

    /// Returns the integer primary key, if set.
    pub fn id(&self) -> Option<i64> {
        self.get(ID).and_then(Value::as_int)
    }

    /// Returns `true` if the soft-delete flag is set.
    pub fn is_deleted(&self) -> bool {
        self.get(IS_DELETED).is_some_and(Value::is_truthy)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(field, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copies every field of `changes` into this record, except the primary key.
    pub fn apply(&mut self, changes: &Self) {
        for (field, value) in changes.iter() {
            if field != ID {
                self.fields.insert(field.to_string(), value.clone());
            }
        }
    }

    /// Returns a record restricted to `fields`; fields this record lacks are skipped.
    pub fn restrict<S: AsRef<str>>(&self, fields: &[S]) -> Self {
        let fields = fields
            .iter()
            .filter_map(|f| {
                let f = f.as_ref();
                self.fields.get(f).map(|v| (f.to_string(), v.clone()))
            })
            .collect();
        Self { fields }
    }

    /// Converts the record to a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl serde::Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_get() {
        let r = Record::new().with("id", 1).with("name", "ops");
        assert_eq!(r.len(), 2);
        assert_eq!(r.id(), Some(1));
        assert!(r.contains("name"));
        assert!(!r.contains("desc"));
    }

    #[test]
    fn test_is_unset() {
        let r = Record::new().with("desc", Value::Null);
        assert!(r.is_unset("desc"));
        assert!(r.is_unset("missing"));
        assert!(!r.with("desc", "x").is_unset("desc"));
    }

    #[test]
    fn test_is_deleted() {
        assert!(!Record::new().is_deleted());
        assert!(Record::new().with(IS_DELETED, true).is_deleted());
        assert!(!Record::new().with(IS_DELETED, false).is_deleted());
    }

    #[test]
    fn test_apply_keeps_id() {
        let mut r = Record::new().with("id", 1).with("name", "a");
        r.apply(&Record::new().with("id", 99).with("name", "b").with("desc", "d"));
        assert_eq!(r.id(), Some(1));
        assert_eq!(r.get("name"), Some(&Value::from("b")));
        assert_eq!(r.get("desc"), Some(&Value::from("d")));
    }

    #[test]
    fn test_restrict_skips_missing() {
        let r = Record::new().with("id", 1).with("name", "a").with("secret", "s");
        let p = r.restrict(&["id", "name", "nope"]);
        assert_eq!(p, Record::new().with("id", 1).with("name", "a"));
    }

    #[test]
    fn test_from_iterator() {
        let r: Record = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(r.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_to_json() {
        let r = Record::new().with("id", 1).with("name", "a");
        assert_eq!(r.to_json(), serde_json::json!({"id": 1, "name": "a"}));
        assert_eq!(serde_json::to_value(&r).unwrap(), r.to_json());
    }
}

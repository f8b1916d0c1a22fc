//! CRUD helpers.
//!
//! Guarded creation, update by id with rename-on-delete, and lookups that
//! answer projected records. "Not found" and uniqueness conflicts are not
//! errors here: they come back as `None` or an empty result and the caller
//! decides what they mean. Only store failures are `Err`.

use chrono::Utc;
use lfb_core::LfbResult;

use crate::model::Model;
use crate::query::lookups::{Lookup, Q};
use crate::query::projection::Projection;
use crate::query::queryset::{Manager, QuerySet};
use crate::record::{Record, CREATED, ID, IS_DELETED, MODIFIED};
use crate::value::Value;

fn now() -> Value {
    Value::DateTime(Utc::now().naive_utc())
}

fn stamp_modified<M: Model>(fields: &mut Record) {
    if M::meta().timestamped && fields.is_unset(MODIFIED) {
        fields.set(MODIFIED, now());
    }
}

impl<M: Model> QuerySet<'_, M> {
    /// Inserts a record unconditionally.
    ///
    /// Timestamped models get `created`/`modified` stamped unless supplied;
    /// soft-deletable models default `is_deleted` to `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn create(&self, mut fields: Record) -> LfbResult<Record> {
        let meta = M::meta();
        if meta.timestamped {
            let stamp = now();
            if fields.is_unset(CREATED) {
                fields.set(CREATED, stamp.clone());
            }
            if fields.is_unset(MODIFIED) {
                fields.set(MODIFIED, stamp);
            }
        }
        if meta.soft_deletable && !fields.contains(IS_DELETED) {
            fields.set(IS_DELETED, false);
        }
        let record = self.store.insert(meta.table, fields).await?;
        tracing::info!(table = meta.table, id = ?record.id(), "record created");
        Ok(record)
    }

    /// Creates a record unless one already matches `field_query`.
    ///
    /// Returns `None` when a matching record exists; nothing is written then.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn create_with_field_check(
        &self,
        field_query: Q,
        fields: Record,
    ) -> LfbResult<Option<Record>> {
        if self.clone().filter(field_query).exists().await? {
            tracing::warn!(table = M::meta().table, "create skipped: record already exists");
            return Ok(None);
        }
        self.create(fields).await.map(Some)
    }

    /// [`create_with_field_check`](Self::create_with_field_check) on the `name` field.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn create_with_name_check(&self, fields: Record) -> LfbResult<Option<Record>> {
        let name = fields.get("name").cloned().unwrap_or(Value::Null);
        self.create_with_field_check(Q::exact("name", name), fields)
            .await
    }

    /// Updates the record with `id` and returns it as stored afterwards.
    ///
    /// When `fields` sets `is_deleted` to a truthy value and the model has a
    /// rename field, that field becomes `"{current}_deleted_{id}"` so the
    /// original value is free for reuse. `modified` is stamped unless
    /// supplied. Returns `None` and writes nothing if no record matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn update_by_id(&self, id: i64, mut fields: Record) -> LfbResult<Option<Record>> {
        let meta = M::meta();
        let by_id = self.clone().filter(Q::exact(ID, id));
        let Some(found) = by_id.first().await? else {
            tracing::debug!(table = meta.table, id, "update skipped: no such record");
            return Ok(None);
        };

        if fields.get(IS_DELETED).is_some_and(Value::is_truthy) {
            if let Some(rename) = meta.rename_field {
                let current = found.get(rename).map_or_else(|| Value::Null.to_text(), Value::to_text);
                fields.set(rename, format!("{current}_deleted_{id}"));
            }
        }
        stamp_modified::<M>(&mut fields);

        self.store.update(meta.table, by_id.predicate(), &fields).await?;
        tracing::info!(table = meta.table, id, "record updated");

        // The update may have flipped is_deleted, so re-read without this query's filters.
        self.manager().filter(Q::exact(ID, id)).first().await
    }

    /// Updates by `id` while keeping `field_query` unique.
    ///
    /// - No record matches `field_query`: the record with `id` is updated.
    /// - The first match has `id`: every match is updated.
    /// - Otherwise another record holds that field combination; nothing is
    ///   written and the result is empty.
    ///
    /// Returns the updated records as stored afterwards; also empty when
    /// `id` does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn update_with_field_check(
        &self,
        field_query: Q,
        id: i64,
        mut fields: Record,
    ) -> LfbResult<Vec<Record>> {
        let meta = M::meta();
        let matching = self.clone().filter(field_query);
        let found = matching.fetch().await?;

        let target = match found.first() {
            None => self.clone().filter(Q::exact(ID, id)),
            Some(first) if first.id() == Some(id) => matching,
            Some(first) => {
                tracing::warn!(
                    table = meta.table,
                    id,
                    holder = ?first.id(),
                    "update skipped: field combination already taken"
                );
                return Ok(Vec::new());
            }
        };

        stamp_modified::<M>(&mut fields);
        let ids: Vec<Value> = target
            .fetch()
            .await?
            .iter()
            .filter_map(Record::id)
            .map(Value::Int)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let updated = self
            .store
            .update(meta.table, target.predicate(), &fields)
            .await?;
        tracing::info!(table = meta.table, id, updated, "records updated with field check");

        self.manager()
            .filter(Q::filter(ID, Lookup::In(ids)))
            .fetch()
            .await
    }

    /// Returns the projected record with `id`, or an empty record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_by_id(&self, id: i64, projection: &Projection) -> LfbResult<Record> {
        self.get_by_field(Q::exact(ID, id), projection).await
    }

    /// Returns the first projected record matching `field_query`, or an
    /// empty record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_by_field(&self, field_query: Q, projection: &Projection) -> LfbResult<Record> {
        Ok(self
            .clone()
            .filter(field_query)
            .first()
            .await?
            .map(|r| projection.apply(M::meta(), &r))
            .unwrap_or_default())
    }
}

impl<M: Model> Manager<'_, M> {
    /// See [`QuerySet::create`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn create(&self, fields: Record) -> LfbResult<Record> {
        self.all().create(fields).await
    }

    /// See [`QuerySet::create_with_field_check`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn create_with_field_check(
        &self,
        field_query: Q,
        fields: Record,
    ) -> LfbResult<Option<Record>> {
        self.all().create_with_field_check(field_query, fields).await
    }

    /// See [`QuerySet::create_with_name_check`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn create_with_name_check(&self, fields: Record) -> LfbResult<Option<Record>> {
        self.all().create_with_name_check(fields).await
    }

    /// See [`QuerySet::update_by_id`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn update_by_id(&self, id: i64, fields: Record) -> LfbResult<Option<Record>> {
        self.all().update_by_id(id, fields).await
    }

    /// See [`QuerySet::update_with_field_check`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn update_with_field_check(
        &self,
        field_query: Q,
        id: i64,
        fields: Record,
    ) -> LfbResult<Vec<Record>> {
        self.all().update_with_field_check(field_query, id, fields).await
    }

    /// See [`QuerySet::get_by_id`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_by_id(&self, id: i64, projection: &Projection) -> LfbResult<Record> {
        self.all().get_by_id(id, projection).await
    }

    /// See [`QuerySet::get_by_field`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_by_field(&self, field_query: Q, projection: &Projection) -> LfbResult<Record> {
        self.all().get_by_field(field_query, projection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelMeta;
    use crate::store::{InMemoryStore, RecordStore};

    struct Team;

    impl Model for Team {
        fn meta() -> &'static ModelMeta {
            static META: ModelMeta = ModelMeta {
                app_label: "test",
                model_name: "team",
                table: "test_team",
                display_fields: &["name", "id"],
                rename_field: Some("name"),
                soft_deletable: true,
                timestamped: true,
            };
            &META
        }
    }

    struct Plain;

    impl Model for Plain {
        fn meta() -> &'static ModelMeta {
            static META: ModelMeta = ModelMeta {
                app_label: "test",
                model_name: "plain",
                table: "test_plain",
                display_fields: &["id"],
                rename_field: None,
                soft_deletable: false,
                timestamped: false,
            };
            &META
        }
    }

    #[tokio::test]
    async fn test_create_stamps_and_defaults() {
        let store = InMemoryStore::new();
        let team = Team::objects(&store)
            .create(Record::new().with("name", "ops"))
            .await
            .unwrap();
        assert!(matches!(team.get(CREATED), Some(Value::DateTime(_))));
        assert_eq!(team.get(CREATED), team.get(MODIFIED));
        assert_eq!(team.get(IS_DELETED), Some(&Value::Bool(false)));

        let plain = Plain::objects(&store).create(Record::new()).await.unwrap();
        assert_eq!(plain, Record::new().with("id", 1));
    }

    #[tokio::test]
    async fn test_create_keeps_supplied_stamps() {
        let store = InMemoryStore::new();
        let team = Team::objects(&store)
            .create(Record::new().with("created", "2020-01-01").with("is_deleted", true))
            .await
            .unwrap();
        assert_eq!(team.get(CREATED), Some(&Value::from("2020-01-01")));
        assert!(team.is_deleted());
    }

    #[tokio::test]
    async fn test_create_with_name_check() {
        let store = InMemoryStore::new();
        let objects = Team::objects(&store);
        let first = objects
            .create_with_name_check(Record::new().with("name", "ops"))
            .await
            .unwrap();
        assert!(first.is_some());
        let second = objects
            .create_with_name_check(Record::new().with("name", "ops"))
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(store.len("test_team").await, 1);
    }

    #[tokio::test]
    async fn test_update_by_id_missing_is_noop() {
        let store = InMemoryStore::new();
        let out = Team::objects(&store)
            .update_by_id(42, Record::new().with("name", "x"))
            .await
            .unwrap();
        assert!(out.is_none());
        assert_eq!(store.len("test_team").await, 0);
    }

    #[tokio::test]
    async fn test_update_by_id_stamps_modified() {
        let store = InMemoryStore::new();
        let objects = Team::objects(&store);
        objects
            .create(Record::new().with("name", "ops").with("modified", "2000-01-01"))
            .await
            .unwrap();
        let updated = objects
            .update_by_id(1, Record::new().with("desc", "on call"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("desc"), Some(&Value::from("on call")));
        assert!(matches!(updated.get(MODIFIED), Some(Value::DateTime(_))));

        let explicit = objects
            .update_by_id(1, Record::new().with("modified", "2030-01-01"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(explicit.get(MODIFIED), Some(&Value::from("2030-01-01")));
    }

    #[tokio::test]
    async fn test_update_by_id_soft_delete_renames() {
        let store = InMemoryStore::new();
        let objects = Team::objects(&store);
        for _ in 0..5 {
            objects.create(Record::new().with("name", "foo")).await.unwrap();
        }
        let deleted = objects
            .update_by_id(5, Record::new().with("is_deleted", true))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(deleted.get("name"), Some(&Value::from("foo_deleted_5")));
        assert!(deleted.is_deleted());
    }

    #[tokio::test]
    async fn test_update_by_id_respects_existed() {
        let store = InMemoryStore::new();
        let objects = Team::objects(&store);
        objects
            .create(Record::new().with("name", "gone").with("is_deleted", true))
            .await
            .unwrap();
        let out = objects
            .existed()
            .update_by_id(1, Record::new().with("name", "back"))
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_update_with_field_check_paths() {
        let store = InMemoryStore::new();
        let objects = Team::objects(&store);
        objects.create(Record::new().with("name", "a")).await.unwrap();
        objects.create(Record::new().with("name", "b")).await.unwrap();

        // No holder: update by id.
        let out = objects
            .update_with_field_check(Q::exact("name", "c"), 1, Record::new().with("name", "c"))
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("name"), Some(&Value::from("c")));

        // Held by the same record.
        let out = objects
            .update_with_field_check(Q::exact("name", "c"), 1, Record::new().with("desc", "x"))
            .await
            .unwrap();
        assert_eq!(out[0].get("desc"), Some(&Value::from("x")));

        // Held by another record: conflict, nothing written.
        let out = objects
            .update_with_field_check(Q::exact("name", "b"), 1, Record::new().with("name", "b"))
            .await
            .unwrap();
        assert!(out.is_empty());
        let first = store
            .filter("test_team", &Q::exact(ID, 1))
            .await
            .unwrap()
            .remove(0);
        assert_eq!(first.get("name"), Some(&Value::from("c")));

        // Unknown id.
        let out = objects
            .update_with_field_check(Q::exact("name", "z"), 9, Record::new().with("name", "z"))
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_and_field() {
        let store = InMemoryStore::new();
        let objects = Team::objects(&store);
        objects
            .create(Record::new().with("name", "ops").with("secret", "s"))
            .await
            .unwrap();

        let found = objects.get_by_id(1, &Projection::default()).await.unwrap();
        assert_eq!(found.get("name"), Some(&Value::from("ops")));
        assert!(found.contains(CREATED));
        assert!(!found.contains("secret"));

        let by_field = objects
            .get_by_field(Q::exact("name", "ops"), &Projection::with_extra(["secret"]))
            .await
            .unwrap();
        assert_eq!(by_field.get("secret"), Some(&Value::from("s")));

        assert!(objects.get_by_id(2, &Projection::default()).await.unwrap().is_empty());
    }
}

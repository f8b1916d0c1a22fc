//! Storage collaborator.
//!
//! This module defines the [`RecordStore`] trait, the minimal async interface
//! the query strategies need from persistence: filter by predicate, test
//! existence, insert, and bulk update. There is deliberately no hard delete;
//! deletion is a soft-delete update.
//!
//! [`InMemoryStore`] implements the trait behind a `tokio::sync::RwLock` and
//! evaluates predicates with [`Q::matches`]. It backs the tests and is
//! suitable for single-process deployments.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use lfb_core::{LfbError, LfbResult};
use tokio::sync::RwLock;

use crate::query::lookups::Q;
use crate::record::{Record, ID};
use crate::value::Value;

/// Minimal async record store.
///
/// Query builders accept `&dyn RecordStore`, so a concrete backend only has
/// to provide these operations. Not-found and empty results are `Ok`; only
/// backend failures are `Err`.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every record in `table` matching `predicate`, in primary key order.
    async fn filter(&self, table: &str, predicate: &Q) -> LfbResult<Vec<Record>>;

    /// Returns `true` if at least one record in `table` matches `predicate`.
    async fn exists(&self, table: &str, predicate: &Q) -> LfbResult<bool> {
        Ok(!self.filter(table, predicate).await?.is_empty())
    }

    /// Inserts a record, assigning its `id`, and returns the stored record.
    ///
    /// A caller-supplied `id` is kept, but one already in use is an error:
    /// an insert never replaces an existing record.
    async fn insert(&self, table: &str, record: Record) -> LfbResult<Record>;

    /// Applies `changes` to every record matching `predicate`.
    /// Returns the number of records updated.
    async fn update(&self, table: &str, predicate: &Q, changes: &Record) -> LfbResult<u64>;
}

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

/// A [`RecordStore`] holding every table in memory.
///
/// Cloning shares the underlying tables.
///
/// # Examples
///
/// ```
/// use lfb_db::query::lookups::Q;
/// use lfb_db::record::Record;
/// use lfb_db::store::{InMemoryStore, RecordStore};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryStore::new();
/// let role = store.insert("role", Record::new().with("name", "ops")).await.unwrap();
/// assert_eq!(role.id(), Some(1));
/// assert!(store.exists("role", &Q::exact("name", "ops")).await.unwrap());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in `table`, including soft-deleted ones.
    pub async fn len(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |t| t.rows.len())
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryStore {
    async fn filter(&self, table: &str, predicate: &Q) -> LfbResult<Vec<Record>> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).map_or_else(Vec::new, |t| {
            t.rows
                .values()
                .filter(|r| predicate.matches(r))
                .cloned()
                .collect()
        }))
    }

    async fn insert(&self, table: &str, mut record: Record) -> LfbResult<Record> {
        let mut tables = self.tables.write().await;
        let t = tables.entry(table.to_string()).or_default();
        let id = match record.id() {
            Some(id) if t.rows.contains_key(&id) => {
                return Err(LfbError::Database(format!(
                    "duplicate id {id} in table {table}"
                )));
            }
            Some(id) => id,
            None => t.next_id.checked_add(1).ok_or_else(|| {
                LfbError::Database(format!("id sequence exhausted in table {table}"))
            })?,
        };
        t.next_id = t.next_id.max(id);
        record.set(ID, Value::Int(id));
        t.rows.insert(id, record.clone());
        tracing::trace!(table, id, "record inserted");
        Ok(record)
    }

    async fn update(&self, table: &str, predicate: &Q, changes: &Record) -> LfbResult<u64> {
        let mut tables = self.tables.write().await;
        let Some(t) = tables.get_mut(table) else {
            return Ok(0);
        };
        let mut updated = 0;
        for row in t.rows.values_mut().filter(|r| predicate.matches(r)) {
            row.apply(changes);
            updated += 1;
        }
        tracing::trace!(table, updated, "records updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let a = store.insert("t", Record::new().with("name", "a")).await.unwrap();
        let b = store.insert("t", Record::new().with("name", "b")).await.unwrap();
        assert_eq!(a.id(), Some(1));
        assert_eq!(b.id(), Some(2));
        assert_eq!(store.len("t").await, 2);
    }

    #[tokio::test]
    async fn test_insert_with_explicit_id() {
        let store = InMemoryStore::new();
        store.insert("t", Record::new().with("id", 10)).await.unwrap();
        let next = store.insert("t", Record::new()).await.unwrap();
        assert_eq!(next.id(), Some(11));
    }

    #[tokio::test]
    async fn test_insert_rejects_taken_id() {
        let store = InMemoryStore::new();
        store.insert("t", Record::new().with("name", "a")).await.unwrap();
        let err = store
            .insert("t", Record::new().with("id", 1).with("name", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, LfbError::Database(_)));
        assert_eq!(store.len("t").await, 1);
        let kept = store.filter("t", &Q::exact("id", 1)).await.unwrap();
        assert_eq!(kept[0].get("name"), Some(&Value::from("a")));
    }

    #[tokio::test]
    async fn test_insert_after_max_id_fails_cleanly() {
        let store = InMemoryStore::new();
        store.insert("t", Record::new().with("id", i64::MAX)).await.unwrap();
        let err = store.insert("t", Record::new().with("name", "b")).await.unwrap_err();
        assert!(matches!(err, LfbError::Database(_)));
        assert_eq!(store.len("t").await, 1);
    }

    #[tokio::test]
    async fn test_filter_and_exists() {
        let store = InMemoryStore::new();
        store.insert("t", Record::new().with("name", "a")).await.unwrap();
        store.insert("t", Record::new().with("name", "b")).await.unwrap();

        let found = store.filter("t", &Q::exact("name", "b")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), Some(2));
        assert!(!store.exists("t", &Q::exact("name", "c")).await.unwrap());
        assert!(store.filter("missing", &Q::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_counts_and_keeps_id() {
        let store = InMemoryStore::new();
        store.insert("t", Record::new().with("g", 1)).await.unwrap();
        store.insert("t", Record::new().with("g", 1)).await.unwrap();
        store.insert("t", Record::new().with("g", 2)).await.unwrap();

        let n = store
            .update("t", &Q::exact("g", 1), &Record::new().with("g", 3).with("id", 99))
            .await
            .unwrap();
        assert_eq!(n, 2);
        let rows = store.filter("t", &Q::exact("g", 3)).await.unwrap();
        assert_eq!(rows.iter().filter_map(Record::id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(store.update("none", &Q::all(), &Record::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clone_shares_tables() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.insert("t", Record::new()).await.unwrap();
        assert_eq!(other.len("t").await, 1);
    }
}

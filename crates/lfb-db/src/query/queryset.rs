//! Manager and `QuerySet` API.
//!
//! [`Manager`] is the entry point for model-level queries (`Model::objects`),
//! and [`QuerySet`] is a lazy, chainable query over one model's table. A
//! query set holds the store, the accumulated predicate, and the ordering;
//! the independent strategies (soft delete, date range, fuzzy search,
//! projection) are composed onto it by explicit chaining calls. Nothing
//! touches the store until a terminal method runs.
//!
//! # Examples
//!
//! ```
//! use lfb_db::model::{Model, ModelMeta};
//! use lfb_db::query::filters::DateRange;
//! use lfb_db::query::projection::Projection;
//! use lfb_db::record::Record;
//! use lfb_db::store::InMemoryStore;
//!
//! struct Tag;
//! impl Model for Tag {
//!     fn meta() -> &'static ModelMeta {
//!         static META: ModelMeta = ModelMeta {
//!             app_label: "blog",
//!             model_name: "tag",
//!             table: "blog_tag",
//!             display_fields: &["name", "id"],
//!             rename_field: Some("name"),
//!             soft_deletable: true,
//!             timestamped: false,
//!         };
//!         &META
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryStore::new();
//! Tag::objects(&store).create(Record::new().with("name", "rust tips")).await.unwrap();
//! Tag::objects(&store).create(Record::new().with("name", "go tips")).await.unwrap();
//!
//! let rows = Tag::objects(&store)
//!     .existed()
//!     .fuzzy_filter("name", "RUST tip", " ")
//!     .order_by_field("id", -1)
//!     .values(&Projection::default())
//!     .await
//!     .unwrap();
//! assert_eq!(rows.len(), 1);
//! # });
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use lfb_core::LfbResult;

use crate::model::Model;
use crate::query::filters::{soft_delete_q, DateRange};
use crate::query::lookups::{Lookup, Q};
use crate::query::projection::Projection;
use crate::record::Record;
use crate::store::RecordStore;
use crate::value::Value;

/// An ordering term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The field to order by.
    pub field: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending order.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Creates a descending order.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let ord = match (a.get(&self.field), b.get(&self.field)) {
            (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// The entry point for model-level query operations.
///
/// The `Manager` itself does not hold any query state; it creates fresh
/// `QuerySet` instances bound to its store.
pub struct Manager<'s, M: Model> {
    store: &'s dyn RecordStore,
    _model: PhantomData<M>,
}

impl<'s, M: Model> Manager<'s, M> {
    /// Creates a manager over `store`.
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self {
            store,
            _model: PhantomData,
        }
    }

    /// Returns a `QuerySet` over every record, soft-deleted ones included.
    pub fn all(&self) -> QuerySet<'s, M> {
        QuerySet::new(self.store)
    }

    /// Returns a `QuerySet` with the given filter applied.
    pub fn filter(&self, q: Q) -> QuerySet<'s, M> {
        self.all().filter(q)
    }

    /// Returns a `QuerySet` with the given exclusion applied.
    pub fn exclude(&self, q: Q) -> QuerySet<'s, M> {
        self.all().exclude(q)
    }

    /// Returns a `QuerySet` restricted to records that are not soft-deleted.
    pub fn existed(&self) -> QuerySet<'s, M> {
        self.all().existed()
    }
}

impl<M: Model> fmt::Debug for Manager<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("table", &M::meta().table)
            .finish_non_exhaustive()
    }
}

/// A lazy, composable query over one model's table.
///
/// All chaining methods consume `self` and return the refined query set.
pub struct QuerySet<'s, M: Model> {
    pub(crate) store: &'s dyn RecordStore,
    predicate: Q,
    order_by: Vec<OrderBy>,
    limit: Option<usize>,
    offset: usize,
    _model: PhantomData<M>,
}

impl<M: Model> Clone for QuerySet<'_, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            predicate: self.predicate.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
            _model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for QuerySet<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("table", &M::meta().table)
            .field("predicate", &self.predicate)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl<'s, M: Model> QuerySet<'s, M> {
    fn new(store: &'s dyn RecordStore) -> Self {
        Self {
            store,
            predicate: Q::all(),
            order_by: Vec::new(),
            limit: None,
            offset: 0,
            _model: PhantomData,
        }
    }

    /// Returns the accumulated predicate.
    pub const fn predicate(&self) -> &Q {
        &self.predicate
    }

    /// Returns a manager over the same store, without this query's state.
    pub(crate) fn manager(&self) -> Manager<'s, M> {
        Manager::new(self.store)
    }

    // ── Filtering strategies (lazy) ──────────────────────────────────

    /// Adds a filter condition.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.predicate = self.predicate & q;
        self
    }

    /// Adds an exclusion condition (NOT).
    #[must_use]
    pub fn exclude(self, q: Q) -> Self {
        self.filter(!q)
    }

    /// Restricts to records that are not soft-deleted. A no-op for models
    /// without an `is_deleted` flag.
    #[must_use]
    pub fn existed(self) -> Self {
        match soft_delete_q(M::meta()) {
            Some(q) => self.filter(q),
            None => self,
        }
    }

    /// Adds a date-range predicate.
    ///
    /// # Errors
    ///
    /// Returns [`LfbError::Data`](lfb_core::LfbError::Data) if a bound is not a valid date.
    pub fn range(self, range: &DateRange) -> LfbResult<Self> {
        Ok(self.filter(range.to_q()?))
    }

    /// Adds one case-insensitive containment filter on `field` per non-empty
    /// token of `search`, split on `split`.
    #[must_use]
    pub fn fuzzy_filter(self, field: &str, search: &str, split: &str) -> Self {
        search
            .split(split)
            .filter(|token| !token.is_empty())
            .fold(self, |qs, token| {
                qs.filter(Q::filter(field, Lookup::IContains(token.to_string())))
            })
    }

    /// Orders by one field; `order == -1` means descending, anything else ascending.
    #[must_use]
    pub fn order_by_field(self, field: &str, order: i32) -> Self {
        let term = if order == -1 {
            OrderBy::desc(field)
        } else {
            OrderBy::asc(field)
        };
        self.order_by(vec![term])
    }

    /// Sets the ordering, replacing any previous one.
    #[must_use]
    pub fn order_by(mut self, fields: Vec<OrderBy>) -> Self {
        self.order_by = fields;
        self
    }

    /// Limits the number of records returned.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skips the first `n` records.
    #[must_use]
    pub const fn offset(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    // ── Terminal methods ─────────────────────────────────────────────

    /// Runs the query and returns the full records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn fetch(&self) -> LfbResult<Vec<Record>> {
        tracing::debug!(
            table = M::meta().table,
            conditions = ?self.predicate.conditions(),
            "fetching records"
        );
        let mut records = self.store.filter(M::meta().table, &self.predicate).await?;
        if !self.order_by.is_empty() {
            records.sort_by(|a, b| {
                self.order_by
                    .iter()
                    .map(|o| o.compare(a, b))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }
        let limit = self.limit.unwrap_or(usize::MAX);
        Ok(records.into_iter().skip(self.offset).take(limit).collect())
    }

    /// Returns the first record, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn first(&self) -> LfbResult<Option<Record>> {
        Ok(self.clone().limit(1).fetch().await?.into_iter().next())
    }

    /// Returns the number of matching records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn count(&self) -> LfbResult<usize> {
        Ok(self.fetch().await?.len())
    }

    /// Returns `true` if any record matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn exists(&self) -> LfbResult<bool> {
        self.store.exists(M::meta().table, &self.predicate).await
    }

    /// Runs the query and projects each record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn values(&self, projection: &Projection) -> LfbResult<Vec<Record>> {
        let meta = M::meta();
        Ok(self
            .fetch()
            .await?
            .iter()
            .map(|r| projection.apply(meta, r))
            .collect())
    }

    /// Runs the query and returns one row of values per record, in the
    /// projection's field order. Missing fields are `Null`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn values_list(&self, projection: &Projection) -> LfbResult<Vec<Vec<Value>>> {
        let fields = projection.fields(M::meta());
        Ok(self
            .fetch()
            .await?
            .iter()
            .map(|r| {
                fields
                    .iter()
                    .map(|f| r.get(f).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect())
    }

    /// Runs the query and returns the values of one field.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn values_flat(&self, field: &str) -> LfbResult<Vec<Value>> {
        Ok(self
            .fetch()
            .await?
            .iter()
            .map(|r| r.get(field).cloned().unwrap_or(Value::Null))
            .collect())
    }
}

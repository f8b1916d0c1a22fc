//! # lfb-db
//!
//! Record query toolkit for the lfb backend. Records are opaque field maps;
//! a [`Model`](model::Model) names their table and declares the well-known
//! fields. Queries are composed from independent strategies on one
//! [`QuerySet`](query::QuerySet) type and run against any
//! [`RecordStore`](store::RecordStore).
//!
//! ## Modules
//!
//! - [`value`] - Field values
//! - [`record`] - The `Record` field map and well-known field names
//! - [`model`] - `Model` trait and `ModelMeta`
//! - [`store`] - `RecordStore` trait and the in-memory store
//! - [`query`] - Predicates, projection, filters, `QuerySet`, CRUD helpers

pub mod model;
pub mod query;
pub mod record;
pub mod store;
pub mod value;

pub use model::{FieldSet, Model, ModelMeta};
pub use query::{DateRange, Lookup, Manager, OrderBy, Projection, QuerySet, Q};
pub use record::Record;
pub use store::{InMemoryStore, RecordStore};
pub use value::Value;

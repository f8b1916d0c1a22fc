//! # lfb
//!
//! The lfb backend toolkit.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! Depend on `lfb` to get everything, or on individual crates for finer-grained
//! control.

/// Errors, settings, logging, and date/type helpers.
pub use lfb_core as core;

/// Records, predicates, models, the record store, and the query builder.
pub use lfb_db as db;

/// Request argument validation.
pub use lfb_forms as forms;

/// Request arguments, the response envelope, sessions, and the login guard.
pub use lfb_http as http;

/// Cache, list queue, and pub/sub.
#[cfg(feature = "cache")]
pub use lfb_cache as cache;

/// Users, roles, permissions, and their handlers.
#[cfg(feature = "account")]
pub use lfb_account as account;

#[cfg(feature = "server")]
pub mod server;

/// Commonly used types.
pub mod prelude {
    pub use lfb_core::{LfbError, LfbResult, Settings, ValidationError};
    pub use lfb_db::{
        DateRange, InMemoryStore, Lookup, Manager, Model, ModelMeta, OrderBy, Projection, Q,
        QuerySet, Record, RecordStore, Value,
    };
    pub use lfb_forms::{ArgSpec, ArgsValidator, ExpectedType};
    pub use lfb_http::{ApiResponse, ApiStatus, LoginRequired, QueryDict, Session};

    #[cfg(feature = "cache")]
    pub use lfb_cache::{CacheBackend, CacheValue, InMemoryCache, ListBackend, PubSub, QueueClient};
}

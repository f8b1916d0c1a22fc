//! # lfb-cache
//!
//! The cache/queue collaborator: key-value entries with optional TTL, lists
//! used as work queues, and publish/subscribe channels.
//!
//! ## Modules
//!
//! - [`cache`] - Backend traits and the in-process [`InMemoryCache`]
//! - [`queue`] - [`QueueClient`], which serializes push-then-expire

pub mod cache;
pub mod queue;

pub use cache::{CacheBackend, CacheValue, InMemoryCache, ListBackend, PubSub};
pub use queue::QueueClient;

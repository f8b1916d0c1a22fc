//! Cache backends.
//!
//! Three traits split the store's surface: [`CacheBackend`] for plain
//! key-value entries, [`ListBackend`] for lists used as queues, and
//! [`PubSub`] for broadcast channels. [`InMemoryCache`] implements all of
//! them in process and is what the tests and a single-node deployment use.
//!
//! A key holds either a single value or a list. Using a list operation on a
//! value key (or the reverse) fails with [`LfbError::Cache`].
//!
//! ```rust,no_run
//! use lfb_cache::{CacheBackend, CacheValue, InMemoryCache};
//! use std::time::Duration;
//!
//! async fn example() {
//!     let cache = InMemoryCache::new();
//!     cache
//!         .set("token", CacheValue::from("abc"), Some(Duration::from_secs(60)))
//!         .await
//!         .unwrap();
//!     assert!(cache.has_key("token").await.unwrap());
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lfb_core::{LfbError, LfbResult};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

/// Capacity of each pub/sub channel. Slow subscribers lag past this.
const CHANNEL_CAPACITY: usize = 64;

/// A value that can be stored in the cache or sent on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheValue {
    /// A string value.
    String(String),
    /// A 64-bit integer value.
    Integer(i64),
    /// A JSON value.
    Json(serde_json::Value),
}

impl CacheValue {
    /// Returns the value as a string, if it is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an `Integer` variant.
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for CacheValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for CacheValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<serde_json::Value> for CacheValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

/// Key-value operations.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the live value under `key`.
    async fn get(&self, key: &str) -> LfbResult<Option<CacheValue>>;

    /// Stores `value` under `key`, replacing whatever was there. `None`
    /// means the entry never expires.
    async fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> LfbResult<()>;

    /// Removes `key`. Returns `true` if a live entry was removed.
    async fn delete(&self, key: &str) -> LfbResult<bool>;

    /// Returns `true` if `key` holds a live entry of either kind.
    async fn has_key(&self, key: &str) -> LfbResult<bool>;

    /// Sets the time to live of an existing key. Returns `false` if the key
    /// is absent or already expired.
    async fn expire(&self, key: &str, ttl: Duration) -> LfbResult<bool>;

    /// Removes every entry.
    async fn clear(&self) -> LfbResult<()>;
}

/// List operations. Lists are created on first push and vanish when the
/// last element is popped.
#[async_trait]
pub trait ListBackend: Send + Sync {
    /// Pushes `values` to the head, one at a time. Returns the new length.
    async fn lpush(&self, key: &str, values: Vec<CacheValue>) -> LfbResult<usize>;

    /// Pushes `values` to the tail. Returns the new length.
    async fn rpush(&self, key: &str, values: Vec<CacheValue>) -> LfbResult<usize>;

    /// Pops from the head.
    async fn lpop(&self, key: &str) -> LfbResult<Option<CacheValue>>;

    /// Pops from the tail.
    async fn rpop(&self, key: &str) -> LfbResult<Option<CacheValue>>;

    /// The list length; `0` for a missing key.
    async fn llen(&self, key: &str) -> LfbResult<usize>;

    /// Elements `start..=stop`. Negative indexes count from the tail, so
    /// `lrange(key, 0, -1)` is the whole list.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> LfbResult<Vec<CacheValue>>;
}

/// Publish/subscribe channels.
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Sends `message` to every current subscriber of `channel`. Returns the
    /// number of subscribers reached.
    async fn publish(&self, channel: &str, message: CacheValue) -> LfbResult<usize>;

    /// Subscribes to `channel`. Messages published before this call are not
    /// delivered.
    async fn subscribe(&self, channel: &str) -> LfbResult<broadcast::Receiver<CacheValue>>;
}

#[derive(Debug, Clone)]
enum Slot {
    Value(CacheValue),
    List(VecDeque<CacheValue>),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    slot: Slot,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

fn wrong_type(key: &str) -> LfbError {
    LfbError::Cache(format!("key '{key}' holds the wrong kind of value"))
}

/// In-process cache with TTL, lists, and channels.
///
/// Uses `RwLock<HashMap>` for entries. Expired entries read as absent and
/// are swept on every `set` and push. A channel is dropped once a publish
/// finds no subscribers left. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<CacheValue>>>>,
}

impl InMemoryCache {
    /// Creates a new empty in-memory cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones not yet swept included.
    pub async fn entry_count(&self) -> usize {
        self.store.read().await.len()
    }

    /// Number of open channels.
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    fn sweep(store: &mut HashMap<String, CacheEntry>) {
        store.retain(|_, entry| !entry.is_expired());
    }

    async fn push(&self, key: &str, values: Vec<CacheValue>, front: bool) -> LfbResult<usize> {
        let mut store = self.store.write().await;
        Self::sweep(&mut store);
        let entry = store.entry(key.to_string()).or_insert_with(|| CacheEntry {
            slot: Slot::List(VecDeque::new()),
            expires_at: None,
        });
        let Slot::List(list) = &mut entry.slot else {
            return Err(wrong_type(key));
        };
        for value in values {
            if front {
                list.push_front(value);
            } else {
                list.push_back(value);
            }
        }
        Ok(list.len())
    }

    async fn pop(&self, key: &str, front: bool) -> LfbResult<Option<CacheValue>> {
        let mut store = self.store.write().await;
        let Some(entry) = store.get_mut(key) else {
            return Ok(None);
        };
        if entry.is_expired() {
            store.remove(key);
            return Ok(None);
        }
        let Slot::List(list) = &mut entry.slot else {
            return Err(wrong_type(key));
        };
        let popped = if front {
            list.pop_front()
        } else {
            list.pop_back()
        };
        if list.is_empty() {
            store.remove(key);
        }
        Ok(popped)
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> LfbResult<Option<CacheValue>> {
        let store = self.store.read().await;
        match store.get(key) {
            Some(entry) if !entry.is_expired() => match &entry.slot {
                Slot::Value(value) => Ok(Some(value.clone())),
                Slot::List(_) => Err(wrong_type(key)),
            },
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> LfbResult<()> {
        let mut store = self.store.write().await;
        Self::sweep(&mut store);
        let expires_at = ttl.map(|d| Instant::now() + d);
        store.insert(
            key.to_string(),
            CacheEntry {
                slot: Slot::Value(value),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> LfbResult<bool> {
        let mut store = self.store.write().await;
        Ok(store.remove(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn has_key(&self, key: &str) -> LfbResult<bool> {
        let store = self.store.read().await;
        Ok(store.get(key).is_some_and(|entry| !entry.is_expired()))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> LfbResult<bool> {
        let mut store = self.store.write().await;
        match store.get_mut(key) {
            Some(entry) if !entry.is_expired() => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            Some(_) => {
                store.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn clear(&self) -> LfbResult<()> {
        self.store.write().await.clear();
        Ok(())
    }
}

#[async_trait]
impl ListBackend for InMemoryCache {
    async fn lpush(&self, key: &str, values: Vec<CacheValue>) -> LfbResult<usize> {
        self.push(key, values, true).await
    }

    async fn rpush(&self, key: &str, values: Vec<CacheValue>) -> LfbResult<usize> {
        self.push(key, values, false).await
    }

    async fn lpop(&self, key: &str) -> LfbResult<Option<CacheValue>> {
        self.pop(key, true).await
    }

    async fn rpop(&self, key: &str) -> LfbResult<Option<CacheValue>> {
        self.pop(key, false).await
    }

    async fn llen(&self, key: &str) -> LfbResult<usize> {
        let store = self.store.read().await;
        match store.get(key) {
            Some(entry) if !entry.is_expired() => match &entry.slot {
                Slot::List(list) => Ok(list.len()),
                Slot::Value(_) => Err(wrong_type(key)),
            },
            _ => Ok(0),
        }
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> LfbResult<Vec<CacheValue>> {
        let store = self.store.read().await;
        let list = match store.get(key) {
            Some(entry) if !entry.is_expired() => match &entry.slot {
                Slot::List(list) => list,
                Slot::Value(_) => return Err(wrong_type(key)),
            },
            _ => return Ok(Vec::new()),
        };
        let len = i64::try_from(list.len()).unwrap_or(i64::MAX);
        let resolve = |index: i64| if index < 0 { len + index } else { index };
        let start = resolve(start).max(0);
        let stop = resolve(stop).min(len - 1);
        if start > stop {
            return Ok(Vec::new());
        }
        let (Ok(start), Ok(stop)) = (usize::try_from(start), usize::try_from(stop)) else {
            return Ok(Vec::new());
        };
        Ok(list.range(start..=stop).cloned().collect())
    }
}

#[async_trait]
impl PubSub for InMemoryCache {
    async fn publish(&self, channel: &str, message: CacheValue) -> LfbResult<usize> {
        let mut channels = self.channels.write().await;
        let Some(tx) = channels.get(channel) else {
            return Ok(0);
        };
        if let Ok(delivered) = tx.send(message) {
            return Ok(delivered);
        }
        // Every receiver is gone.
        channels.remove(channel);
        Ok(0)
    }

    async fn subscribe(&self, channel: &str) -> LfbResult<broadcast::Receiver<CacheValue>> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Ok(tx.subscribe())
    }
}

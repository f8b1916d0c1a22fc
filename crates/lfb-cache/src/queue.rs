//! Queue client over a cache backend.
//!
//! [`QueueClient`] is the handle request code uses. A push and the TTL
//! refresh that follows it run under one mutex, so two concurrent pushes to
//! the same client never interleave between the push and the expire. The
//! lock is a guard that drops on every exit path, including backend errors.
//! Pops and reads do not take the lock.
//!
//! Every backend failure is logged and surfaced as [`LfbError::Cache`].

use std::time::Duration;

use lfb_core::settings::Settings;
use lfb_core::{LfbError, LfbResult};
use tokio::sync::{broadcast, Mutex};

use crate::cache::{CacheBackend, CacheValue, ListBackend, PubSub};

/// A queue and cache handle.
///
/// # Examples
///
/// ```
/// use lfb_cache::{CacheValue, InMemoryCache, QueueClient};
/// use std::time::Duration;
///
/// tokio_test::block_on(async {
///     let client = QueueClient::new(InMemoryCache::new(), Some(Duration::from_secs(60)));
///     client.rpush("jobs", vec![CacheValue::from("a")]).await.unwrap();
///     assert_eq!(client.lpop("jobs").await.unwrap(), Some(CacheValue::from("a")));
/// });
/// ```
#[derive(Debug)]
pub struct QueueClient<B> {
    backend: B,
    push_lock: Mutex<()>,
    default_ttl: Option<Duration>,
}

fn cache_failure(op: &'static str, key: &str, err: LfbError) -> LfbError {
    tracing::error!(op, key, error = %err, "cache operation failed");
    match err {
        LfbError::Cache(_) => err,
        other => LfbError::Cache(other.to_string()),
    }
}

impl<B> QueueClient<B>
where
    B: CacheBackend + ListBackend + PubSub,
{
    /// Wraps `backend`. Pushed lists get `default_ttl` unless a push names
    /// its own.
    pub fn new(backend: B, default_ttl: Option<Duration>) -> Self {
        Self {
            backend,
            push_lock: Mutex::new(()),
            default_ttl,
        }
    }

    /// Wraps `backend` with `cache.timeout` as the default TTL. A timeout of
    /// `0` means pushed lists never expire.
    pub fn from_settings(backend: B, settings: &Settings) -> Self {
        let ttl = (settings.cache.timeout > 0).then(|| Duration::from_secs(settings.cache.timeout));
        Self::new(backend, ttl)
    }

    /// The wrapped backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Pushes to the head and refreshes the list's TTL.
    pub async fn lpush(&self, key: &str, values: Vec<CacheValue>) -> LfbResult<usize> {
        self.lpush_with_ttl(key, values, self.default_ttl).await
    }

    /// Pushes to the tail and refreshes the list's TTL.
    pub async fn rpush(&self, key: &str, values: Vec<CacheValue>) -> LfbResult<usize> {
        self.rpush_with_ttl(key, values, self.default_ttl).await
    }

    /// [`lpush`](Self::lpush) with an explicit TTL.
    pub async fn lpush_with_ttl(
        &self,
        key: &str,
        values: Vec<CacheValue>,
        ttl: Option<Duration>,
    ) -> LfbResult<usize> {
        let _guard = self.push_lock.lock().await;
        let len = self
            .backend
            .lpush(key, values)
            .await
            .map_err(|e| cache_failure("lpush", key, e))?;
        self.refresh_ttl(key, ttl).await?;
        tracing::debug!(key, len, "lpush");
        Ok(len)
    }

    /// [`rpush`](Self::rpush) with an explicit TTL.
    pub async fn rpush_with_ttl(
        &self,
        key: &str,
        values: Vec<CacheValue>,
        ttl: Option<Duration>,
    ) -> LfbResult<usize> {
        let _guard = self.push_lock.lock().await;
        let len = self
            .backend
            .rpush(key, values)
            .await
            .map_err(|e| cache_failure("rpush", key, e))?;
        self.refresh_ttl(key, ttl).await?;
        tracing::debug!(key, len, "rpush");
        Ok(len)
    }

    async fn refresh_ttl(&self, key: &str, ttl: Option<Duration>) -> LfbResult<()> {
        if let Some(ttl) = ttl {
            self.backend
                .expire(key, ttl)
                .await
                .map_err(|e| cache_failure("expire", key, e))?;
        }
        Ok(())
    }

    /// Pops from the head.
    pub async fn lpop(&self, key: &str) -> LfbResult<Option<CacheValue>> {
        self.backend
            .lpop(key)
            .await
            .map_err(|e| cache_failure("lpop", key, e))
    }

    /// Pops from the tail.
    pub async fn rpop(&self, key: &str) -> LfbResult<Option<CacheValue>> {
        self.backend
            .rpop(key)
            .await
            .map_err(|e| cache_failure("rpop", key, e))
    }

    /// The queue length.
    pub async fn len(&self, key: &str) -> LfbResult<usize> {
        self.backend
            .llen(key)
            .await
            .map_err(|e| cache_failure("llen", key, e))
    }

    /// The whole queue, head first.
    pub async fn items(&self, key: &str) -> LfbResult<Vec<CacheValue>> {
        self.backend
            .lrange(key, 0, -1)
            .await
            .map_err(|e| cache_failure("lrange", key, e))
    }

    /// Reads a plain entry.
    pub async fn get(&self, key: &str) -> LfbResult<Option<CacheValue>> {
        self.backend
            .get(key)
            .await
            .map_err(|e| cache_failure("get", key, e))
    }

    /// Writes a plain entry.
    pub async fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> LfbResult<()> {
        self.backend
            .set(key, value, ttl)
            .await
            .map_err(|e| cache_failure("set", key, e))
    }

    /// Deletes an entry of either kind.
    pub async fn delete(&self, key: &str) -> LfbResult<bool> {
        self.backend
            .delete(key)
            .await
            .map_err(|e| cache_failure("delete", key, e))
    }

    /// Publishes on a channel.
    pub async fn publish(&self, channel: &str, message: CacheValue) -> LfbResult<usize> {
        self.backend
            .publish(channel, message)
            .await
            .map_err(|e| cache_failure("publish", channel, e))
    }

    /// Subscribes to a channel.
    pub async fn subscribe(&self, channel: &str) -> LfbResult<broadcast::Receiver<CacheValue>> {
        self.backend
            .subscribe(channel)
            .await
            .map_err(|e| cache_failure("subscribe", channel, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;

    #[tokio::test(start_paused = true)]
    async fn test_push_applies_default_ttl() {
        let client = QueueClient::new(InMemoryCache::new(), Some(Duration::from_secs(30)));
        client.rpush("q", vec![CacheValue::from("a")]).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(client.len("q").await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_refreshes_ttl() {
        let client = QueueClient::new(InMemoryCache::new(), Some(Duration::from_secs(30)));
        client.rpush("q", vec![CacheValue::from("a")]).await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;
        client.lpush("q", vec![CacheValue::from("b")]).await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(
            client.items("q").await.unwrap(),
            vec![CacheValue::from("b"), CacheValue::from("a")]
        );
    }

    #[tokio::test]
    async fn test_failed_push_releases_lock() {
        let client = QueueClient::new(InMemoryCache::new(), None);
        client.set("k", CacheValue::from("v"), None).await.unwrap();
        let err = client.rpush("k", vec![CacheValue::from("x")]).await.unwrap_err();
        assert!(matches!(err, LfbError::Cache(_)));
        assert_eq!(client.rpush("q", vec![CacheValue::from("x")]).await.unwrap(), 1);
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        let client = QueueClient::from_settings(InMemoryCache::new(), &settings);
        assert_eq!(client.default_ttl, Some(Duration::from_secs(300)));
        settings.cache.timeout = 0;
        let client = QueueClient::from_settings(InMemoryCache::new(), &settings);
        assert_eq!(client.default_ttl, None);
    }
}

// Copyright 2025 Cowboy AI, LLC.

//! Failure-swallowing cache decorator

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::CacheBackend;

/// Decorator that converts every cache failure into a miss or a no-op
///
/// The orchestration service only ever talks to the cache through this
/// wrapper: reads that fail are misses, writes and deletes that fail are
/// no-ops. Failures are logged at warn and never surface to callers.
pub struct ResilientCache<C> {
    inner: Arc<C>,
}

impl<C> Clone for ResilientCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CacheBackend> ResilientCache<C> {
    /// Wrap a concrete cache backend
    pub fn new(inner: C) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Wrap an already shared backend
    pub fn from_arc(inner: Arc<C>) -> Self {
        Self { inner }
    }

    /// The wrapped backend
    pub fn backend(&self) -> &C {
        &self.inner
    }

    /// Look up a value; failures read as misses
    pub async fn get(&self, key: &str) -> Option<Value> {
        match self.inner.get(key).await {
            Ok(value) => value,
            Err(error) => {
                warn!(key, %error, "cache get failed, treating as miss");
                None
            }
        }
    }

    /// Store a value; failures are dropped
    pub async fn set(&self, key: &str, value: Value, ttl: Duration) {
        if let Err(error) = self.inner.set(key, value, ttl).await {
            warn!(key, %error, "cache set failed, skipping");
        } else {
            debug!(key, "cache set");
        }
    }

    /// Remove a key; failures are dropped
    pub async fn delete(&self, key: &str) {
        if let Err(error) = self.inner.delete(key).await {
            warn!(key, %error, "cache delete failed, skipping");
        }
    }

    /// Remove several keys; failures are dropped
    pub async fn delete_many(&self, keys: &[String]) {
        if let Err(error) = self.inner.delete_many(keys).await {
            warn!(?keys, %error, "cache delete_many failed, skipping");
        }
    }

    /// Remove every key with the given prefix; failures are dropped
    pub async fn invalidate_prefix(&self, prefix: &str) {
        if let Err(error) = self.inner.invalidate_prefix(prefix).await {
            warn!(prefix, %error, "cache prefix invalidation failed, skipping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryCache};
    use async_trait::async_trait;
    use serde_json::json;

    struct FailingBackend;

    #[async_trait]
    impl CacheBackend for FailingBackend {
        async fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        async fn invalidate_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failures_become_misses_and_noops() {
        let cache = ResilientCache::new(FailingBackend);

        assert_eq!(cache.get("calc:a").await, None);
        cache.set("calc:a", json!(1), Duration::from_secs(1)).await;
        cache.delete("calc:a").await;
        cache.delete_many(&["calc:a".to_string()]).await;
        cache.invalidate_prefix("calc:").await;
    }

    #[tokio::test]
    async fn test_healthy_backend_passes_through() {
        let cache = ResilientCache::new(MemoryCache::default());

        cache.set("calc:a", json!(7), Duration::from_secs(60)).await;
        assert_eq!(cache.get("calc:a").await, Some(json!(7)));

        cache.delete("calc:a").await;
        assert_eq!(cache.get("calc:a").await, None);
    }
}

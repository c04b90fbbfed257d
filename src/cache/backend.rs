// Copyright 2025 Cowboy AI, LLC.

//! Cache backend contract, key builders and TTL policy

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Cache operation errors
///
/// Never propagated past the resilience wrapper; the cache is strictly a
/// non-critical accelerator.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Failure from the underlying store
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Error encoding or decoding a cached payload
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// Key/TTL cache contract
///
/// Implemented by in-process, networked and edge key-value stores; all
/// operations are asynchronous. Payloads are JSON values so every backend
/// stores the same serialized entity shape.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a value, `None` on miss
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store a value with a time-to-live
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Remove a single key; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove several keys
    async fn delete_many(&self, keys: &[String]) -> Result<(), CacheError> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    /// Remove every key starting with `prefix`, returning how many
    async fn invalidate_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
}

/// Cache key builders for the calculation domain
///
/// All keys share the `calc:` prefix so a whole-domain flush is a single
/// prefix invalidation.
pub mod keys {
    use crate::entity::{OperationId, RootId};

    /// Common prefix of every calculation cache key
    pub const PREFIX: &str = "calc";

    /// Every root with its complete tree
    pub fn full_tree() -> String {
        format!("{PREFIX}:full-tree")
    }

    /// Flat listing of roots (fed by outer layers)
    pub fn root_list() -> String {
        format!("{PREFIX}:roots")
    }

    /// A single root with its tree
    pub fn root(id: RootId) -> String {
        format!("{PREFIX}:root:{id}")
    }

    /// A root's direct operations
    pub fn root_operations(id: RootId) -> String {
        format!("{PREFIX}:root:{id}:operations")
    }

    /// A single operation
    pub fn operation(id: OperationId) -> String {
        format!("{PREFIX}:operation:{id}")
    }

    /// An operation's direct children
    pub fn operation_children(id: OperationId) -> String {
        format!("{PREFIX}:operation:{id}:children")
    }
}

/// Time-to-live policy for cached calculation entries
///
/// The full tree is the most volatile aggregate and gets the shortest
/// TTL; single-root and single-operation reads are less volatile in
/// aggregate and live longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// TTL of the full-tree entry
    pub full_tree: Duration,
    /// TTL of single-root entries
    pub root: Duration,
    /// TTL of single-operation entries
    pub operation: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            full_tree: Duration::from_secs(60),
            root: Duration::from_secs(300),
            operation: Duration::from_secs(300),
        }
    }
}

impl CacheTtls {
    /// Create the default TTL policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full-tree TTL
    pub fn with_full_tree(mut self, ttl: Duration) -> Self {
        self.full_tree = ttl;
        self
    }

    /// Set the single-root TTL
    pub fn with_root(mut self, ttl: Duration) -> Self {
        self.root = ttl;
        self
    }

    /// Set the single-operation TTL
    pub fn with_operation(mut self, ttl: Duration) -> Self {
        self.operation = ttl;
        self
    }
}

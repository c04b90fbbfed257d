// Copyright 2025 Cowboy AI, LLC.

//! Calculation orchestration service
//!
//! The central coordinator between the persistence and cache boundaries:
//! cache-aside reads, transactional writes with optimistic cache
//! invalidation, and compensating re-invalidation on failed writes.
//!
//! ```mermaid
//! graph LR
//!     A[API layer] --> S[CalculationService]
//!     S -->|miss / write| U[UnitOfWork]
//!     S -->|get / set / delete| R[ResilientCache]
//!     U --> P[(storage)]
//! ```
//!
//! The pre-write invalidation and the transaction are not atomic with
//! respect to concurrent readers: a reader can repopulate a key with
//! now-stale data in the window between them. That eventual-consistency
//! window is accepted; the post-commit `FULL_TREE` delete bounds it.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{keys, CacheBackend, CacheTtls, ResilientCache};
use crate::entity::{OperationId, RootId};
use crate::errors::{DomainError, DomainResult};
use crate::operation::{CalculationOperation, ParentRef};
use crate::operator::Operator;
use crate::persistence::{CalculationRepository, UnitOfWork};
use crate::root::CalculationRoot;

/// Input for creating a calculation root
#[derive(Debug, Clone)]
pub struct CreateRootInput {
    /// Starting value of the tree
    pub value: f64,
    /// Owner attribution
    pub user_id: String,
    /// Denormalized owner display label
    pub username: Option<String>,
}

/// Input for creating a calculation operation
///
/// Exactly one of the two parent ids must be supplied; `operator` must be
/// one of the four canonical names.
#[derive(Debug, Clone)]
pub struct CreateOperationInput {
    /// Parent root reference, when extending a root's value
    pub parent_root_id: Option<RootId>,
    /// Parent operation reference, when extending another operation's result
    pub parent_operation_id: Option<OperationId>,
    /// Canonical operator name
    pub operator: String,
    /// Operand consumed by the operator
    pub operand: f64,
    /// Owner attribution
    pub user_id: String,
    /// Denormalized owner display label
    pub username: Option<String>,
}

/// Coordinates entity construction, transactional persistence and
/// cache-aside reads for calculation trees
///
/// Stateless beyond its two collaborators; safe for concurrent
/// independent calls.
pub struct CalculationService<U, C> {
    uow: Arc<U>,
    cache: ResilientCache<C>,
    ttls: CacheTtls,
}

impl<U, C> CalculationService<U, C>
where
    U: UnitOfWork + 'static,
    C: CacheBackend + 'static,
{
    /// Create a service with the default TTL policy
    ///
    /// The concrete cache backend is wrapped in the resilience decorator;
    /// the service never observes a cache failure.
    pub fn new(uow: Arc<U>, cache: C) -> Self {
        Self::with_ttls(uow, cache, CacheTtls::default())
    }

    /// Create a service with an explicit TTL policy
    pub fn with_ttls(uow: Arc<U>, cache: C, ttls: CacheTtls) -> Self {
        Self {
            uow,
            cache: ResilientCache::new(cache),
            ttls,
        }
    }

    /// Load every root with its complete operation tree
    ///
    /// Cache-aside: a cache hit never touches persistence; a miss loads
    /// from storage and repopulates the cache in the background without
    /// delaying the caller.
    pub async fn get_full_tree(&self) -> DomainResult<Vec<CalculationRoot>> {
        let key = keys::full_tree();
        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_value::<Vec<CalculationRoot>>(cached) {
                Ok(roots) => {
                    debug!(%key, "full tree served from cache");
                    return Ok(roots);
                }
                Err(error) => {
                    warn!(%key, %error, "corrupt cache entry, falling through to storage");
                    self.cache.delete(&key).await;
                }
            }
        }

        let roots = self
            .uow
            .run_in_transaction(|repo| async move { repo.find_all_roots_with_operations().await })
            .await?;
        debug!(count = roots.len(), "full tree loaded from storage");
        self.cache_in_background(key, &roots, self.ttls.full_tree);
        Ok(roots)
    }

    /// Load a single root with its tree, or `None` if it does not exist
    pub async fn get_root_by_id(&self, id: RootId) -> DomainResult<Option<CalculationRoot>> {
        let key = keys::root(id);
        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_value::<CalculationRoot>(cached) {
                Ok(root) => {
                    debug!(%key, "root served from cache");
                    return Ok(Some(root));
                }
                Err(error) => {
                    warn!(%key, %error, "corrupt cache entry, falling through to storage");
                    self.cache.delete(&key).await;
                }
            }
        }

        let loaded = self
            .uow
            .run_in_transaction(move |repo| async move { repo.find_root_with_operations(id).await })
            .await?;
        if let Some(root) = &loaded {
            self.cache_in_background(key, root, self.ttls.root);
        }
        Ok(loaded)
    }

    /// Create a new calculation root
    ///
    /// Propagates [`DomainError::InvalidValue`] for a non-finite starting
    /// value. The list-shaped cache keys are invalidated before the write
    /// and re-invalidated if it fails.
    pub async fn create_root(&self, input: CreateRootInput) -> DomainResult<CalculationRoot> {
        let write_keys = vec![keys::root_list(), keys::full_tree()];
        self.cache.delete_many(&write_keys).await;

        let result = self
            .uow
            .run_in_transaction(move |repo| async move {
                let root = CalculationRoot::new(input.value, input.user_id, input.username)?;
                repo.save_root(&root).await?;
                Ok(root)
            })
            .await;

        match result {
            Ok(root) => {
                info!(root_id = %root.id(), value = root.value(), "calculation root created");
                if let Some(payload) = encode(&root) {
                    self.cache
                        .set(&keys::root(root.id()), payload, self.ttls.root)
                        .await;
                }
                // Force the next full-tree read to rebuild rather than
                // patching the cached list in place
                self.cache.delete(&keys::full_tree()).await;
                Ok(root)
            }
            Err(error) => {
                self.cache.delete_many(&write_keys).await;
                Err(error)
            }
        }
    }

    /// Create a new operation extending a root or another operation
    ///
    /// Resolves the parent's current value inside the transaction, so the
    /// stored result snapshot is computed against the freshest committed
    /// state.
    pub async fn create_operation(
        &self,
        input: CreateOperationInput,
    ) -> DomainResult<CalculationOperation> {
        // Cardinality is checked before any cache or transaction work
        let parent = ParentRef::from_ids(input.parent_root_id, input.parent_operation_id)?;
        let write_keys = parent_scoped_keys(parent);
        self.cache.delete_many(&write_keys).await;

        let result = self
            .uow
            .run_in_transaction(move |repo| async move {
                let parent_value = match parent {
                    ParentRef::Root(id) => repo
                        .find_root_by_id(id)
                        .await?
                        .ok_or(DomainError::ParentRootNotFound(id))?
                        .value(),
                    ParentRef::Operation(id) => repo
                        .find_operation_by_id(id)
                        .await?
                        .ok_or(DomainError::ParentOperationNotFound(id))?
                        .result(),
                };
                let operator = Operator::parse(&input.operator)?;
                let operation = CalculationOperation::new(
                    parent,
                    operator,
                    input.operand,
                    parent_value,
                    input.user_id,
                    input.username,
                )?;
                repo.save_operation(&operation).await?;
                Ok(operation)
            })
            .await;

        match result {
            Ok(operation) => {
                info!(
                    operation_id = %operation.id(),
                    step = %operation.display_string(),
                    "calculation operation created"
                );
                if let Some(payload) = encode(&operation) {
                    self.cache
                        .set(&keys::operation(operation.id()), payload, self.ttls.operation)
                        .await;
                }
                self.cache.delete(&keys::full_tree()).await;
                Ok(operation)
            }
            Err(error) => {
                self.cache.delete_many(&write_keys).await;
                Err(error)
            }
        }
    }

    /// Repopulate a cache key without delaying the caller
    ///
    /// Serialization happens inline; the write itself is detached and can
    /// only fail into the resilience wrapper's warn log.
    fn cache_in_background<T: Serialize>(&self, key: String, value: &T, ttl: Duration) {
        let Some(payload) = encode(value) else {
            return;
        };
        let cache = self.cache.clone();
        tokio::spawn(async move {
            cache.set(&key, payload, ttl).await;
        });
    }
}

/// Cache keys invalidated around a write touching the given parent
fn parent_scoped_keys(parent: ParentRef) -> Vec<String> {
    match parent {
        ParentRef::Root(id) => vec![
            keys::full_tree(),
            keys::root(id),
            keys::root_operations(id),
        ],
        ParentRef::Operation(id) => vec![
            keys::full_tree(),
            keys::operation(id),
            keys::operation_children(id),
        ],
    }
}

fn encode<T: Serialize>(value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(payload) => Some(payload),
        Err(error) => {
            warn!(%error, "failed to serialize cache payload, skipping cache write");
            None
        }
    }
}

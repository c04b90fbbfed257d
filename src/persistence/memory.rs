// Copyright 2025 Cowboy AI, LLC.

//! In-memory storage adapter
//!
//! Reference implementation of the repository and unit-of-work contracts,
//! used by the integration tests and as a template for real adapters.
//! Transactions snapshot the whole store and restore it on error; nested
//! transactions join the active one via a task-local marker.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};

use crate::entity::{OperationId, RootId};
use crate::errors::{DomainError, DomainResult};
use crate::operation::CalculationOperation;
use crate::persistence::{CalculationRepository, OperationRow, RootRow, UnitOfWork};
use crate::root::CalculationRoot;
use crate::tree;

tokio::task_local! {
    static ACTIVE_TRANSACTION: ();
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    roots: IndexMap<RootId, RootRow>,
    operations: IndexMap<OperationId, OperationRow>,
}

impl StoreState {
    fn root_rows_ordered(&self) -> Vec<RootRow> {
        let mut rows: Vec<RootRow> = self.roots.values().cloned().collect();
        rows.sort_by_key(|row| row.created_at);
        rows
    }

    fn operation_rows_ordered(&self) -> Vec<OperationRow> {
        let mut rows: Vec<OperationRow> = self.operations.values().cloned().collect();
        rows.sort_by_key(|row| row.created_at);
        rows
    }
}

/// Repository over a shared in-memory row store
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryRepository {
    fn new(state: Arc<Mutex<StoreState>>) -> Self {
        Self { state }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // Lock poisoning only happens after a panic in another holder;
        // the store is still the best available state
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl CalculationRepository for InMemoryRepository {
    async fn find_all_roots_with_operations(&self) -> DomainResult<Vec<CalculationRoot>> {
        let (root_rows, operation_rows) = {
            let state = self.lock();
            (state.root_rows_ordered(), state.operation_rows_ordered())
        };
        tree::assemble_forest(root_rows, operation_rows)
    }

    async fn find_root_by_id(&self, id: RootId) -> DomainResult<Option<CalculationRoot>> {
        let row = self.lock().roots.get(&id).cloned();
        Ok(row.map(RootRow::into_entity))
    }

    async fn find_root_with_operations(&self, id: RootId) -> DomainResult<Option<CalculationRoot>> {
        let (root_row, operation_rows) = {
            let state = self.lock();
            (state.roots.get(&id).cloned(), state.operation_rows_ordered())
        };
        match root_row {
            Some(row) => Ok(Some(tree::assemble_root(row, operation_rows)?)),
            None => Ok(None),
        }
    }

    async fn find_operation_by_id(
        &self,
        id: OperationId,
    ) -> DomainResult<Option<CalculationOperation>> {
        let row = self.lock().operations.get(&id).cloned();
        row.map(OperationRow::into_entity).transpose()
    }

    async fn save_root(&self, root: &CalculationRoot) -> DomainResult<()> {
        let mut state = self.lock();
        if state.roots.contains_key(&root.id()) {
            return Err(DomainError::storage(format!(
                "duplicate root id {}",
                root.id()
            )));
        }
        state.roots.insert(root.id(), RootRow::from(root));
        Ok(())
    }

    async fn save_operation(&self, operation: &CalculationOperation) -> DomainResult<()> {
        let mut state = self.lock();
        if state.operations.contains_key(&operation.id()) {
            return Err(DomainError::storage(format!(
                "duplicate operation id {}",
                operation.id()
            )));
        }
        // Parent foreign keys, as a relational store would enforce them
        let row = OperationRow::from(operation);
        if let Some(root_id) = row.parent_root_id {
            if !state.roots.contains_key(&root_id) {
                return Err(DomainError::storage(format!(
                    "parent root {root_id} does not exist"
                )));
            }
        }
        if let Some(parent_id) = row.parent_operation_id {
            if !state.operations.contains_key(&parent_id) {
                return Err(DomainError::storage(format!(
                    "parent operation {parent_id} does not exist"
                )));
            }
        }
        state.operations.insert(operation.id(), row);
        Ok(())
    }
}

/// In-memory unit of work with snapshot rollback
pub struct InMemoryUnitOfWork {
    state: Arc<Mutex<StoreState>>,
    repository: InMemoryRepository,
    tx_guard: tokio::sync::Mutex<()>,
}

impl InMemoryUnitOfWork {
    /// Create a unit of work over a fresh empty store
    pub fn new() -> Self {
        let state = Arc::new(Mutex::new(StoreState::default()));
        let repository = InMemoryRepository::new(Arc::clone(&state));
        Self {
            state,
            repository,
            tx_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Direct, non-transactional repository access
    pub fn repository(&self) -> &InMemoryRepository {
        &self.repository
    }

    fn snapshot(&self) -> StoreState {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn restore(&self, snapshot: StoreState) {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = snapshot;
    }
}

impl Default for InMemoryUnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    type Repository = InMemoryRepository;

    async fn run_in_transaction<T, F, Fut>(&self, work: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Self::Repository) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = DomainResult<T>> + Send + 'static,
    {
        // A nested call joins the transaction already active on this task
        if ACTIVE_TRANSACTION.try_with(|_| ()).is_ok() {
            return work(self.repository.clone()).await;
        }

        let _guard = self.tx_guard.lock().await;
        let snapshot = self.snapshot();
        let result = ACTIVE_TRANSACTION
            .scope((), work(self.repository.clone()))
            .await;
        if result.is_err() {
            self.restore(snapshot);
        }
        result
    }
}

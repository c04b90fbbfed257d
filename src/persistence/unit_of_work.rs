// Copyright 2025 Cowboy AI, LLC.

//! Transactional unit-of-work capability

use async_trait::async_trait;
use std::future::Future;

use crate::errors::DomainResult;
use crate::persistence::CalculationRepository;

/// Executes work against a transaction-scoped repository
///
/// The transaction either fully commits or fully rolls back: an `Err`
/// returned from the closure must undo every write the closure performed.
/// Implementations must collapse nested transactions: a
/// `run_in_transaction` call made while a transaction is already active on
/// the current task joins it instead of opening a new one.
///
/// The closure receives an owned repository handle scoped to the
/// transaction; handles are cheap clones over shared connection state.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Repository handle type given to transactional closures
    type Repository: CalculationRepository + Clone + Send + Sync + 'static;

    /// Run `work` inside a transaction, rolling back on error
    async fn run_in_transaction<T, F, Fut>(&self, work: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Self::Repository) -> Fut + Send + 'static,
        Fut: Future<Output = DomainResult<T>> + Send + 'static;
}

// Copyright 2025 Cowboy AI, LLC.

//! Repository contract and persisted row shapes
//!
//! The repository is implemented by external storage adapters; the core
//! only depends on this contract. Adapters load flat parent-pointer rows
//! and must hand back fully assembled trees; [`crate::tree`] provides the
//! shared assembly so every adapter reconstructs the same nested shape.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{OperationId, RootId};
use crate::errors::{DomainError, DomainResult};
use crate::operation::{CalculationOperation, ParentRef};
use crate::operator::Operator;
use crate::root::CalculationRoot;

/// Persisted shape of a calculation root
///
/// Relational targets store `value` as a high-precision decimal
/// (20 digits, 10 fractional in the reference schema); the core computes
/// in binary `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootRow {
    /// Entity identifier
    pub id: RootId,
    /// Starting value
    pub value: f64,
    /// Owner attribution
    pub user_id: String,
    /// Denormalized owner display label
    pub username: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp
    pub updated_at: DateTime<Utc>,
}

impl RootRow {
    /// Reconstruct the entity from this row via the trusted factory
    pub fn into_entity(self) -> CalculationRoot {
        CalculationRoot::from_persisted(
            self.id,
            self.value,
            self.user_id,
            self.username,
            self.created_at,
            self.updated_at,
        )
    }
}

impl From<&CalculationRoot> for RootRow {
    fn from(root: &CalculationRoot) -> Self {
        Self {
            id: root.id(),
            value: root.value(),
            user_id: root.user_id().to_string(),
            username: root.username().map(str::to_string),
            created_at: root.created_at(),
            updated_at: root.updated_at(),
        }
    }
}

/// Persisted shape of a calculation operation
///
/// The tree edge is encoded as two nullable parent columns with exactly
/// one set; both carry indexes in the reference schema, plus one on
/// `created_at` for ordered tree queries. `operand` and `result` use the
/// same decimal precision as [`RootRow::value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRow {
    /// Entity identifier
    pub id: OperationId,
    /// Parent root reference, when the parent is a root
    pub parent_root_id: Option<RootId>,
    /// Parent operation reference, when the parent is an operation
    pub parent_operation_id: Option<OperationId>,
    /// Applied operator
    pub operator: Operator,
    /// Consumed operand
    pub operand: f64,
    /// Stored result snapshot
    pub result: f64,
    /// Owner attribution
    pub user_id: String,
    /// Denormalized owner display label
    pub username: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp
    pub updated_at: DateTime<Utc>,
}

impl OperationRow {
    /// Decode the two nullable parent columns into a [`ParentRef`]
    ///
    /// A row violating the exactly-one-parent invariant is a storage
    /// integrity fault, not a validation error.
    pub fn parent_ref(&self) -> DomainResult<ParentRef> {
        ParentRef::from_ids(self.parent_root_id, self.parent_operation_id).map_err(|_| {
            DomainError::storage(format!(
                "operation row {} violates the exactly-one-parent invariant",
                self.id
            ))
        })
    }

    /// Reconstruct the entity from this row via the trusted factory
    pub fn into_entity(self) -> DomainResult<CalculationOperation> {
        let parent = self.parent_ref()?;
        Ok(CalculationOperation::from_persisted(
            self.id,
            parent,
            self.operator,
            self.operand,
            self.result,
            self.user_id,
            self.username,
            self.created_at,
            self.updated_at,
        ))
    }
}

impl From<&CalculationOperation> for OperationRow {
    fn from(operation: &CalculationOperation) -> Self {
        Self {
            id: operation.id(),
            parent_root_id: operation.parent().root_id(),
            parent_operation_id: operation.parent().operation_id(),
            operator: operation.operator(),
            operand: operation.operand(),
            result: operation.result(),
            user_id: operation.user_id().to_string(),
            username: operation.username().map(str::to_string),
            created_at: operation.created_at(),
            updated_at: operation.updated_at(),
        }
    }
}

/// Storage contract the orchestration service depends on
///
/// All operations run against the active unit-of-work scope. Loads that
/// return trees must order siblings by creation time and assemble the
/// nested shape with [`crate::tree`].
#[async_trait]
pub trait CalculationRepository: Send + Sync {
    /// Load every root with its complete operation tree
    async fn find_all_roots_with_operations(&self) -> DomainResult<Vec<CalculationRoot>>;

    /// Load a single root without its operations
    async fn find_root_by_id(&self, id: RootId) -> DomainResult<Option<CalculationRoot>>;

    /// Load a single root with its complete operation tree
    async fn find_root_with_operations(&self, id: RootId) -> DomainResult<Option<CalculationRoot>>;

    /// Load a single operation without its children
    async fn find_operation_by_id(
        &self,
        id: OperationId,
    ) -> DomainResult<Option<CalculationOperation>>;

    /// Persist a new root
    async fn save_root(&self, root: &CalculationRoot) -> DomainResult<()>;

    /// Persist a new operation
    async fn save_operation(&self, operation: &CalculationOperation) -> DomainResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_row_round_trip() {
        let root = CalculationRoot::new(42.5, "alice".to_string(), Some("Alice".to_string()))
            .unwrap();
        let row = RootRow::from(&root);
        let back = row.into_entity();

        assert_eq!(back, root);
    }

    #[test]
    fn test_operation_row_round_trip() {
        let operation = CalculationOperation::new(
            ParentRef::Root(RootId::new()),
            Operator::Multiply,
            3.0,
            10.0,
            "bob".to_string(),
            None,
        )
        .unwrap();
        let row = OperationRow::from(&operation);

        assert_eq!(row.parent_root_id, operation.parent().root_id());
        assert_eq!(row.parent_operation_id, None);
        assert_eq!(row.result, 30.0);

        let back = row.into_entity().unwrap();
        assert_eq!(back, operation);
    }

    #[test]
    fn test_corrupt_parent_columns_are_storage_errors() {
        let operation = CalculationOperation::new(
            ParentRef::Root(RootId::new()),
            Operator::Add,
            1.0,
            0.0,
            "bob".to_string(),
            None,
        )
        .unwrap();

        let mut row = OperationRow::from(&operation);
        row.parent_operation_id = Some(OperationId::new());
        assert!(matches!(row.parent_ref(), Err(DomainError::Storage(_))));

        let mut row = OperationRow::from(&operation);
        row.parent_root_id = None;
        assert!(matches!(row.into_entity(), Err(DomainError::Storage(_))));
    }
}

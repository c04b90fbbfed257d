// Copyright 2025 Cowboy AI, LLC.

//! Calculation root aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::RootId;
use crate::errors::{DomainError, DomainResult};
use crate::operation::CalculationOperation;

/// The starting numeric value of a calculation tree
///
/// All fields are immutable once set except the list of direct child
/// operations, which is loaded separately and attached during tree
/// assembly. Serde deserialization is the trusted reconstruction path
/// from cached JSON and mirrors [`CalculationRoot::from_persisted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRoot {
    id: RootId,
    value: f64,
    user_id: String,
    username: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    operations: Vec<CalculationOperation>,
}

impl CalculationRoot {
    /// Create a new root with a generated ID and current timestamps
    ///
    /// Fails with [`DomainError::InvalidValue`] if `value` is NaN or
    /// infinite.
    pub fn new(value: f64, user_id: String, username: Option<String>) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::InvalidValue(value));
        }
        let now = Utc::now();
        Ok(Self {
            id: RootId::new(),
            value,
            user_id,
            username,
            created_at: now,
            updated_at: now,
            operations: Vec::new(),
        })
    }

    /// Reconstruct a root from persisted fields without validation
    ///
    /// Operations start empty; they are attached afterwards by the tree
    /// assembly.
    pub fn from_persisted(
        id: RootId,
        value: f64,
        user_id: String,
        username: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            value,
            user_id,
            username,
            created_at,
            updated_at,
            operations: Vec::new(),
        }
    }

    /// Entity identifier
    pub fn id(&self) -> RootId {
        self.id
    }

    /// Starting value of the tree
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Owner attribution
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Denormalized display label of the owner, if recorded
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last-update timestamp
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Direct child operations, in creation order
    pub fn operations(&self) -> &[CalculationOperation] {
        &self.operations
    }

    /// Replace the direct-children list wholesale
    pub fn set_operations(&mut self, operations: Vec<CalculationOperation>) {
        self.operations = operations;
    }

    /// Append one direct child operation
    pub fn add_operation(&mut self, operation: CalculationOperation) {
        self.operations.push(operation);
    }

    /// Count every descendant operation in the subtree exactly once
    pub fn total_operation_count(&self) -> usize {
        self.operations
            .iter()
            .map(CalculationOperation::subtree_count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::OperationId;
    use crate::operation::ParentRef;
    use crate::operator::Operator;
    use pretty_assertions::assert_eq;

    fn root(value: f64) -> CalculationRoot {
        CalculationRoot::new(value, "alice".to_string(), Some("Alice".to_string())).unwrap()
    }

    #[test]
    fn test_new_validates_finiteness() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            match CalculationRoot::new(bad, "alice".to_string(), None) {
                Err(DomainError::InvalidValue(_)) => {}
                other => panic!("expected InvalidValue, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_new_zero_is_valid() {
        let root = root(0.0);
        assert_eq!(root.value(), 0.0);
        assert_eq!(root.total_operation_count(), 0);
        assert_eq!(root.created_at(), root.updated_at());
    }

    #[test]
    fn test_from_persisted_trusts_source() {
        // Trusted reconstruction skips the finiteness check by contract
        let now = Utc::now();
        let root = CalculationRoot::from_persisted(
            RootId::new(),
            f64::INFINITY,
            "alice".to_string(),
            None,
            now,
            now,
        );
        assert!(root.value().is_infinite());
        assert!(root.operations().is_empty());
    }

    /// Count must equal 1 + each child's own count, recursively
    ///
    /// ```mermaid
    /// graph TD
    ///     R[Root] --> A[op A]
    ///     R --> B[op B]
    ///     A --> C[op C]
    /// ```
    #[test]
    fn test_total_operation_count_recursive() {
        let mut root = root(100.0);

        let mut a = CalculationOperation::new(
            ParentRef::Root(root.id()),
            Operator::Add,
            50.0,
            root.value(),
            "alice".to_string(),
            None,
        )
        .unwrap();
        let c = CalculationOperation::new(
            ParentRef::Operation(a.id()),
            Operator::Multiply,
            2.0,
            a.result(),
            "bob".to_string(),
            None,
        )
        .unwrap();
        a.add_child(c);

        let b = CalculationOperation::new(
            ParentRef::Root(root.id()),
            Operator::Subtract,
            30.0,
            root.value(),
            "carol".to_string(),
            None,
        )
        .unwrap();

        root.set_operations(vec![a, b]);
        assert_eq!(root.total_operation_count(), 3);
    }

    #[test]
    fn test_add_operation_appends_in_order() {
        let mut root = root(1.0);
        let a = CalculationOperation::new(
            ParentRef::Root(root.id()),
            Operator::Add,
            1.0,
            root.value(),
            "alice".to_string(),
            None,
        )
        .unwrap();
        let b = CalculationOperation::new(
            ParentRef::Root(root.id()),
            Operator::Add,
            2.0,
            root.value(),
            "alice".to_string(),
            None,
        )
        .unwrap();
        let (a_id, b_id) = (a.id(), b.id());

        root.add_operation(a);
        root.add_operation(b);

        let ids: Vec<OperationId> = root.operations().iter().map(|op| op.id()).collect();
        assert_eq!(ids, vec![a_id, b_id]);
    }

    #[test]
    fn test_serde_round_trip_preserves_tree() {
        let mut root = root(100.0);
        let mut a = CalculationOperation::new(
            ParentRef::Root(root.id()),
            Operator::Add,
            50.0,
            root.value(),
            "alice".to_string(),
            Some("Alice".to_string()),
        )
        .unwrap();
        let c = CalculationOperation::new(
            ParentRef::Operation(a.id()),
            Operator::Multiply,
            2.0,
            a.result(),
            "bob".to_string(),
            None,
        )
        .unwrap();
        a.add_child(c);
        root.set_operations(vec![a]);

        let json = serde_json::to_value(&root).unwrap();
        let back: CalculationRoot = serde_json::from_value(json).unwrap();

        assert_eq!(back, root);
        assert_eq!(back.total_operation_count(), 2);
    }
}

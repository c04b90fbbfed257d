// Copyright 2025 Cowboy AI, LLC.

//! Calculation operation tree node

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{OperationId, RootId};
use crate::errors::{DomainError, DomainResult};
use crate::operator::Operator;

/// Reference to the parent an operation derives its value from
///
/// Exactly one parent exists at all times; the enum makes the invariant
/// hold by construction. The persisted row keeps two nullable columns
/// instead; [`ParentRef::from_ids`] converts that shape back, raising the
/// cardinality errors the exposed API requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    /// The operation applies to a root's starting value
    Root(RootId),
    /// The operation applies to another operation's result
    Operation(OperationId),
}

impl ParentRef {
    /// Build a parent reference from the two optional id fields of the
    /// exposed API and the persisted row shape
    ///
    /// Fails with [`DomainError::MissingParent`] when neither id is given
    /// and [`DomainError::AmbiguousParent`] when both are.
    pub fn from_ids(
        parent_root_id: Option<RootId>,
        parent_operation_id: Option<OperationId>,
    ) -> DomainResult<Self> {
        match (parent_root_id, parent_operation_id) {
            (Some(root_id), None) => Ok(ParentRef::Root(root_id)),
            (None, Some(operation_id)) => Ok(ParentRef::Operation(operation_id)),
            (None, None) => Err(DomainError::MissingParent),
            (Some(_), Some(_)) => Err(DomainError::AmbiguousParent),
        }
    }

    /// The parent root id, if the parent is a root
    pub fn root_id(&self) -> Option<RootId> {
        match self {
            ParentRef::Root(id) => Some(*id),
            ParentRef::Operation(_) => None,
        }
    }

    /// The parent operation id, if the parent is an operation
    pub fn operation_id(&self) -> Option<OperationId> {
        match self {
            ParentRef::Root(_) => None,
            ParentRef::Operation(id) => Some(*id),
        }
    }
}

/// A node applying one operator/operand pair to a parent's value
///
/// The result is computed once from the parent value resolved by the
/// caller at creation time and stored immutably thereafter; it is never
/// recomputed. Children are attached only during tree assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationOperation {
    id: OperationId,
    parent: ParentRef,
    operator: Operator,
    operand: f64,
    result: f64,
    user_id: String,
    username: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    children: Vec<CalculationOperation>,
}

impl CalculationOperation {
    /// Create a new operation, computing its result snapshot
    ///
    /// `parent_value` is the current value/result of the referenced parent;
    /// resolving it is the caller's responsibility. Fails with
    /// [`DomainError::InvalidValue`] for a non-finite operand and
    /// [`DomainError::DivisionByZero`] for DIVIDE with a zero operand.
    pub fn new(
        parent: ParentRef,
        operator: Operator,
        operand: f64,
        parent_value: f64,
        user_id: String,
        username: Option<String>,
    ) -> DomainResult<Self> {
        if !operand.is_finite() {
            return Err(DomainError::InvalidValue(operand));
        }
        let result = operator.calculate(parent_value, operand)?;
        let now = Utc::now();
        Ok(Self {
            id: OperationId::new(),
            parent,
            operator,
            operand,
            result,
            user_id,
            username,
            created_at: now,
            updated_at: now,
            children: Vec::new(),
        })
    }

    /// Reconstruct an operation from persisted fields without validation
    ///
    /// Children start empty; they are attached afterwards by the tree
    /// assembly.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: OperationId,
        parent: ParentRef,
        operator: Operator,
        operand: f64,
        result: f64,
        user_id: String,
        username: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            parent,
            operator,
            operand,
            result,
            user_id,
            username,
            created_at,
            updated_at,
            children: Vec::new(),
        }
    }

    /// Entity identifier
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Reference to the parent this operation derives from
    pub fn parent(&self) -> ParentRef {
        self.parent
    }

    /// The operator applied to the parent value
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The operand the operator consumed
    pub fn operand(&self) -> f64 {
        self.operand
    }

    /// The computed result snapshot
    pub fn result(&self) -> f64 {
        self.result
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

    /// Child operations, in creation order
    pub fn children(&self) -> &[CalculationOperation] {
        &self.children
    }

    /// Replace the children list wholesale
    pub fn set_children(&mut self, children: Vec<CalculationOperation>) {
        self.children = children;
    }

    /// Append one child operation
    pub fn add_child(&mut self, child: CalculationOperation) {
        self.children.push(child);
    }

    /// Count of this operation plus every descendant
    pub fn subtree_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(CalculationOperation::subtree_count)
            .sum::<usize>()
    }

    /// Human-readable rendering of the applied step
    pub fn display_string(&self) -> String {
        format!(
            "{} {} = {}",
            self.operator.display_symbol(),
            self.operand,
            self.result
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(parent: ParentRef, operator: Operator, operand: f64, parent_value: f64) -> CalculationOperation {
        CalculationOperation::new(parent, operator, operand, parent_value, "alice".to_string(), None)
            .unwrap()
    }

    #[test]
    fn test_from_ids_cardinality() {
        let root_id = RootId::new();
        let op_id = OperationId::new();

        assert_eq!(
            ParentRef::from_ids(Some(root_id), None).unwrap(),
            ParentRef::Root(root_id)
        );
        assert_eq!(
            ParentRef::from_ids(None, Some(op_id)).unwrap(),
            ParentRef::Operation(op_id)
        );
        assert!(matches!(
            ParentRef::from_ids(None, None),
            Err(DomainError::MissingParent)
        ));
        assert!(matches!(
            ParentRef::from_ids(Some(root_id), Some(op_id)),
            Err(DomainError::AmbiguousParent)
        ));
    }

    #[test]
    fn test_parent_ref_accessors() {
        let root_id = RootId::new();
        let parent = ParentRef::Root(root_id);
        assert_eq!(parent.root_id(), Some(root_id));
        assert_eq!(parent.operation_id(), None);

        let op_id = OperationId::new();
        let parent = ParentRef::Operation(op_id);
        assert_eq!(parent.root_id(), None);
        assert_eq!(parent.operation_id(), Some(op_id));
    }

    #[test]
    fn test_result_is_snapshot_of_parent_value() {
        let root_id = RootId::new();
        let first = op(ParentRef::Root(root_id), Operator::Add, 50.0, 100.0);
        assert_eq!(first.result(), 150.0);

        let second = op(
            ParentRef::Operation(first.id()),
            Operator::Multiply,
            2.0,
            first.result(),
        );
        assert_eq!(second.result(), 300.0);

        // The stored results are snapshots, not live derivations
        assert_eq!(first.result(), 150.0);
    }

    #[test]
    fn test_new_rejects_zero_divisor() {
        let result = CalculationOperation::new(
            ParentRef::Root(RootId::new()),
            Operator::Divide,
            0.0,
            10.0,
            "alice".to_string(),
            None,
        );
        assert!(matches!(result, Err(DomainError::DivisionByZero)));
    }

    #[test]
    fn test_new_rejects_non_finite_operand() {
        let result = CalculationOperation::new(
            ParentRef::Root(RootId::new()),
            Operator::Add,
            f64::NAN,
            10.0,
            "alice".to_string(),
            None,
        );
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
    }

    #[test]
    fn test_display_string() {
        let add = op(ParentRef::Root(RootId::new()), Operator::Add, 50.0, 100.0);
        assert_eq!(add.display_string(), "+ 50 = 150");

        let divide = op(ParentRef::Root(RootId::new()), Operator::Divide, 4.0, 100.0);
        assert_eq!(divide.display_string(), "÷ 4 = 25");
    }

    #[test]
    fn test_subtree_count() {
        let root_id = RootId::new();
        let mut a = op(ParentRef::Root(root_id), Operator::Add, 1.0, 0.0);
        let mut b = op(ParentRef::Operation(a.id()), Operator::Add, 1.0, a.result());
        let c = op(ParentRef::Operation(b.id()), Operator::Add, 1.0, b.result());

        assert_eq!(c.subtree_count(), 1);
        b.set_children(vec![c]);
        assert_eq!(b.subtree_count(), 2);
        a.set_children(vec![b]);
        assert_eq!(a.subtree_count(), 3);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut a = op(ParentRef::Root(RootId::new()), Operator::Subtract, 30.0, 100.0);
        let b = op(ParentRef::Operation(a.id()), Operator::Divide, 7.0, a.result());
        a.add_child(b);

        let json = serde_json::to_string(&a).unwrap();
        let back: CalculationOperation = serde_json::from_str(&json).unwrap();

        assert_eq!(back, a);
        assert_eq!(back.children().len(), 1);
    }
}

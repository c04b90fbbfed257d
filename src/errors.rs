// Copyright 2025 Cowboy AI, LLC.

//! Error types for calculation domain operations

use thiserror::Error;

use crate::entity::{OperationId, RootId};

/// Errors that can occur in calculation domain operations
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// A root starting value or an operand was not a finite number
    #[error("Invalid value: {0} is not a finite number")]
    InvalidValue(f64),

    /// An operator name did not match one of the four canonical names
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// DIVIDE was requested with a zero operand
    #[error("Division by zero")]
    DivisionByZero,

    /// An operation was created without a parent reference
    #[error("Operation requires a parent root or a parent operation")]
    MissingParent,

    /// An operation was created with both parent references
    #[error("Operation cannot reference both a parent root and a parent operation")]
    AmbiguousParent,

    /// The referenced parent root does not exist
    #[error("Parent root not found: {0}")]
    ParentRootNotFound(RootId),

    /// The referenced parent operation does not exist
    #[error("Parent operation not found: {0}")]
    ParentOperationNotFound(OperationId),

    /// Opaque failure from the storage collaborator
    #[error("Storage error: {0}")]
    Storage(String),

    /// Error serializing or deserializing domain data
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for calculation domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl DomainError {
    /// Create a storage error from any displayable source
    pub fn storage(msg: impl Into<String>) -> Self {
        DomainError::Storage(msg.into())
    }

    /// Check if this is a validation error raised before or during entity construction
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidValue(_)
                | DomainError::InvalidOperator(_)
                | DomainError::DivisionByZero
                | DomainError::MissingParent
                | DomainError::AmbiguousParent
        )
    }

    /// Check if this is a parent-not-found error raised at write time
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::ParentRootNotFound(_) | DomainError::ParentOperationNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;

    #[test]
    fn test_error_display_messages() {
        let err = DomainError::InvalidValue(f64::NAN);
        assert_eq!(err.to_string(), "Invalid value: NaN is not a finite number");

        let err = DomainError::InvalidOperator("multiply".to_string());
        assert_eq!(err.to_string(), "Invalid operator: multiply");

        let err = DomainError::DivisionByZero;
        assert_eq!(err.to_string(), "Division by zero");

        let err = DomainError::MissingParent;
        assert_eq!(
            err.to_string(),
            "Operation requires a parent root or a parent operation"
        );

        let err = DomainError::AmbiguousParent;
        assert_eq!(
            err.to_string(),
            "Operation cannot reference both a parent root and a parent operation"
        );

        let root_id = RootId::new();
        let err = DomainError::ParentRootNotFound(root_id);
        assert_eq!(err.to_string(), format!("Parent root not found: {root_id}"));

        let op_id = OperationId::new();
        let err = DomainError::ParentOperationNotFound(op_id);
        assert_eq!(
            err.to_string(),
            format!("Parent operation not found: {op_id}")
        );

        let err = DomainError::Storage("connection refused".to_string());
        assert_eq!(err.to_string(), "Storage error: connection refused");
    }

    #[test]
    fn test_is_validation_error() {
        assert!(DomainError::InvalidValue(f64::INFINITY).is_validation_error());
        assert!(DomainError::InvalidOperator("add".to_string()).is_validation_error());
        assert!(DomainError::DivisionByZero.is_validation_error());
        assert!(DomainError::MissingParent.is_validation_error());
        assert!(DomainError::AmbiguousParent.is_validation_error());

        assert!(!DomainError::ParentRootNotFound(EntityId::new()).is_validation_error());
        assert!(!DomainError::Storage("down".to_string()).is_validation_error());
    }

    #[test]
    fn test_is_not_found() {
        assert!(DomainError::ParentRootNotFound(EntityId::new()).is_not_found());
        assert!(DomainError::ParentOperationNotFound(EntityId::new()).is_not_found());

        assert!(!DomainError::DivisionByZero.is_not_found());
        assert!(!DomainError::Storage("down".to_string()).is_not_found());
    }

    #[test]
    fn test_serde_json_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{ nope }").unwrap_err();
        let domain_err: DomainError = serde_err.into();

        match domain_err {
            DomainError::Serialization(msg) => assert!(!msg.is_empty()),
            other => panic!("expected Serialization, got {other:?}"),
        }
    }

    #[test]
    fn test_all_errors_clone() {
        let errors: Vec<DomainError> = vec![
            DomainError::InvalidValue(0.0),
            DomainError::InvalidOperator("x".to_string()),
            DomainError::DivisionByZero,
            DomainError::MissingParent,
            DomainError::AmbiguousParent,
            DomainError::ParentRootNotFound(EntityId::new()),
            DomainError::ParentOperationNotFound(EntityId::new()),
            DomainError::Storage("x".to_string()),
            DomainError::Serialization("x".to_string()),
        ];

        for error in errors {
            let cloned = error.clone();
            assert_eq!(error.to_string(), cloned.to_string());
        }
    }
}

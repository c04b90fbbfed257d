// Copyright 2025 Cowboy AI, LLC.

//! Arithmetic operator value type
//!
//! Operators are immutable value objects. Construction from untrusted
//! strings goes through [`Operator::parse`]; trusted persisted enum values
//! deserialize directly via serde.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{DomainError, DomainResult};

/// One of the four arithmetic operators a calculation operation can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// parent + operand
    Add,
    /// parent - operand
    Subtract,
    /// parent * operand
    Multiply,
    /// parent / operand, undefined for a zero operand
    Divide,
}

impl Operator {
    /// Parse an operator from its canonical name
    ///
    /// Only the exact names `ADD`, `SUBTRACT`, `MULTIPLY` and `DIVIDE` are
    /// accepted. Lowercase or unknown strings are rejected, not coerced.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        match raw {
            "ADD" => Ok(Operator::Add),
            "SUBTRACT" => Ok(Operator::Subtract),
            "MULTIPLY" => Ok(Operator::Multiply),
            "DIVIDE" => Ok(Operator::Divide),
            _ => Err(DomainError::InvalidOperator(raw.to_string())),
        }
    }

    /// Canonical name of this operator
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Add => "ADD",
            Operator::Subtract => "SUBTRACT",
            Operator::Multiply => "MULTIPLY",
            Operator::Divide => "DIVIDE",
        }
    }

    /// Plain ASCII symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
        }
    }

    /// Typographic symbol used for display
    pub fn display_symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "−",
            Operator::Multiply => "×",
            Operator::Divide => "÷",
        }
    }

    /// Apply this operator to a parent value and an operand
    ///
    /// Total for ADD/SUBTRACT/MULTIPLY. DIVIDE fails with
    /// [`DomainError::DivisionByZero`] when the operand is zero; the check
    /// happens before dividing rather than relying on IEEE-754 infinities.
    pub fn calculate(&self, parent_value: f64, operand: f64) -> DomainResult<f64> {
        match self {
            Operator::Add => Ok(parent_value + operand),
            Operator::Subtract => Ok(parent_value - operand),
            Operator::Multiply => Ok(parent_value * operand),
            Operator::Divide => {
                if operand == 0.0 {
                    Err(DomainError::DivisionByZero)
                } else {
                    Ok(parent_value / operand)
                }
            }
        }
    }

    /// Whether this operator can be applied with the given operand
    pub fn is_valid_with(&self, operand: f64) -> bool {
        !(matches!(self, Operator::Divide) && operand == 0.0)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Operator {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

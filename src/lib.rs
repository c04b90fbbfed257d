// Copyright 2025 Cowboy AI, LLC.

//! # calctree
//!
//! Domain core for collaborative calculation trees: a root numeric value
//! extended by add/subtract/multiply/divide operations, each consuming its
//! parent's value and producing a new one, forming a tree of derivations
//! analogous to threaded replies.
//!
//! This crate provides the building blocks an API layer composes:
//! - **Operator**: immutable arithmetic value type with validity rules
//! - **Entities**: `CalculationRoot` and `CalculationOperation` with
//!   validating factories and trusted reconstruction
//! - **Tree assembly**: the shared algorithm turning flat parent-pointer
//!   rows into nested structures
//! - **Persistence contracts**: repository and unit-of-work traits, plus an
//!   in-memory reference adapter
//! - **Cache layer**: key/TTL backend contract, in-process implementation
//!   and a failure-swallowing resilience decorator
//! - **Orchestration service**: cache-aside reads, transactional writes and
//!   targeted invalidation
//!
//! ## Design Principles
//!
//! 1. **Type Safety**: phantom-typed ids and an exactly-one-parent enum
//!    make structural invariants hold by construction
//! 2. **Immutability**: entity fields never change after creation except
//!    the explicitly-mutable children lists used during tree assembly
//! 3. **Snapshots**: operation results are computed once against the
//!    parent value resolved at creation time, never recomputed
//! 4. **Cache as accelerator**: persistence failures propagate, cache
//!    failures never do
//! 5. **Shape parity**: cached JSON and freshly-loaded rows reconstruct
//!    through the same entity types, so the two read paths cannot diverge

#![warn(missing_docs)]

mod entity;
mod errors;
mod operation;
mod operator;
mod root;
mod service;

pub mod cache;
pub mod persistence;
pub mod tree;

// Re-export core types
pub use entity::{EntityId, OperationId, OperationMarker, RootId, RootMarker};
pub use errors::{DomainError, DomainResult};
pub use operation::{CalculationOperation, ParentRef};
pub use operator::Operator;
pub use root::CalculationRoot;
pub use service::{CalculationService, CreateOperationInput, CreateRootInput};

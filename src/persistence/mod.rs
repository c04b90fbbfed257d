// Copyright 2025 Cowboy AI, LLC.

//! # Persistence Layer
//!
//! Storage contracts the orchestration service depends on, and the
//! in-memory reference adapter.
//!
//! ## Components
//!
//! - **Repository**: atomic reads/writes and tree loading
//! - **Unit of Work**: transactional boundary with rollback
//! - **Row shapes**: the flat parent-pointer encoding of the tree
//! - **In-memory adapter**: snapshot-rollback implementation of both
//!   contracts

pub mod memory;
pub mod repository;
pub mod unit_of_work;

pub use memory::{InMemoryRepository, InMemoryUnitOfWork};
pub use repository::{CalculationRepository, OperationRow, RootRow};
pub use unit_of_work::UnitOfWork;

// Copyright 2025 Cowboy AI, LLC.

//! # Cache Layer
//!
//! Key/TTL cache contract with substitutable backends and a resilience
//! decorator. The cache is a non-critical accelerator: the service reads
//! and writes it only through [`ResilientCache`], which converts every
//! backend failure into a miss or a no-op.

pub mod backend;
pub mod memory;
pub mod resilient;

pub use backend::{keys, CacheBackend, CacheError, CacheTtls};
pub use memory::MemoryCache;
pub use resilient::ResilientCache;

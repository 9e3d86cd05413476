//! In-memory storage backend for the muni municipal services platform
//!
//! Implements the `muni-core` repository traits over concurrent in-process
//! maps. Intended for tests, local development, and single-process
//! deployments where the hosted store is unnecessary.

pub mod repositories;

pub use repositories::{
    MemoryLoginAttemptRepository, MemoryPermitRepository, MemoryRepositoryProvider,
};

//! Repository implementations for in-memory storage

pub mod login_attempt;
pub mod permit;

pub use login_attempt::MemoryLoginAttemptRepository;
pub use permit::MemoryPermitRepository;

use async_trait::async_trait;
use std::sync::Arc;

use muni_core::{
    Error,
    repositories::{
        LoginAttemptRepositoryProvider, PermitRepositoryProvider, RepositoryProvider,
    },
};

/// Repository provider implementation backed by in-process maps.
///
/// Suited to tests and single-process deployments; data does not survive a
/// restart.
#[derive(Default)]
pub struct MemoryRepositoryProvider {
    permit: Arc<MemoryPermitRepository>,
    login_attempts: Arc<MemoryLoginAttemptRepository>,
}

impl MemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the permit repository
    pub fn permit_repository(&self) -> Arc<MemoryPermitRepository> {
        Arc::clone(&self.permit)
    }

    /// Shared handle to the login-attempt repository
    pub fn login_attempt_repository(&self) -> Arc<MemoryLoginAttemptRepository> {
        Arc::clone(&self.login_attempts)
    }
}

impl PermitRepositoryProvider for MemoryRepositoryProvider {
    type PermitRepo = MemoryPermitRepository;

    fn permit(&self) -> &Self::PermitRepo {
        &self.permit
    }
}

impl LoginAttemptRepositoryProvider for MemoryRepositoryProvider {
    type LoginAttemptRepo = MemoryLoginAttemptRepository;

    fn login_attempts(&self) -> &Self::LoginAttemptRepo {
        &self.login_attempts
    }
}

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}

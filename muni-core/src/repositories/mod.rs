//! Repository traits for data access layer
//!
//! This module defines the repository interfaces that services use to
//! interact with storage. The traits abstract over the hosted store the
//! portal runs against in production and over in-process backends in tests.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits plus
//!   a health check
//!
//! This design allows storage backends to implement only the repositories
//! they need while still offering a unified interface.

pub mod login_attempt;
pub mod permit;

pub use login_attempt::LoginAttemptRepository;
pub use permit::PermitRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for permit repository access.
pub trait PermitRepositoryProvider: Send + Sync + 'static {
    /// The permit repository implementation type
    type PermitRepo: PermitRepository;

    /// Get the permit repository
    fn permit(&self) -> &Self::PermitRepo;
}

/// Provider trait for login-attempt repository access.
pub trait LoginAttemptRepositoryProvider: Send + Sync + 'static {
    /// The login-attempt repository implementation type
    type LoginAttemptRepo: LoginAttemptRepository;

    /// Get the login-attempt repository
    fn login_attempts(&self) -> &Self::LoginAttemptRepo;
}

/// Provider trait that storage implementations must implement to provide all
/// repositories, plus a health check for readiness probes.
#[async_trait]
pub trait RepositoryProvider:
    PermitRepositoryProvider + LoginAttemptRepositoryProvider
{
    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}

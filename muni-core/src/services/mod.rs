//! Service layer for business logic
//!
//! Services coordinate between the pure decision cores (permit lifecycle,
//! login guard) and the repository layer, and emit audit events. They hold
//! the only clock reads in the crate outside of callers' own.

pub mod lockout;
pub mod permit;

pub use lockout::{CredentialVerifier, LockoutService};
pub use permit::{LifecycleConfig, PermitService};

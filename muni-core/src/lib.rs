//! Core domain logic for the muni municipal services platform
//!
//! This crate owns the two decision cores behind the citizen portal:
//!
//! - the permit application lifecycle (submission through payment
//!   resolution to a terminal status), and
//! - the login attempt guard (per-account lockout after repeated
//!   authentication failures).
//!
//! Both cores are pure: they take a snapshot plus an event and return the
//! next snapshot or a typed failure. Persistence goes through the
//! repository traits in [`repositories`], coordinated by the services in
//! [`services`]; any storage backend that implements the repository
//! contracts can host them.
//!
//! See [`Permit`] for the permit entity and its state machine, and
//! [`LoginAttemptState`] for the lockout guard.

pub mod error;
pub mod events;
pub mod fees;
pub mod id;
pub mod lockout;
pub mod permit;
pub mod repositories;
pub mod services;
pub mod validation;

pub use error::Error;
pub use events::{Event, EventBus, EventHandler};
pub use lockout::{AccountId, LockoutPolicy, LoginAttemptState};
pub use permit::{
    ApplicationType, NewPermit, Permit, PermitId, PermitKind, PermitStatus, StatusCounts,
    Transition, aggregate_counts,
};
pub use services::{CredentialVerifier, LifecycleConfig, LockoutService, PermitService};

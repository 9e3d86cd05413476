use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::permit::PermitStatus;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Permit error: {0}")]
    Permit(#[from] PermitError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),
}

/// Failures produced by the permit lifecycle state machine.
///
/// These are decision outcomes, not I/O failures: the caller re-fetches the
/// permit and decides whether to retry or surface the error to the citizen.
#[derive(Debug, Error)]
pub enum PermitError {
    /// The (service kind, application type) pair has no entry in the fee
    /// table. Unknown pairs are rejected outright rather than priced at 0.
    #[error("Unknown service kind: {kind} ({application_type})")]
    InvalidServiceKind {
        kind: String,
        application_type: String,
    },

    /// The requested operation is not legal from the permit's current status.
    #[error("Illegal transition: cannot {operation} from {from}")]
    IllegalTransition {
        from: PermitStatus,
        operation: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked until {locked_until}")]
    AccountLocked { locked_until: DateTime<Utc> },

    /// A malformed login-attempt snapshot was passed into the guard.
    #[error("Invalid attempt state: {0}")]
    InvalidState(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found")]
    NotFound,

    /// A compare-and-set update found a status other than the one the
    /// caller decided against. The caller must re-read and retry.
    #[error("Stale status: expected {expected}, found {found}")]
    StaleStatus {
        expected: PermitStatus,
        found: PermitStatus,
    },
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event handler error: {0}")]
    HandlerError(String),

    #[error("Event bus error: {0}")]
    BusError(String),
}

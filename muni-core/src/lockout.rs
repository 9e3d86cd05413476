//! Account lockout state for brute-force protection
//!
//! Tracks failed authentication attempts per account and enforces a
//! temporary lockout after too many failures. The guard is decision-only:
//! every operation takes a snapshot plus the current time and returns the
//! next snapshot for the caller to persist. Lockout thresholds come from a
//! [`LockoutPolicy`] so deployments can tune them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::AuthError,
    id::{generate_prefixed_id, validate_prefixed_id},
};

/// A unique, stable identifier for an account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        AccountId(id.to_string())
    }

    pub fn new_random() -> Self {
        AccountId(generate_prefixed_id("acct"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for an account ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "acct")
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for account lockout behavior.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Number of consecutive failures at which the account locks.
    pub max_attempts: i64,

    /// How long the lock lasts once triggered.
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::minutes(15),
        }
    }
}

/// Per-account failed-attempt tracking.
///
/// Created implicitly on an account's first failure (or loaded with a zero
/// count). The count only moves up on failures and resets on success; the
/// lock clears lazily once its deadline has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttemptState {
    pub account_id: AccountId,

    /// Consecutive failed attempts since the last success. Persisted as a
    /// signed integer; a negative value is a corrupt snapshot and is
    /// rejected with [`AuthError::InvalidState`].
    pub failed_attempts: i64,

    /// When set and in the future, authentication must be refused regardless
    /// of credential correctness.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginAttemptState {
    /// Fresh state for an account with no recorded failures.
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            failed_attempts: 0,
            locked_until: None,
        }
    }

    /// Whether the account is locked at `now`.
    ///
    /// Pure check, no mutation: a lock whose deadline has passed simply
    /// reads as unlocked; the stale deadline is cleared on the next
    /// [`LoginAttemptState::record_success`] or failure rollover.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Record a failed authentication attempt.
    ///
    /// Increments the failure count and, once the count reaches the policy
    /// threshold, sets the lock deadline to `now + lockout_duration`. The
    /// count never decreases on failure. Returns the updated snapshot for
    /// the caller to persist.
    pub fn record_failure(
        mut self,
        now: DateTime<Utc>,
        policy: &LockoutPolicy,
    ) -> Result<Self, Error> {
        self.validate()?;

        self.failed_attempts += 1;
        if self.failed_attempts >= policy.max_attempts {
            self.locked_until = Some(now + policy.lockout_duration);
        }
        Ok(self)
    }

    /// Record a successful authentication.
    ///
    /// Resets the failure count and clears any lock. Precondition: the
    /// caller verified credentials AND observed `is_locked == false`;
    /// calling this while locked is a caller error and is not re-checked
    /// here.
    pub fn record_success(mut self) -> Self {
        self.failed_attempts = 0;
        self.locked_until = None;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.failed_attempts < 0 {
            return Err(AuthError::InvalidState(format!(
                "negative failure count {} for {}",
                self.failed_attempts, self.account_id
            ))
            .into());
        }
        Ok(())
    }
}

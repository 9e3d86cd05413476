//! Login lockout service.
//!
//! Wraps a credential verifier with the account lockout guard: locked
//! accounts are refused before credentials are examined, failures are
//! counted toward the lock, and a success clears the slate.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error,
    error::AuthError,
    events::{Event, EventBus},
    lockout::{AccountId, LockoutPolicy, LoginAttemptState},
    repositories::LoginAttemptRepository,
};

/// Verifies a secret for an account. Implemented by the hosted auth
/// backend's client; the lockout service only consumes the pass/fail
/// outcome.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    async fn verify(&self, account_id: &AccountId, secret: &str) -> Result<bool, Error>;
}

/// Service for authentication with account lockout.
pub struct LockoutService<R: LoginAttemptRepository> {
    repository: Arc<R>,
    policy: LockoutPolicy,
    events: EventBus,
}

impl<R: LoginAttemptRepository> LockoutService<R> {
    /// Create a new LockoutService with the given repository and policy.
    pub fn new(repository: Arc<R>, policy: LockoutPolicy, events: EventBus) -> Self {
        Self {
            repository,
            policy,
            events,
        }
    }

    /// Get the active lockout policy.
    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Whether the account is locked at `now`.
    pub async fn is_locked(&self, account_id: &AccountId, now: DateTime<Utc>) -> Result<bool, Error> {
        Ok(self.load(account_id).await?.is_locked(now))
    }

    /// Authenticate an account, enforcing the lockout policy.
    ///
    /// A locked account is refused with [`AuthError::AccountLocked`] before
    /// the verifier is consulted, so secrets for locked accounts are never
    /// examined. A failed verification is recorded and surfaces as
    /// [`AuthError::InvalidCredentials`]; a success resets the account's
    /// attempt state.
    pub async fn authenticate<V: CredentialVerifier>(
        &self,
        verifier: &V,
        account_id: &AccountId,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let state = self.load(account_id).await?;
        if state.is_locked(now) {
            // locked_until is always set when is_locked holds
            let locked_until = state.locked_until.unwrap_or(now);
            tracing::warn!(account_id = %account_id, %locked_until, "Refused login for locked account");
            return Err(AuthError::AccountLocked { locked_until }.into());
        }

        if verifier.verify(account_id, secret).await? {
            self.record_success(account_id).await?;
            Ok(())
        } else {
            self.record_failure(account_id, now).await?;
            Err(AuthError::InvalidCredentials.into())
        }
    }

    /// Record a failed attempt and return the updated state.
    ///
    /// Emits `LoginFailed`, plus `AccountLocked` when this failure trips
    /// the threshold.
    pub async fn record_failure(
        &self,
        account_id: &AccountId,
        now: DateTime<Utc>,
    ) -> Result<LoginAttemptState, Error> {
        let state = self.load(account_id).await?;
        let was_locked = state.is_locked(now);

        let state = state.record_failure(now, &self.policy)?;
        let state = self.repository.upsert(state).await?;

        self.events
            .emit(&Event::LoginFailed {
                account_id: account_id.clone(),
                failed_attempts: state.failed_attempts,
                timestamp: now,
            })
            .await?;

        if !was_locked && state.is_locked(now) {
            let locked_until = state.locked_until.unwrap_or(now);
            tracing::warn!(
                account_id = %account_id,
                failed_attempts = state.failed_attempts,
                %locked_until,
                "Account locked after repeated failures"
            );
            self.events
                .emit(&Event::AccountLocked {
                    account_id: account_id.clone(),
                    failed_attempts: state.failed_attempts,
                    locked_until,
                    timestamp: now,
                })
                .await?;
        }

        Ok(state)
    }

    /// Reset the account's attempt state after a verified success.
    pub async fn record_success(&self, account_id: &AccountId) -> Result<LoginAttemptState, Error> {
        let state = self.load(account_id).await?;
        let had_failures = state.failed_attempts > 0 || state.locked_until.is_some();

        let state = self.repository.upsert(state.record_success()).await?;

        if had_failures {
            self.events
                .emit(&Event::AccountUnlocked {
                    account_id: account_id.clone(),
                    timestamp: Utc::now(),
                })
                .await?;
        }

        Ok(state)
    }

    async fn load(&self, account_id: &AccountId) -> Result<LoginAttemptState, Error> {
        Ok(self
            .repository
            .find_by_account(account_id)
            .await?
            .unwrap_or_else(|| LoginAttemptState::new(account_id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock repository for testing
    struct MockLoginAttemptRepository {
        states: Mutex<HashMap<AccountId, LoginAttemptState>>,
    }

    impl MockLoginAttemptRepository {
        fn new() -> Self {
            Self {
                states: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl LoginAttemptRepository for MockLoginAttemptRepository {
        async fn find_by_account(
            &self,
            account_id: &AccountId,
        ) -> Result<Option<LoginAttemptState>, Error> {
            Ok(self.states.lock().unwrap().get(account_id).cloned())
        }

        async fn upsert(&self, state: LoginAttemptState) -> Result<LoginAttemptState, Error> {
            self.states
                .lock()
                .unwrap()
                .insert(state.account_id.clone(), state.clone());
            Ok(state)
        }
    }

    /// Verifier that accepts one fixed secret and counts its calls
    struct FixedVerifier {
        secret: &'static str,
        calls: AtomicUsize,
    }

    impl FixedVerifier {
        fn new(secret: &'static str) -> Self {
            Self {
                secret,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CredentialVerifier for FixedVerifier {
        async fn verify(&self, _account_id: &AccountId, secret: &str) -> Result<bool, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(secret == self.secret)
        }
    }

    fn service() -> LockoutService<MockLoginAttemptRepository> {
        LockoutService::new(
            Arc::new(MockLoginAttemptRepository::new()),
            LockoutPolicy::default(),
            EventBus::new(),
        )
    }

    #[tokio::test]
    async fn test_wrong_secret_counts_toward_lockout() {
        let service = service();
        let verifier = FixedVerifier::new("hunter2");
        let account = AccountId::new_random();
        let now = Utc::now();

        for _ in 0..4 {
            let result = service.authenticate(&verifier, &account, "wrong", now).await;
            assert!(matches!(
                result,
                Err(Error::Auth(AuthError::InvalidCredentials))
            ));
        }
        assert!(!service.is_locked(&account, now).await.unwrap());

        // Fifth failure locks the account
        service
            .authenticate(&verifier, &account, "wrong", now)
            .await
            .unwrap_err();
        assert!(service.is_locked(&account, now).await.unwrap());
        assert!(service.is_locked(&account, now + Duration::minutes(10)).await.unwrap());
        assert!(!service.is_locked(&account, now + Duration::minutes(16)).await.unwrap());
    }

    #[tokio::test]
    async fn test_locked_account_never_reaches_verifier() {
        let service = service();
        let verifier = FixedVerifier::new("hunter2");
        let account = AccountId::new_random();
        let now = Utc::now();

        for _ in 0..5 {
            service.record_failure(&account, now).await.unwrap();
        }

        // Even the correct secret is refused while locked
        let result = service
            .authenticate(&verifier, &account, "hunter2", now)
            .await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::AccountLocked { .. }))
        ));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lock_expires_naturally() {
        let service = service();
        let verifier = FixedVerifier::new("hunter2");
        let account = AccountId::new_random();
        let now = Utc::now();

        for _ in 0..5 {
            service.record_failure(&account, now).await.unwrap();
        }

        let after_lock = now + Duration::minutes(16);
        service
            .authenticate(&verifier, &account, "hunter2", after_lock)
            .await
            .unwrap();
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let service = service();
        let verifier = FixedVerifier::new("hunter2");
        let account = AccountId::new_random();
        let now = Utc::now();

        for _ in 0..3 {
            service
                .authenticate(&verifier, &account, "wrong", now)
                .await
                .unwrap_err();
        }

        service
            .authenticate(&verifier, &account, "hunter2", now)
            .await
            .unwrap();

        let state = service
            .repository
            .find_by_account(&account)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.failed_attempts, 0);
        assert_eq!(state.locked_until, None);
    }

    #[tokio::test]
    async fn test_lock_events_emitted() {
        use crate::events::EventHandler;
        use crate::error::EventError;

        struct Recorder {
            locked: AtomicUsize,
            unlocked: AtomicUsize,
        }

        #[async_trait]
        impl EventHandler for Recorder {
            async fn handle_event(&self, event: &Event) -> Result<(), EventError> {
                match event {
                    Event::AccountLocked { .. } => {
                        self.locked.fetch_add(1, Ordering::SeqCst);
                    }
                    Event::AccountUnlocked { .. } => {
                        self.unlocked.fetch_add(1, Ordering::SeqCst);
                    }
                    _ => {}
                }
                Ok(())
            }
        }

        let events = EventBus::new();
        let recorder = Arc::new(Recorder {
            locked: AtomicUsize::new(0),
            unlocked: AtomicUsize::new(0),
        });
        events.register(recorder.clone()).await;

        let service = LockoutService::new(
            Arc::new(MockLoginAttemptRepository::new()),
            LockoutPolicy::default(),
            events,
        );
        let account = AccountId::new_random();
        let now = Utc::now();

        for _ in 0..6 {
            service.record_failure(&account, now).await.unwrap();
        }
        // Locked exactly once, at the threshold crossing
        assert_eq!(recorder.locked.load(Ordering::SeqCst), 1);

        service.record_success(&account).await.unwrap();
        assert_eq!(recorder.unlocked.load(Ordering::SeqCst), 1);
    }
}

//! Repository trait for login-attempt tracking.

use async_trait::async_trait;

use crate::{
    Error,
    lockout::{AccountId, LoginAttemptState},
};

/// Repository for per-account login-attempt state.
///
/// State is created implicitly: `find_by_account` returning `None` means
/// the account has no recorded failures and callers start from
/// [`LoginAttemptState::new`].
#[async_trait]
pub trait LoginAttemptRepository: Send + Sync + 'static {
    /// Load the attempt state for an account, if any has been recorded
    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<LoginAttemptState>, Error>;

    /// Insert or replace the attempt state for its account
    async fn upsert(&self, state: LoginAttemptState) -> Result<LoginAttemptState, Error>;
}

//! In-memory login-attempt repository.

use async_trait::async_trait;
use dashmap::DashMap;

use muni_core::{
    Error,
    lockout::{AccountId, LoginAttemptState},
    repositories::LoginAttemptRepository,
};

/// Login-attempt repository backed by a concurrent map.
#[derive(Default)]
pub struct MemoryLoginAttemptRepository {
    states: DashMap<AccountId, LoginAttemptState>,
}

impl MemoryLoginAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoginAttemptRepository for MemoryLoginAttemptRepository {
    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<LoginAttemptState>, Error> {
        Ok(self.states.get(account_id).map(|entry| entry.value().clone()))
    }

    async fn upsert(&self, state: LoginAttemptState) -> Result<LoginAttemptState, Error> {
        self.states.insert(state.account_id.clone(), state.clone());
        Ok(state)
    }
}

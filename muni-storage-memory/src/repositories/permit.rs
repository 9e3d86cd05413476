//! In-memory permit repository.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use muni_core::{
    Error,
    error::StorageError,
    permit::{Permit, PermitId, Transition},
    repositories::PermitRepository,
};

/// Permit repository backed by a concurrent map.
///
/// The compare-and-set contract of `update_status` holds per key: the
/// status check and the write happen under the same shard entry lock, so a
/// concurrent writer cannot slip between them.
#[derive(Default)]
pub struct MemoryPermitRepository {
    permits: DashMap<PermitId, Permit>,
}

impl MemoryPermitRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermitRepository for MemoryPermitRepository {
    async fn create(&self, permit: Permit) -> Result<Permit, Error> {
        self.permits.insert(permit.id.clone(), permit.clone());
        Ok(permit)
    }

    async fn find_by_id(&self, id: &PermitId) -> Result<Option<Permit>, Error> {
        Ok(self.permits.get(id).map(|entry| entry.value().clone()))
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<Permit>, Error> {
        let mut permits: Vec<Permit> = self
            .permits
            .iter()
            .filter(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone())
            .collect();
        permits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(permits)
    }

    async fn list_all(&self) -> Result<Vec<Permit>, Error> {
        Ok(self
            .permits
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn update_status(
        &self,
        id: &PermitId,
        transition: &Transition,
    ) -> Result<Permit, Error> {
        match self.permits.entry(id.clone()) {
            Entry::Vacant(_) => Err(StorageError::NotFound.into()),
            Entry::Occupied(mut entry) => {
                let stored = entry.get();
                if stored.status != transition.from {
                    return Err(StorageError::StaleStatus {
                        expected: transition.from,
                        found: stored.status,
                    }
                    .into());
                }
                let updated = stored.clone().apply(transition);
                entry.insert(updated.clone());
                Ok(updated)
            }
        }
    }
}

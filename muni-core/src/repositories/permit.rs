//! Repository trait for permit records.

use async_trait::async_trait;

use crate::{
    Error,
    permit::{Permit, PermitId, Transition},
};

/// Repository for permit data access.
///
/// The lifecycle state machine decides transitions; this trait persists
/// them. `update_status` carries the compare-and-set contract that protects
/// against lost updates: the stored status must still equal the status the
/// decision was made against.
#[async_trait]
pub trait PermitRepository: Send + Sync + 'static {
    /// Persist a newly created permit
    async fn create(&self, permit: Permit) -> Result<Permit, Error>;

    /// Find a permit by ID
    async fn find_by_id(&self, id: &PermitId) -> Result<Option<Permit>, Error>;

    /// List permits for an applicant email, ordered by creation descending
    async fn list_by_email(&self, email: &str) -> Result<Vec<Permit>, Error>;

    /// List every permit. Used by the dashboard aggregation and the expiry
    /// sweep; backends serving large datasets should push filtering down.
    async fn list_all(&self) -> Result<Vec<Permit>, Error>;

    /// Apply a decided transition to the stored record.
    ///
    /// Must fail with [`crate::error::StorageError::StaleStatus`] if the
    /// stored status differs from `transition.from`, and with
    /// [`crate::error::StorageError::NotFound`] if the permit does not
    /// exist. Returns the updated record.
    async fn update_status(&self, id: &PermitId, transition: &Transition)
    -> Result<Permit, Error>;
}

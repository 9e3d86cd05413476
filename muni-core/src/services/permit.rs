//! Permit application service.
//!
//! Coordinates the lifecycle state machine with the repository layer.
//! Every transition follows the same discipline: re-read the current
//! snapshot, let the state machine decide, hand the decision to the
//! repository's compare-and-set update. A concurrent writer that got there
//! first surfaces as `StorageError::StaleStatus` and the caller re-reads
//! and retries.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    Error,
    error::StorageError,
    events::{Event, EventBus},
    permit::{self, NewPermit, Permit, PermitId, StatusCounts, Transition},
    repositories::PermitRepository,
};

/// Configuration for time-driven lifecycle behavior.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// How long an application may sit unpaid before the expiry sweep may
    /// retire it.
    pub payment_ttl: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            payment_ttl: Duration::hours(48),
        }
    }
}

/// Service for permit application management.
///
/// # Thread Safety
///
/// The service is thread-safe; correctness under concurrent transitions to
/// the same permit rests on the repository's compare-and-set contract.
pub struct PermitService<R: PermitRepository> {
    repository: Arc<R>,
    config: LifecycleConfig,
    events: EventBus,
}

impl<R: PermitRepository> PermitService<R> {
    /// Create a new PermitService with the given repository.
    pub fn new(repository: Arc<R>, config: LifecycleConfig, events: EventBus) -> Self {
        Self {
            repository,
            config,
            events,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Submit a new permit application.
    ///
    /// Validates applicant fields, prices the application from the fee
    /// schedule, and persists it in `PendingPayment`.
    pub async fn submit_application(&self, new: NewPermit) -> Result<Permit, Error> {
        let permit = Permit::create(new, Utc::now())?;
        let permit = self.repository.create(permit).await?;

        tracing::info!(
            permit_id = %permit.id,
            kind = %permit.kind,
            amount = permit.amount,
            "Permit application submitted"
        );
        self.events.emit(&Event::PermitCreated(permit.clone())).await?;

        Ok(permit)
    }

    /// Get a permit by ID.
    pub async fn get_permit(&self, id: &PermitId) -> Result<Option<Permit>, Error> {
        self.repository.find_by_id(id).await
    }

    /// List an applicant's permits, newest first.
    pub async fn list_permits(&self, email: &str) -> Result<Vec<Permit>, Error> {
        self.repository.list_by_email(email).await
    }

    /// Move a permit into `PaymentProcessing` ahead of the checkout
    /// redirect. Idempotent while already processing.
    pub async fn begin_payment(&self, id: &PermitId) -> Result<Permit, Error> {
        self.transition(id, |permit| permit.begin_payment()).await
    }

    /// Record a successful payment reported by the provider webhook.
    pub async fn confirm_payment(
        &self,
        id: &PermitId,
        provider_reference: &str,
    ) -> Result<Permit, Error> {
        self.transition(id, |permit| permit.confirm_payment(provider_reference))
            .await
    }

    /// Record a failed payment reported by the provider webhook. The permit
    /// stays retryable.
    pub async fn fail_payment(&self, id: &PermitId, reason: &str) -> Result<Permit, Error> {
        self.transition(id, |permit| permit.fail_payment(reason)).await
    }

    /// Retire an unpaid permit past its TTL. `now` is supplied by the
    /// external sweep so runs are reproducible.
    pub async fn expire(&self, id: &PermitId, now: DateTime<Utc>) -> Result<Permit, Error> {
        let ttl = self.config.payment_ttl;
        self.transition(id, |permit| permit.expire(now, ttl)).await
    }

    /// Cancel a permit (admin-initiated). Legal from any non-terminal
    /// status.
    pub async fn cancel(&self, id: &PermitId) -> Result<Permit, Error> {
        self.transition(id, |permit| permit.cancel()).await
    }

    /// Refund a paid permit (admin-initiated).
    pub async fn refund(&self, id: &PermitId) -> Result<Permit, Error> {
        self.transition(id, |permit| permit.refund()).await
    }

    /// Per-status counts for the dashboard, zero-filled for every status.
    pub async fn dashboard_counts(&self) -> Result<StatusCounts, Error> {
        let permits = self.repository.list_all().await?;
        Ok(permit::aggregate_counts(&permits))
    }

    /// Re-read, decide, persist, announce.
    async fn transition<F>(&self, id: &PermitId, decide: F) -> Result<Permit, Error>
    where
        F: FnOnce(&Permit) -> Result<Transition, Error>,
    {
        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(StorageError::NotFound)?;

        let transition = decide(&current)?;

        // Idempotent decisions are already satisfied; don't touch storage
        // and don't re-announce.
        if transition.idempotent {
            tracing::debug!(permit_id = %id, status = %current.status, "Transition already applied");
            return Ok(current);
        }

        let updated = self.repository.update_status(id, &transition).await?;

        tracing::info!(
            permit_id = %id,
            from = %transition.from,
            to = %transition.to,
            "Permit status changed"
        );
        self.events
            .emit(&Event::PermitStatusChanged {
                permit_id: id.clone(),
                from: transition.from,
                to: transition.to,
                timestamp: Utc::now(),
            })
            .await?;

        Ok(updated)
    }
}

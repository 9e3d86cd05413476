//! Permit applications and their payment lifecycle
//!
//! This module contains the core permit struct and the status state machine
//! that drives it from submission through payment resolution to a terminal
//! state. The core permit struct is defined as follows:
//!
//! | Field              | Type               | Description                                            |
//! | ------------------ | ------------------ | ------------------------------------------------------ |
//! | `id`               | `PermitId`         | The unique identifier for the permit.                  |
//! | `full_name`        | `String`           | The applicant's full name.                             |
//! | `email`            | `String`           | The applicant's email address.                         |
//! | `phone`            | `String`           | The applicant's phone number.                          |
//! | `kind`             | `PermitKind`       | The municipal service category applied for.            |
//! | `application_type` | `ApplicationType`  | Whether this is a new application or a renewal.        |
//! | `status`           | `PermitStatus`     | The current lifecycle status.                          |
//! | `amount`           | `i64`              | The fee in minor currency units, fixed at creation.    |
//! | `created_at`       | `DateTime`         | The timestamp when the application was submitted.      |
//!
//! The state machine is decision-only: every operation takes the current
//! snapshot and returns a [`Transition`] for the caller to persist. Nothing
//! in this module touches storage or reads a clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    Error,
    error::PermitError,
    fees,
    id::{generate_prefixed_id, validate_prefixed_id},
    validation::{validate_email, validate_full_name, validate_phone},
};

/// A unique, stable identifier for a specific permit application
/// This value should be treated as opaque, and should not be parsed for meaning
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermitId(String);

impl PermitId {
    pub fn new(id: &str) -> Self {
        PermitId(id.to_string())
    }

    pub fn new_random() -> Self {
        PermitId(generate_prefixed_id("prm"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for a permit ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "prm")
    }
}

impl Default for PermitId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for PermitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PermitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for PermitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A municipal service category (e.g. `business-permit`).
///
/// The set of categories is open-ended: the authoritative list is the fee
/// schedule in [`crate::fees`], and a kind is only accepted at creation if
/// the schedule prices it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermitKind(String);

impl PermitKind {
    pub fn new(kind: &str) -> Self {
        PermitKind(kind.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PermitKind {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for PermitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an application is for a new permit or a renewal. Determines the
/// fee column used at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    New,
    Renew,
}

impl std::fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationType::New => write!(f, "new"),
            ApplicationType::Renew => write!(f, "renew"),
        }
    }
}

/// Lifecycle status of a permit application.
///
/// Transitions are monotonic along the state machine; the only legal re-entry
/// is `PaymentFailed` back through `PendingPayment` semantics via
/// [`Permit::begin_payment`]. `Expired`, `Refunded`, and `Cancelled` are
/// fully terminal; `Paid` admits only `refund`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    PendingPayment,
    PaymentProcessing,
    Paid,
    PaymentFailed,
    Expired,
    Refunded,
    Cancelled,
}

impl PermitStatus {
    /// Every known status, in dashboard display order.
    pub const ALL: [PermitStatus; 7] = [
        PermitStatus::PendingPayment,
        PermitStatus::PaymentProcessing,
        PermitStatus::Paid,
        PermitStatus::PaymentFailed,
        PermitStatus::Expired,
        PermitStatus::Refunded,
        PermitStatus::Cancelled,
    ];

    /// A terminal status admits no further transitions, with the single
    /// exception that `Paid` admits `refund`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PermitStatus::Paid
                | PermitStatus::Expired
                | PermitStatus::Refunded
                | PermitStatus::Cancelled
        )
    }

    /// A retryable status is one from which the applicant may (re-)attempt
    /// payment.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            PermitStatus::PendingPayment | PermitStatus::PaymentFailed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermitStatus::PendingPayment => "pending_payment",
            PermitStatus::PaymentProcessing => "payment_processing",
            PermitStatus::Paid => "paid",
            PermitStatus::PaymentFailed => "payment_failed",
            PermitStatus::Expired => "expired",
            PermitStatus::Refunded => "refunded",
            PermitStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PermitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new permit application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPermit {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub kind: PermitKind,
    pub application_type: ApplicationType,
}

/// A permit application as persisted by the backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permit {
    /// The unique identifier for the permit.
    pub id: PermitId,

    /// The applicant's full name.
    pub full_name: String,

    /// The applicant's email address.
    pub email: String,

    /// The applicant's phone number.
    pub phone: String,

    /// The municipal service category applied for.
    pub kind: PermitKind,

    /// Whether this is a new application or a renewal.
    pub application_type: ApplicationType,

    /// The current lifecycle status.
    pub status: PermitStatus,

    /// The fee in minor currency units, fixed at creation from the fee
    /// schedule.
    pub amount: i64,

    /// Payment-provider reference recorded on confirmation, opaque to this
    /// component. Kept for audit.
    pub provider_reference: Option<String>,

    /// Reason supplied with the most recent payment failure, retained for
    /// display. Cleared when payment is retried.
    pub failure_reason: Option<String>,

    /// The timestamp when the application was submitted. Immutable.
    pub created_at: DateTime<Utc>,
}

/// A decided status change, returned by the lifecycle operations for the
/// caller to persist.
///
/// The state machine never writes to storage itself; the caller applies the
/// transition with compare-and-set semantics on `from` so concurrent updates
/// to the same permit cannot be lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Status the decision was made against. Persistence must fail if the
    /// stored status no longer matches.
    pub from: PermitStatus,

    /// Decided next status.
    pub to: PermitStatus,

    /// Provider reference to record, if the operation carried one.
    pub provider_reference: Option<String>,

    /// Failure reason to record, if the operation carried one.
    pub failure_reason: Option<String>,

    /// True when the operation was already satisfied (`begin_payment` while
    /// processing). Idempotent transitions need not be persisted.
    pub idempotent: bool,
}

impl Transition {
    fn step(from: PermitStatus, to: PermitStatus) -> Self {
        Self {
            from,
            to,
            provider_reference: None,
            failure_reason: None,
            idempotent: false,
        }
    }
}

impl Permit {
    /// Create a new permit application in `PendingPayment`.
    ///
    /// Validates the applicant's contact fields and resolves the fee from
    /// the schedule. An unknown (kind, application type) pair fails with
    /// [`PermitError::InvalidServiceKind`]; a zero fee is never assigned
    /// silently.
    pub fn create(new: NewPermit, now: DateTime<Utc>) -> Result<Permit, Error> {
        validate_full_name(&new.full_name)?;
        validate_email(&new.email)?;
        validate_phone(&new.phone)?;

        let amount = fees::fee_for(&new.kind, new.application_type).ok_or_else(|| {
            PermitError::InvalidServiceKind {
                kind: new.kind.to_string(),
                application_type: new.application_type.to_string(),
            }
        })?;

        Ok(Permit {
            id: PermitId::new_random(),
            full_name: new.full_name,
            email: new.email,
            phone: new.phone,
            kind: new.kind,
            application_type: new.application_type,
            status: PermitStatus::PendingPayment,
            amount,
            provider_reference: None,
            failure_reason: None,
            created_at: now,
        })
    }

    /// Decide the transition into `PaymentProcessing`.
    ///
    /// Legal from `PendingPayment` and `PaymentFailed` (payment retry).
    /// Calling while already `PaymentProcessing` is an idempotent success so
    /// that a double-submitted checkout redirect is not an error; any other
    /// status fails with [`PermitError::IllegalTransition`].
    pub fn begin_payment(&self) -> Result<Transition, Error> {
        match self.status {
            PermitStatus::PendingPayment | PermitStatus::PaymentFailed => Ok(Transition::step(
                self.status,
                PermitStatus::PaymentProcessing,
            )),
            PermitStatus::PaymentProcessing => Ok(Transition {
                idempotent: true,
                ..Transition::step(self.status, PermitStatus::PaymentProcessing)
            }),
            from => Err(PermitError::IllegalTransition {
                from,
                operation: "begin_payment",
            }
            .into()),
        }
    }

    /// Decide the transition into `Paid`.
    ///
    /// Legal only from `PaymentProcessing`. The provider reference is
    /// recorded for audit and otherwise opaque.
    pub fn confirm_payment(&self, provider_reference: &str) -> Result<Transition, Error> {
        match self.status {
            PermitStatus::PaymentProcessing => Ok(Transition {
                provider_reference: Some(provider_reference.to_string()),
                ..Transition::step(self.status, PermitStatus::Paid)
            }),
            from => Err(PermitError::IllegalTransition {
                from,
                operation: "confirm_payment",
            }
            .into()),
        }
    }

    /// Decide the transition into `PaymentFailed`.
    ///
    /// Legal only from `PaymentProcessing`. The reason is retained for
    /// display; the status is retryable via [`Permit::begin_payment`].
    pub fn fail_payment(&self, reason: &str) -> Result<Transition, Error> {
        match self.status {
            PermitStatus::PaymentProcessing => Ok(Transition {
                failure_reason: Some(reason.to_string()),
                ..Transition::step(self.status, PermitStatus::PaymentFailed)
            }),
            from => Err(PermitError::IllegalTransition {
                from,
                operation: "fail_payment",
            }
            .into()),
        }
    }

    /// Decide the transition into `Expired`.
    ///
    /// Legal from `PendingPayment` and `PaymentProcessing` once `now` is past
    /// `created_at + ttl`. The clock is always supplied by the caller (an
    /// external sweep); this component never reads time itself. A premature
    /// call is a state-machine violation, not a no-op.
    pub fn expire(&self, now: DateTime<Utc>, ttl: Duration) -> Result<Transition, Error> {
        let expirable = matches!(
            self.status,
            PermitStatus::PendingPayment | PermitStatus::PaymentProcessing
        );
        if !expirable || now <= self.created_at + ttl {
            return Err(PermitError::IllegalTransition {
                from: self.status,
                operation: "expire",
            }
            .into());
        }
        Ok(Transition::step(self.status, PermitStatus::Expired))
    }

    /// Decide the transition into `Cancelled`. Legal from any non-terminal
    /// status; admin-initiated.
    pub fn cancel(&self) -> Result<Transition, Error> {
        if self.status.is_terminal() {
            return Err(PermitError::IllegalTransition {
                from: self.status,
                operation: "cancel",
            }
            .into());
        }
        Ok(Transition::step(self.status, PermitStatus::Cancelled))
    }

    /// Decide the transition into `Refunded`. Legal only from `Paid`;
    /// admin-initiated.
    pub fn refund(&self) -> Result<Transition, Error> {
        match self.status {
            PermitStatus::Paid => Ok(Transition::step(self.status, PermitStatus::Refunded)),
            from => Err(PermitError::IllegalTransition {
                from,
                operation: "refund",
            }
            .into()),
        }
    }

    /// Produce the snapshot that results from applying a decided transition.
    ///
    /// A retry out of `PaymentFailed` clears the retained failure reason.
    pub fn apply(mut self, transition: &Transition) -> Permit {
        self.status = transition.to;
        if let Some(reference) = &transition.provider_reference {
            self.provider_reference = Some(reference.clone());
        }
        if let Some(reason) = &transition.failure_reason {
            self.failure_reason = Some(reason.clone());
        } else if transition.to == PermitStatus::PaymentProcessing {
            self.failure_reason = None;
        }
        self
    }
}

/// Per-status permit counts for dashboard rendering.
///
/// Every known status is present, zero-filled, so empty buckets render
/// consistently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub counts: BTreeMap<PermitStatus, usize>,
    pub total: usize,
}

impl StatusCounts {
    pub fn get(&self, status: PermitStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }
}

/// Count permits by status. Pure; used by the dashboard aggregation query.
pub fn aggregate_counts<'a, I>(permits: I) -> StatusCounts
where
    I: IntoIterator<Item = &'a Permit>,
{
    let mut counts: BTreeMap<PermitStatus, usize> =
        PermitStatus::ALL.iter().map(|s| (*s, 0)).collect();
    let mut total = 0;
    for permit in permits {
        *counts.entry(permit.status).or_insert(0) += 1;
        total += 1;
    }
    StatusCounts { counts, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees;

    fn new_permit(kind: &str, application_type: ApplicationType) -> NewPermit {
        NewPermit {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+15551234567".to_string(),
            kind: PermitKind::new(kind),
            application_type,
        }
    }

    fn created() -> Permit {
        Permit::create(
            new_permit("business-permit", ApplicationType::New),
            Utc::now(),
        )
        .unwrap()
    }

    fn at(permit: Permit, status: PermitStatus) -> Permit {
        Permit { status, ..permit }
    }

    #[test]
    fn test_create_sets_pending_payment_and_table_amount() {
        for kind in fees::known_kinds() {
            for application_type in [ApplicationType::New, ApplicationType::Renew] {
                let permit = Permit::create(
                    new_permit(kind.as_str(), application_type),
                    Utc::now(),
                )
                .unwrap();
                assert_eq!(permit.status, PermitStatus::PendingPayment);
                assert_eq!(
                    permit.amount,
                    fees::fee_for(&kind, application_type).unwrap()
                );
                assert!(permit.id.is_valid());
            }
        }
    }

    #[test]
    fn test_create_unknown_kind_fails() {
        let result = Permit::create(new_permit("dog-license", ApplicationType::New), Utc::now());
        assert!(matches!(
            result,
            Err(Error::Permit(PermitError::InvalidServiceKind { .. }))
        ));
    }

    #[test]
    fn test_create_rejects_bad_contact_fields() {
        let mut new = new_permit("business-permit", ApplicationType::New);
        new.email = "not-an-email".to_string();
        assert!(matches!(
            Permit::create(new, Utc::now()),
            Err(Error::Validation(_))
        ));

        let mut new = new_permit("business-permit", ApplicationType::New);
        new.phone = "12".to_string();
        assert!(matches!(
            Permit::create(new, Utc::now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_begin_payment_is_idempotent_while_processing() {
        let permit = created();

        let first = permit.begin_payment().unwrap();
        assert_eq!(first.to, PermitStatus::PaymentProcessing);
        assert!(!first.idempotent);

        let permit = permit.apply(&first);
        let second = permit.begin_payment().unwrap();
        assert_eq!(second.to, PermitStatus::PaymentProcessing);
        assert!(second.idempotent);
    }

    #[test]
    fn test_begin_payment_retries_after_failure() {
        let permit = created();
        let permit = at(permit, PermitStatus::PaymentFailed);
        let transition = permit.begin_payment().unwrap();
        assert_eq!(transition.to, PermitStatus::PaymentProcessing);

        // Retry clears the stored failure reason
        let permit = Permit {
            failure_reason: Some("card declined".to_string()),
            ..permit
        };
        let permit = permit.apply(&transition);
        assert_eq!(permit.failure_reason, None);
    }

    #[test]
    fn test_confirm_payment_requires_processing() {
        let permit = created();

        for status in PermitStatus::ALL {
            let permit = at(permit.clone(), status);
            let result = permit.confirm_payment("ch_123");
            if status == PermitStatus::PaymentProcessing {
                let transition = result.unwrap();
                assert_eq!(transition.to, PermitStatus::Paid);
                assert_eq!(transition.provider_reference.as_deref(), Some("ch_123"));
            } else {
                assert!(matches!(
                    result,
                    Err(Error::Permit(PermitError::IllegalTransition {
                        operation: "confirm_payment",
                        ..
                    }))
                ));
            }
        }
    }

    #[test]
    fn test_fail_payment_retains_reason() {
        let permit = at(created(), PermitStatus::PaymentProcessing);
        let transition = permit.fail_payment("card declined").unwrap();
        assert_eq!(transition.to, PermitStatus::PaymentFailed);

        let permit = permit.apply(&transition);
        assert_eq!(permit.failure_reason.as_deref(), Some("card declined"));
        assert!(permit.status.is_retryable());
    }

    #[test]
    fn test_expire_requires_ttl_elapsed() {
        let permit = created();
        let ttl = Duration::hours(48);

        // Too early
        assert!(permit.expire(permit.created_at + Duration::hours(1), ttl).is_err());

        // Past the TTL
        let transition = permit
            .expire(permit.created_at + Duration::hours(49), ttl)
            .unwrap();
        assert_eq!(transition.to, PermitStatus::Expired);

        // Paid permits never expire
        let paid = at(permit, PermitStatus::Paid);
        assert!(paid.expire(paid.created_at + Duration::hours(49), ttl).is_err());
    }

    #[test]
    fn test_cancel_from_every_non_terminal_status() {
        let permit = created();

        for status in PermitStatus::ALL {
            let permit = at(permit.clone(), status);
            let result = permit.cancel();
            if status.is_terminal() {
                assert!(result.is_err(), "cancel from {status} should fail");
            } else {
                assert_eq!(result.unwrap().to, PermitStatus::Cancelled);
            }
        }
    }

    #[test]
    fn test_cancelled_admits_no_further_transitions() {
        let permit = at(created(), PermitStatus::Cancelled);

        assert!(permit.begin_payment().is_err());
        assert!(permit.confirm_payment("ch_123").is_err());
        assert!(permit.fail_payment("x").is_err());
        assert!(permit
            .expire(permit.created_at + Duration::days(30), Duration::hours(48))
            .is_err());
        assert!(permit.cancel().is_err());
        assert!(permit.refund().is_err());
    }

    #[test]
    fn test_refund_requires_paid() {
        let paid = at(created(), PermitStatus::Paid);
        assert_eq!(paid.refund().unwrap().to, PermitStatus::Refunded);

        let refunded = at(paid, PermitStatus::Refunded);
        assert!(refunded.refund().is_err());
    }

    #[test]
    fn test_aggregate_counts_empty() {
        let counts = aggregate_counts([]);
        assert_eq!(counts.total, 0);
        for status in PermitStatus::ALL {
            assert_eq!(counts.get(status), 0);
        }
        assert_eq!(counts.counts.len(), PermitStatus::ALL.len());
    }

    #[test]
    fn test_status_counts_json_shape() {
        // Dashboard contract: every status present as a snake_case key.
        let counts = aggregate_counts([&at(created(), PermitStatus::Paid)]);
        let json = serde_json::to_value(&counts).unwrap();

        assert_eq!(json["total"], 1);
        assert_eq!(json["counts"]["paid"], 1);
        assert_eq!(json["counts"]["pending_payment"], 0);
        assert_eq!(json["counts"]["payment_processing"], 0);
        assert_eq!(json["counts"]["cancelled"], 0);
    }

    #[test]
    fn test_aggregate_counts_buckets() {
        let a = created();
        let b = at(created(), PermitStatus::Paid);
        let c = at(created(), PermitStatus::Paid);

        let counts = aggregate_counts([&a, &b, &c]);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.get(PermitStatus::PendingPayment), 1);
        assert_eq!(counts.get(PermitStatus::Paid), 2);
        assert_eq!(counts.get(PermitStatus::Expired), 0);
    }
}

//! Static fee schedule for municipal services
//!
//! Fees are fixed in minor currency units (cents) per (service kind,
//! application type) pair. The schedule is data, not code: adding a service
//! means adding a row here and nothing else. Lookups for unknown pairs fail
//! loudly rather than pricing the application at zero.

use crate::permit::{ApplicationType, PermitKind};

/// One row of the fee schedule: service kind, new-application fee,
/// renewal fee. Amounts are minor currency units.
struct FeeRow {
    kind: &'static str,
    new: i64,
    renew: i64,
}

static FEE_TABLE: &[FeeRow] = &[
    FeeRow {
        kind: "business-permit",
        new: 7_500,
        renew: 5_000,
    },
    FeeRow {
        kind: "building-permit",
        new: 12_000,
        renew: 9_000,
    },
    FeeRow {
        kind: "signage-permit",
        new: 4_500,
        renew: 3_000,
    },
    FeeRow {
        kind: "food-establishment-permit",
        new: 10_000,
        renew: 8_000,
    },
    FeeRow {
        kind: "special-event-permit",
        new: 6_000,
        renew: 6_000,
    },
];

/// Look up the fee for a (service kind, application type) pair.
///
/// Returns `None` when the pair has no entry in the schedule; callers must
/// treat that as a rejected application, never as a free one.
pub fn fee_for(kind: &PermitKind, application_type: ApplicationType) -> Option<i64> {
    FEE_TABLE
        .iter()
        .find(|row| row.kind == kind.as_str())
        .map(|row| match application_type {
            ApplicationType::New => row.new,
            ApplicationType::Renew => row.renew,
        })
}

/// All service kinds with a published fee, for directory listings.
pub fn known_kinds() -> impl Iterator<Item = PermitKind> {
    FEE_TABLE.iter().map(|row| PermitKind::new(row.kind))
}

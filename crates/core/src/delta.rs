//! Delta descriptors and conditional-write outcomes
//!
//! A [`Delta`] describes one change to one record field. Deltas are the unit
//! of concurrent application: Increment/Decrement commute and may be applied
//! in any order; `Set` does not commute and must go through the
//! version-checked path.

use crate::types::VersionToken;
use serde::{Deserialize, Serialize};

/// The kind of change a delta describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaKind {
    /// Add the amount to the field
    Increment,
    /// Subtract the amount from the field
    Decrement,
    /// Overwrite the field with the amount
    Set,
}

impl std::fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeltaKind::Increment => "increment",
            DeltaKind::Decrement => "decrement",
            DeltaKind::Set => "set",
        };
        write!(f, "{}", name)
    }
}

/// A described change to a single record field
///
/// # Examples
///
/// ```
/// use tally_core::delta::{Delta, DeltaKind};
///
/// let delta = Delta::increment("views", 1);
/// assert_eq!(delta.kind(), DeltaKind::Increment);
/// assert_eq!(delta.field(), "views");
/// assert_eq!(delta.amount(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    field: String,
    amount: i64,
    kind: DeltaKind,
}

impl Delta {
    /// Describe adding `amount` to `field`
    pub fn increment(field: impl Into<String>, amount: i64) -> Self {
        Delta {
            field: field.into(),
            amount,
            kind: DeltaKind::Increment,
        }
    }

    /// Describe subtracting `amount` from `field`
    pub fn decrement(field: impl Into<String>, amount: i64) -> Self {
        Delta {
            field: field.into(),
            amount,
            kind: DeltaKind::Decrement,
        }
    }

    /// Describe overwriting `field` with `amount`
    pub fn set(field: impl Into<String>, amount: i64) -> Self {
        Delta {
            field: field.into(),
            amount,
            kind: DeltaKind::Set,
        }
    }

    /// Target field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Change amount
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Change kind
    pub fn kind(&self) -> DeltaKind {
        self.kind
    }

    /// Whether this delta commutes with concurrent deltas
    ///
    /// Increment and Decrement are order-independent and eligible for the
    /// atomic path; `Set` is not.
    pub fn is_commutative(&self) -> bool {
        !matches!(self.kind, DeltaKind::Set)
    }
}

/// Result of a successful delta application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the outcome carries the new version and value the caller conditioned on"]
pub struct ApplyOutcome {
    /// Version token produced by the write
    pub version: VersionToken,
    /// Post-application value of the delta's field
    pub value: i64,
}

/// Outcome of a conditional (compare-and-swap) write
///
/// Conflicts are ordinary values, not errors: retry loops branch on this
/// enum rather than catching exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "ignoring a CAS outcome silently drops conflicts"]
pub enum CasOutcome {
    /// The stored version matched and the write was applied
    Applied(VersionToken),
    /// The stored version no longer matched; nothing was written
    Conflict {
        /// The version actually stored at comparison time
        actual: VersionToken,
    },
}

impl CasOutcome {
    /// Whether the write was applied
    pub fn is_applied(&self) -> bool {
        matches!(self, CasOutcome::Applied(_))
    }
}

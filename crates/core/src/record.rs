//! Ledger records and the pure delta-application function
//!
//! A [`Record`] is a keyed entity with one or more named numeric fields.
//! Mutation is modeled as an explicit `Record -> Delta -> new Record` pure
//! function ([`Record::apply`]) plus an explicit conditional write at the
//! backend; there is no hidden change tracking.

use crate::delta::{Delta, DeltaKind};
use crate::error::{Error, Result};
use crate::types::{LogicalTimestamp, VersionToken};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A record's numeric fields
///
/// Field values are signed 64-bit amounts (balances, counters, quantities).
/// Increment/Decrement treat an absent field as starting from zero; `Set`
/// writes the field unconditionally.
///
/// # Examples
///
/// ```
/// use tally_core::record::Record;
/// use tally_core::delta::Delta;
///
/// let record = Record::with_field("savings", 100);
/// let next = record.apply(&Delta::decrement("savings", 30)).unwrap();
/// assert_eq!(next.get("savings"), Some(70));
/// assert_eq!(record.get("savings"), Some(100)); // original untouched
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    fields: FxHashMap<String, i64>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record with a single field
    pub fn with_field(field: impl Into<String>, amount: i64) -> Self {
        let mut fields = FxHashMap::default();
        fields.insert(field.into(), amount);
        Record { fields }
    }

    /// Create a record from field/amount pairs
    pub fn from_fields<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Record {
            fields: pairs.into_iter().map(|(f, a)| (f.into(), a)).collect(),
        }
    }

    /// Get a field's value, or `None` if the field is absent
    pub fn get(&self, field: &str) -> Option<i64> {
        self.fields.get(field).copied()
    }

    /// Set a field's value directly
    pub fn set(&mut self, field: impl Into<String>, amount: i64) {
        self.fields.insert(field.into(), amount);
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over field/amount pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.fields.iter().map(|(f, a)| (f.as_str(), *a))
    }

    /// Apply a delta, producing a new record
    ///
    /// Pure function: `self` is never mutated. Increment and Decrement use
    /// checked arithmetic and fail with [`Error::Overflow`] on wraparound;
    /// an absent field starts from zero. `Set` overwrites the field with the
    /// delta amount regardless of prior state.
    pub fn apply(&self, delta: &Delta) -> Result<Record> {
        let mut next = self.clone();
        let current = next.get(delta.field()).unwrap_or(0);
        let value = match delta.kind() {
            DeltaKind::Increment => {
                current
                    .checked_add(delta.amount())
                    .ok_or_else(|| Error::Overflow {
                        field: delta.field().to_string(),
                    })?
            }
            DeltaKind::Decrement => {
                current
                    .checked_sub(delta.amount())
                    .ok_or_else(|| Error::Overflow {
                        field: delta.field().to_string(),
                    })?
            }
            DeltaKind::Set => delta.amount(),
        };
        next.fields.insert(delta.field().to_string(), value);
        Ok(next)
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for Record {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        Record::from_fields(iter)
    }
}

/// A record together with its storage metadata
///
/// What backends store and return: the field values, the version token that
/// changed on the last successful write, the logical timestamp of the last
/// merge/insert, and a wall-clock `updated_at` carried for diagnostics only
/// (conflict resolution never consults it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord {
    /// The record's field values
    pub record: Record,
    /// Token from the most recent successful write
    pub version: VersionToken,
    /// Logical timestamp from the most recent insert or merge
    pub logical_timestamp: LogicalTimestamp,
    /// Unix seconds of the most recent write, diagnostic only
    pub updated_at: i64,
}

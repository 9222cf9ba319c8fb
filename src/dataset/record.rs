//! Row records and the copy-on-write dataset handle.
//!
//! A [`Dataset`] is an immutable, cheaply clonable sequence of shared row
//! records. Every mutator returns a new `Dataset`; rows that were not touched
//! stay pointer-equal between the old and new sequence, which is what lets the
//! optimized view memoize per-row output with a shallow identity check.

#![allow(missing_docs)]

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Exclusive upper bound for a row's numeric value.
pub const VALUE_LIMIT: u32 = 10_000;

/// Row lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Active,
    Pending,
    Archived,
    Critical,
}

impl Status {
    /// Every status, in declaration order.
    pub const ALL: [Self; 4] = [Self::Active, Self::Pending, Self::Archived, Self::Critical];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Pending => "Pending",
            Self::Archived => "Archived",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of the synthetic dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    pub id: String,
    pub label: String,
    pub value: u32,
    pub status: Status,
    pub description: String,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub last_updated: String,
}

impl RowRecord {
    /// Copy of this record with a new value and a refreshed timestamp.
    #[must_use]
    pub fn with_value(&self, value: u32, at: DateTime<Utc>) -> Self {
        Self {
            value,
            last_updated: iso_timestamp(at),
            ..self.clone()
        }
    }
}

/// ISO-8601 rendering used for `last_updated` (`2026-10-17T12:00:00.000Z`).
#[must_use]
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Immutable ordered sequence of shared row records.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Arc<Vec<Arc<RowRecord>>>,
}

impl Dataset {
    #[must_use]
    pub fn new(rows: Vec<RowRecord>) -> Self {
        Self {
            rows: Arc::new(rows.into_iter().map(Arc::new).collect()),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<RowRecord>> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RowRecord>> {
        self.rows.iter()
    }

    #[must_use]
    pub fn rows(&self) -> &[Arc<RowRecord>] {
        &self.rows
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    /// Whether both handles point at the very same sequence.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }

    /// New sequence with `record` at `index`; every other row stays shared.
    ///
    /// Returns `None` when `index` is out of bounds.
    #[must_use]
    pub fn with_replaced(&self, index: usize, record: RowRecord) -> Option<Self> {
        if index >= self.rows.len() {
            return None;
        }
        let mut rows = Vec::with_capacity(self.rows.len());
        rows.extend_from_slice(&self.rows);
        rows[index] = Arc::new(record);
        Some(Self {
            rows: Arc::new(rows),
        })
    }

    /// New sequence without the row carrying `id`, order preserved.
    ///
    /// Returns `None` when no row has that id.
    #[must_use]
    pub fn without(&self, id: &str) -> Option<Self> {
        self.position(id)?;
        let rows: Vec<Arc<RowRecord>> = self
            .rows
            .iter()
            .filter(|row| row.id != id)
            .cloned()
            .collect();
        Some(Self {
            rows: Arc::new(rows),
        })
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.rows == other.rows
    }
}

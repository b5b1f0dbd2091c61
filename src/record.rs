//! Decoded log record: an insertion-ordered map of string fields.
//!
//! Key order is observable output (downstream ingestion relies on
//! first-encounter order), so the record wraps an [`IndexMap`] rather than
//! a hash map. Duplicate field names follow a first-write-wins rule: the
//! command envelope's `FF` station login must not be overwritten by a later
//! `FF` in the payload.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;

/// One decoded history record.
///
/// All values are strings; they serialize as JSON strings and are never
/// coerced numerically. Absent fields are omitted, never `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LogRecord {
    fields: IndexMap<String, String>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a field, first write wins.
    ///
    /// Returns `true` if the value was stored, `false` if the key already
    /// held a value (the new one is silently discarded).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        match self.fields.entry(key.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

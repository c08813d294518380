// Copyright 2024
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Records selected for export and the pending set used while locating them.

use std::collections::btree_map::{self, BTreeMap};
use std::path::PathBuf;

use bytes::Bytes;

/// A record selected upstream for export.
///
/// The export core only looks at the identifier. The record itself is handed
/// to the captioner untouched, so it must be movable into worker threads.
pub trait Record: Send + 'static {
    /// Unique, totally ordered identifier of the record.
    fn id(&self) -> u64;
}

/// Bare identifiers are records without metadata.
impl Record for u64 {
    fn id(&self) -> u64 {
        *self
    }
}

/// A located record together with the payload extracted for it.
///
/// Items are immutable once extracted and owned by whoever processes them.
#[derive(Debug, Clone)]
pub struct ExportItem<R> {
    /// Record id, equal to `record.id()`
    pub id: u64,
    /// Extension of the payload entry without the leading dot, e.g. `webp`
    pub extension: String,
    /// Payload bytes
    pub content: Bytes,
    /// The record the payload was requested for
    pub record: R,
    /// Shard the payload was read from
    pub shard: PathBuf,
}

/// The shrinking working set of records that have not been located yet.
///
/// A pending set is built once (by grouping or by merging remainders) and then
/// only shrinks: a record leaves the set the moment its payload is matched, so
/// later tiers never see it again.
#[derive(Debug)]
pub struct PendingSet<R> {
    records: BTreeMap<u64, R>,
}

impl<R: Record> PendingSet<R> {
    /// Create an empty pending set
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Add a record while the set is being built.
    ///
    /// Returns false if a record with the same id is already pending; the
    /// first record wins.
    pub(crate) fn insert(&mut self, record: R) -> bool {
        match self.records.entry(record.id()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Move every record of `other` into this set.
    pub(crate) fn absorb(&mut self, other: PendingSet<R>) {
        for (id, record) in other.records {
            self.records.entry(id).or_insert(record);
        }
    }

    /// Check whether an id is still pending
    pub fn contains(&self, id: u64) -> bool {
        self.records.contains_key(&id)
    }

    /// Remove a matched id, handing back its record.
    pub fn take(&mut self, id: u64) -> Option<R> {
        self.records.remove(&id)
    }

    /// Number of records still pending
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pending ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.records.keys().copied()
    }

    /// Consume the set, yielding records in ascending id order.
    pub fn into_records(self) -> impl Iterator<Item = R> {
        self.records.into_values()
    }
}

impl<R: Record> Default for PendingSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> FromIterator<R> for PendingSet<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut set = PendingSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

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

use std::fmt;

use log::{error, info, warn};

use crate::error::Result;
use crate::readers::ShardFailure;
use crate::record::Record;

/// Why a record could not be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No shard file exists for any tier of the record's bucket.
    MissingShard,
    /// Shards were scanned but none held the record.
    MissingEntry,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::MissingShard => write!(f, "missing shard"),
            NotFoundReason::MissingEntry => write!(f, "missing entry"),
        }
    }
}

/// A record whose payload was not found in any tier.
#[derive(Debug)]
pub struct NotFound<R> {
    pub record: R,
    pub reason: NotFoundReason,
}

impl<R: Record> NotFound<R> {
    /// Id of the missing record
    pub fn id(&self) -> u64 {
        self.record.id()
    }
}

/// Outcome of one export run.
///
/// Every requested id is accounted for exactly once:
/// `success + failed + skipped + not_found.len() == requested`.
#[derive(Debug)]
pub struct ExportReport<R> {
    /// Distinct record ids handed to the run
    pub requested: usize,
    /// Items captioned and saved
    pub success: usize,
    /// Items whose captioner or saver failed
    pub failed: usize,
    /// Items never attempted because the run was cancelled
    pub skipped: usize,
    /// Records found in no shard, ascending by id
    pub not_found: Vec<NotFound<R>>,
    /// Shards that could not be scanned
    pub shard_failures: Vec<ShardFailure>,
    /// Whether the run stopped early on request
    pub cancelled: bool,
}

impl<R: Record> ExportReport<R> {
    /// Ids of the records that were not found, ascending
    pub fn not_found_ids(&self) -> Vec<u64> {
        self.not_found.iter().map(NotFound::id).collect()
    }

    /// Number of not-found records whose bucket had no shard at all
    pub fn missing_shard_count(&self) -> usize {
        self.count_reason(NotFoundReason::MissingShard)
    }

    /// Number of not-found records absent from existing shards
    pub fn missing_entry_count(&self) -> usize {
        self.count_reason(NotFoundReason::MissingEntry)
    }

    fn count_reason(&self, reason: NotFoundReason) -> usize {
        self.not_found.iter().filter(|n| n.reason == reason).count()
    }

    /// Number of ids the report accounts for
    pub fn accounted(&self) -> usize {
        self.success + self.failed + self.skipped + self.not_found.len()
    }

    /// Logs the run summary, with at most `sample` not-found ids.
    pub(crate) fn log_summary(&self, sample: usize) {
        info!(
            "Exported {} of {} records ({} failed, {} not found, {} skipped)",
            self.success,
            self.requested,
            self.failed,
            self.not_found.len(),
            self.skipped
        );

        if !self.not_found.is_empty() {
            let ids: Vec<u64> = self.not_found.iter().take(sample).map(NotFound::id).collect();
            warn!(
                "{} records not found ({} without a shard, {} absent from shards), first: {:?}",
                self.not_found.len(),
                self.missing_shard_count(),
                self.missing_entry_count(),
                ids
            );
        }

        if !self.shard_failures.is_empty() {
            warn!("{} shards could not be scanned", self.shard_failures.len());
        }
        if self.failed > 0 {
            warn!("{} items failed while captioning or saving", self.failed);
        }
        if self.cancelled {
            warn!("Export was cancelled, {} records skipped", self.skipped);
        }
    }
}

/// Running success and failure counts of one export.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tally {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Tally {
    /// Counts the outcome of one item, logging failures with the item id.
    pub fn record(&mut self, id: u64, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.success += 1,
            Err(e) => {
                error!("Failed to export item {}: {}", id, e);
                self.failed += 1;
            }
        }
    }
}

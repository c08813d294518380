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

use std::path::{Path, PathBuf};

use log::{trace, warn};

use crate::error::{ExportError, Result};
use crate::readers::entry::ShardEntry;
use crate::readers::reader_set::ReaderSet;
use crate::record::{ExportItem, PendingSet, Record};
use crate::sharding::ShardNaming;

/// A shard that could not be scanned.
///
/// The records it may have held stay pending and can still be found in
/// later shards; otherwise they end up not found.
#[derive(Debug)]
pub struct ShardFailure {
    /// Shard that failed
    pub shard: PathBuf,
    /// What went wrong
    pub error: ExportError,
}

/// Result of one [`read_shards`] invocation.
#[derive(Debug)]
pub struct ReadOutcome<R> {
    /// Matched items in discovery order
    pub items: Vec<ExportItem<R>>,
    /// Shards that could not be scanned
    pub failures: Vec<ShardFailure>,
    /// Number of shards scanned successfully
    pub scanned: usize,
}

impl<R> Default for ReadOutcome<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
            scanned: 0,
        }
    }
}

fn scan_one<R: Record>(
    readers: &ReaderSet,
    naming: &ShardNaming,
    path: &Path,
    pending: &PendingSet<R>,
) -> Result<Vec<ShardEntry>> {
    let format = naming.format_of(path).ok_or_else(|| {
        ExportError::UnsupportedShardFormat(format!("unknown extension: {}", path.display()))
    })?;
    let reader = readers.reader_for(format)?;

    trace!("Scanning {} with {}", path.display(), reader.name());
    reader.scan(path, &|id: u64| pending.contains(id))
}

/// Reads a list of shards as one logical namespace on behalf of `pending`.
///
/// Shards are scanned in the given order, each at most once. After every
/// shard the records it matched are removed from `pending`, so an id present
/// in several shards is delivered from the first one only and later copies
/// are skipped. Scanning stops early once nothing is pending.
///
/// On return `pending` holds exactly the records whose ids were found in no
/// successfully scanned shard.
pub fn read_shards<R: Record>(
    readers: &ReaderSet,
    naming: &ShardNaming,
    paths: &[PathBuf],
    pending: &mut PendingSet<R>,
) -> ReadOutcome<R> {
    let mut outcome = ReadOutcome::default();

    for path in paths {
        if pending.is_empty() {
            trace!("Nothing pending, skipping the remaining shards");
            break;
        }

        let entries = match scan_one(readers, naming, path, pending) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to scan shard {}: {}", path.display(), e);
                outcome.failures.push(ShardFailure {
                    shard: path.clone(),
                    error: ExportError::in_shard(path.display().to_string(), e),
                });
                continue;
            }
        };
        outcome.scanned += 1;

        for entry in entries {
            match pending.take(entry.id) {
                Some(record) => outcome.items.push(ExportItem {
                    id: entry.id,
                    extension: entry.extension,
                    content: entry.content,
                    record,
                    shard: path.clone(),
                }),
                None => trace!("Entry {} in {} is no longer pending", entry.id, path.display()),
            }
        }
    }

    outcome
}

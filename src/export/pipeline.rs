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

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, info, trace, warn};

use crate::constants::{DEFAULT_BATCH_SIZE, NOT_FOUND_LOG_SAMPLE};
use crate::error::{ExportError, Result};
use crate::export::cancel::CancellationToken;
use crate::export::collaborators::{Captioner, Saver};
use crate::export::dispatch::{Dispatcher, ItemHandler};
use crate::export::report::{ExportReport, NotFound, NotFoundReason, Tally};
use crate::export::stage::{ExportStage, StageTracker};
use crate::parallel::WorkerPoolConfig;
use crate::readers::{read_shards, ReaderSet, ShardFailure};
use crate::record::{ExportItem, PendingSet, Record};
use crate::sharding::ShardIndex;

/// Configuration for an export pipeline
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Worker threads processing items. Zero processes inline in the caller.
    pub worker_threads: usize,

    /// Maximum number of items handed to the workers at once
    pub batch_size: usize,

    /// Number of not-found ids included in the summary log
    pub not_found_sample: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            worker_threads: WorkerPoolConfig::default().worker_threads,
            batch_size: DEFAULT_BATCH_SIZE,
            not_found_sample: NOT_FOUND_LOG_SAMPLE,
        }
    }
}

impl ExportConfig {
    /// Creates a configuration with custom concurrency settings
    pub fn new(worker_threads: usize, batch_size: usize) -> Self {
        Self {
            worker_threads,
            batch_size: batch_size.max(1), // Batches are never empty
            not_found_sample: NOT_FOUND_LOG_SAMPLE,
        }
    }

    /// Configuration that processes every item in the calling thread
    pub fn sequential() -> Self {
        Self::new(0, DEFAULT_BATCH_SIZE)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ExportError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Exports a set of records from a sharded archive.
///
/// Records are grouped by base key and each group's tier ladder is read in
/// one pass, lowest tier first. Matched items are captioned and saved in
/// batches, inline or on a worker pool created for the duration of one
/// [`export`](ExportPipeline::export) call. Ids left over after all groups
/// get one final sweep over the overlay shards; whatever is still missing is
/// reported as not found.
///
/// Per-item failures never abort a run. The returned report accounts for
/// every requested id exactly once.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use shard_export::{ExportConfig, ExportPipeline, FileSaver, IndexConfig, ShardIndex};
///
/// # fn main() -> shard_export::Result<()> {
/// let index = ShardIndex::build(&["/data/images"], IndexConfig::default())?;
/// let saver = Arc::new(FileSaver::new("/tmp/export")?);
/// let pipeline = ExportPipeline::<u64>::new(index, saver, ExportConfig::default());
///
/// let report = pipeline.export(vec![7, 1007, 5000])?;
/// println!("{} exported, {} not found", report.success, report.not_found.len());
/// # Ok(())
/// # }
/// ```
pub struct ExportPipeline<R: Record> {
    index: ShardIndex,
    readers: ReaderSet,
    captioner: Option<Arc<dyn Captioner<R>>>,
    saver: Arc<dyn Saver>,
    config: ExportConfig,
    cancellation: CancellationToken,
}

impl<R: Record> ExportPipeline<R> {
    /// Creates a pipeline with the default readers and no captioner
    pub fn new(index: ShardIndex, saver: Arc<dyn Saver>, config: ExportConfig) -> Self {
        Self {
            index,
            readers: ReaderSet::default(),
            captioner: None,
            saver,
            config,
            cancellation: CancellationToken::new(),
        }
    }

    /// Caption every item before saving it
    pub fn with_captioner(mut self, captioner: impl Captioner<R> + 'static) -> Self {
        let captioner: Arc<dyn Captioner<R>> = Arc::new(captioner);
        self.captioner = Some(captioner);
        self
    }

    /// Replace the shard readers
    pub fn with_readers(mut self, readers: ReaderSet) -> Self {
        self.readers = readers;
        self
    }

    /// Observe an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The shard index this pipeline reads from
    pub fn index(&self) -> &ShardIndex {
        &self.index
    }

    /// The pipeline configuration
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// A handle that cancels running and future exports of this pipeline
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    fn item_handler(&self) -> ItemHandler<R> {
        let captioner = self.captioner.clone();
        let saver = Arc::clone(&self.saver);
        Arc::new(move |item: ExportItem<R>| {
            process_item(captioner.as_deref(), saver.as_ref(), item)
        })
    }

    /// Exports `records`, returning the accounting of every distinct id.
    ///
    /// Duplicate ids are exported once; the first record for an id is kept.
    ///
    /// # Returns
    /// The run report, or an error if the configuration is invalid or the
    /// worker pool cannot be started
    pub fn export<I>(&self, records: I) -> Result<ExportReport<R>>
    where
        I: IntoIterator<Item = R>,
    {
        self.config.validate()?;

        let mut stages = StageTracker::new();
        let groups = self.index.group_by_base_key(records);
        let requested: usize = groups.values().map(PendingSet::len).sum();
        info!(
            "Exporting {} records in {} groups from {} shards",
            requested,
            groups.len(),
            self.index.shard_count()
        );

        let dispatcher = Dispatcher::new(self.config.worker_threads, self.item_handler())?;

        let mut tally = Tally::default();
        let mut shard_failures: Vec<ShardFailure> = Vec::new();
        let mut remaining = PendingSet::new();
        let mut missing_shard_ids = BTreeSet::new();
        let mut missing_shard_buckets = 0usize;
        let mut cancelled = false;

        for (base_key, mut pending) in groups {
            if cancelled || self.cancellation.is_cancelled() {
                cancelled = true;
                tally.skipped += pending.len();
                continue;
            }

            stages.enter(ExportStage::Resolving(base_key));
            let paths = self.index.ladder_paths(base_key);
            if paths.is_empty() {
                debug!(
                    "No shard for group {}, deferring {} records to the overlay",
                    base_key,
                    pending.len()
                );
                missing_shard_buckets += 1;
                missing_shard_ids.extend(pending.ids());
                remaining.absorb(pending);
                continue;
            }

            stages.enter(ExportStage::Reading(base_key));
            let outcome = read_shards(&self.readers, self.index.naming(), &paths, &mut pending);
            trace!(
                "Group {}: {} matched in {} shards, {} left",
                base_key,
                outcome.items.len(),
                outcome.scanned,
                pending.len()
            );
            shard_failures.extend(outcome.failures);
            remaining.absorb(pending);

            stages.enter(ExportStage::Dispatching(base_key));
            if !self.dispatch(&dispatcher, outcome.items, &mut tally) {
                cancelled = true;
            }
        }

        if cancelled {
            // The overlay is never consulted, so leftovers were not attempted
            tally.skipped += remaining.len();
            remaining = PendingSet::new();
        } else {
            stages.enter(ExportStage::OverlaySweep);
            let overlay = self.index.overlay_paths();
            if !overlay.is_empty() && !remaining.is_empty() {
                debug!(
                    "Sweeping {} overlay shards for {} remaining records",
                    overlay.len(),
                    remaining.len()
                );
                let outcome =
                    read_shards(&self.readers, self.index.naming(), &overlay, &mut remaining);
                shard_failures.extend(outcome.failures);
                if !self.dispatch(&dispatcher, outcome.items, &mut tally) {
                    cancelled = true;
                }
            }
        }

        dispatcher.shutdown();
        stages.enter(ExportStage::Finalized);

        if missing_shard_buckets > 0 {
            warn!("{} groups had no shard in any tier", missing_shard_buckets);
        }

        let not_found = remaining
            .into_records()
            .map(|record| {
                let reason = if missing_shard_ids.contains(&record.id()) {
                    NotFoundReason::MissingShard
                } else {
                    NotFoundReason::MissingEntry
                };
                NotFound { record, reason }
            })
            .collect();

        let report = ExportReport {
            requested,
            success: tally.success,
            failed: tally.failed,
            skipped: tally.skipped,
            not_found,
            shard_failures,
            cancelled,
        };
        report.log_summary(self.config.not_found_sample);

        Ok(report)
    }

    /// Dispatches `items` in batches. Returns false if the run was cancelled
    /// before every batch went out; undispatched items are counted as skipped.
    fn dispatch(
        &self,
        dispatcher: &Dispatcher<R>,
        items: Vec<ExportItem<R>>,
        tally: &mut Tally,
    ) -> bool {
        let mut items = items.into_iter();

        loop {
            let batch: Vec<ExportItem<R>> = items.by_ref().take(self.config.batch_size).collect();
            if batch.is_empty() {
                return true;
            }
            if self.cancellation.is_cancelled() {
                tally.skipped += batch.len() + items.len();
                return false;
            }

            trace!("Dispatching a batch of {} items", batch.len());
            dispatcher.dispatch_batch(batch, tally);
        }
    }
}

/// Captions (when a captioner is configured) and saves one item.
fn process_item<R: Record>(
    captioner: Option<&dyn Captioner<R>>,
    saver: &dyn Saver,
    item: ExportItem<R>,
) -> Result<()> {
    let caption = match captioner {
        Some(captioner) => Some(captioner.caption(&item.record, &item.content)?),
        None => None,
    };

    trace!("Saving item {} from {}", item.id, item.shard.display());
    saver.save(item.id, &item.content, &item.extension, caption.as_deref())
}

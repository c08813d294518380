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

//! Export records from a sharded image archive.
//!
//! Images live in tar shards named `data-<key>.tar` (or `.tar.zst`). A record
//! with id `n` belongs to bucket `n % 1000` and can sit in any shard of that
//! bucket's tier ladder `k, k + 1000, ..., k + 9000`, with an overlay shard and
//! an `updates/` directory consulted last. This crate locates a set of
//! records in such an archive, reading each shard at most once per bucket,
//! and hands every payload found to a caption and save stage running on a
//! bounded worker pool.
//!
//! The main entry points are [`ShardIndex`] to discover the archive and
//! [`ExportPipeline`] to run an export.

pub mod constants;
pub mod error;
pub mod export;
pub mod parallel;
pub mod readers;
pub mod record;
pub mod sharding;

#[cfg(test)]
mod test_utils;

// Re-exports for a cleaner API
pub use error::{ExportError, Result};
pub use export::{
    CancellationToken, Captioner, ExportConfig, ExportPipeline, ExportReport, FileSaver,
    NotFound, NotFoundReason, Saver, TarSaver,
};
pub use readers::{read_shards, ReaderSet, ShardEntry, ShardReader};
pub use record::{ExportItem, PendingSet, Record};
pub use sharding::{IndexConfig, ShardFile, ShardFormat, ShardIndex, ShardNaming, TierLadder};

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

//! Defaults describing the layout of the image archive.

/// Records are bucketed into shards by `id % BUCKET_MODULUS`.
pub const BUCKET_MODULUS: u64 = 1000;

/// Number of tiers in the ladder: `k, k + 1000, ..., k + 9000`.
pub const TIER_COUNT: usize = 10;

/// Reserved shard key holding late-arriving and odd-format items.
pub const OVERLAY_SHARD_KEY: u64 = 2000;

/// Subdirectory of a shard root holding supplementary shards.
pub const UPDATES_DIR: &str = "updates";

/// File name prefix of a shard, followed by the decimal key.
pub const SHARD_FILE_PREFIX: &str = "data-";

/// Extension of an uncompressed tar shard.
pub const TAR_EXTENSION: &str = ".tar";

/// Extension of a zstd-compressed tar shard.
pub const TAR_ZST_EXTENSION: &str = ".tar.zst";

/// Extension used for caption files written next to exported images.
pub const CAPTION_EXTENSION: &str = "txt";

/// Number of items dispatched to workers before waiting for completion.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Number of not-found ids included in the summary log line.
pub const NOT_FOUND_LOG_SAMPLE: usize = 20;

/// Upper bound on the buffer reserved up front for one entry body. Larger
/// bodies grow as bytes actually arrive, so a corrupt header cannot force a
/// huge allocation.
pub const MAX_ENTRY_PREALLOCATION: u64 = 16 * 1024 * 1024;

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

use std::path::Path;

use crate::error::Result;
use crate::readers::entry::ShardEntry;

/// A reader for one shard container format.
///
/// Implementations make a single pass over the shard and return the entries
/// whose id satisfies `wanted`, keeping only the first occurrence of each id.
/// Bodies of unwanted entries are never buffered. The shard file is opened
/// and closed within the call.
pub trait ShardReader: Send + Sync {
    /// Scans the shard at `path` for wanted entries.
    ///
    /// # Arguments
    /// * `path` - Shard file to scan
    /// * `wanted` - Predicate on entry ids; entries failing it are skipped
    ///
    /// # Returns
    /// The matching entries in archive order
    fn scan(&self, path: &Path, wanted: &dyn Fn(u64) -> bool) -> Result<Vec<ShardEntry>>;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "shard reader"
    }
}

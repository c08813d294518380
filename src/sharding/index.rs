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

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::constants::{OVERLAY_SHARD_KEY, UPDATES_DIR};
use crate::error::{ExportError, Result};
use crate::record::{PendingSet, Record};
use crate::sharding::discovery::{find_shard_files, find_update_files, latest_updates, ShardFile};
use crate::sharding::ladder::TierLadder;
use crate::sharding::naming::{ShardFormat, ShardNaming};

/// Configuration describing how an archive is laid out on disk.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Shard file naming convention
    pub naming: ShardNaming,

    /// Base key derivation and tier ladder
    pub ladder: TierLadder,

    /// Reserved shard key swept once after all ladders, if any
    pub overlay_key: Option<u64>,

    /// Name of the updates subdirectory under each root, if any
    pub updates_dir: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            naming: ShardNaming::default(),
            ladder: TierLadder::default(),
            overlay_key: Some(OVERLAY_SHARD_KEY),
            updates_dir: Some(UPDATES_DIR.to_string()),
        }
    }
}

impl IndexConfig {
    /// Creates a configuration without any overlay tier.
    pub fn without_overlay(naming: ShardNaming, ladder: TierLadder) -> Self {
        Self {
            naming,
            ladder,
            overlay_key: None,
            updates_dir: None,
        }
    }
}

/// Index of every shard file available to an export.
///
/// The index maps shard keys to files and records to the shard keys that may
/// hold them. It is built once per pipeline and never changes afterwards.
#[derive(Debug)]
pub struct ShardIndex {
    /// Shard files by key, in root order then path order
    shards: BTreeMap<u64, Vec<ShardFile>>,

    /// Latest copy of every update shard, newest version first
    updates: Vec<ShardFile>,

    config: IndexConfig,
}

impl ShardIndex {
    /// Scans the given roots for shard files.
    ///
    /// Every root contributes its own files; the same key may be present in
    /// several roots, in which case all copies are read as one logical shard.
    ///
    /// # Arguments
    /// * `roots` - Directories holding shard files
    /// * `config` - Layout of the archive
    ///
    /// # Returns
    /// The index, or `ExportError::NoShardsFound` if nothing was discovered
    pub fn build<P: AsRef<Path>>(roots: &[P], config: IndexConfig) -> Result<Self> {
        config.naming.validate()?;

        let mut shards = Vec::new();
        let mut updates = Vec::new();

        for root in roots {
            let root = root.as_ref();
            if !root.is_dir() {
                warn!("Shard root {} is not a directory, skipping", root.display());
                continue;
            }

            let found = find_shard_files(root, &config.naming)?;
            debug!("Found {} shards in {}", found.len(), root.display());
            shards.extend(found);

            // Versions only compete within one root's updates directory
            if let Some(updates_dir) = &config.updates_dir {
                let found = find_update_files(&root.join(updates_dir), &config.naming)?;
                updates.extend(latest_updates(found).into_iter().map(|update| update.file));
            }
        }

        let index = Self::from_shards(shards, updates, config)?;
        info!(
            "Indexed {} shards under {} keys and {} update shards",
            index.shard_count(),
            index.shards.len(),
            index.updates.len()
        );
        Ok(index)
    }

    /// Creates an index from shard files that are already known.
    ///
    /// `updates` is kept in the given order.
    pub fn from_shards(
        shards: Vec<ShardFile>,
        updates: Vec<ShardFile>,
        config: IndexConfig,
    ) -> Result<Self> {
        if shards.is_empty() && updates.is_empty() {
            return Err(ExportError::NoShardsFound(format!(
                "no files named '{}<key>' in the configured roots",
                config.naming.prefix()
            )));
        }

        let mut by_key: BTreeMap<u64, Vec<ShardFile>> = BTreeMap::new();
        for shard in shards {
            by_key.entry(shard.key).or_default().push(shard);
        }

        Ok(Self {
            shards: by_key,
            updates,
            config,
        })
    }

    /// Partitions records by base key, in ascending base key order.
    ///
    /// Records sharing an id collapse into one pending entry; the first wins.
    pub fn group_by_base_key<R, I>(&self, records: I) -> BTreeMap<u64, PendingSet<R>>
    where
        R: Record,
        I: IntoIterator<Item = R>,
    {
        let mut groups: BTreeMap<u64, PendingSet<R>> = BTreeMap::new();
        let mut duplicates = 0usize;

        for record in records {
            let base_key = self.config.ladder.base_key(record.id());
            if !groups.entry(base_key).or_default().insert(record) {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            debug!("Dropped {} duplicate record ids while grouping", duplicates);
        }
        groups
    }

    /// Paths of every ladder tier of `base_key`, lowest tier first.
    pub fn ladder_paths(&self, base_key: u64) -> Vec<PathBuf> {
        let mut paths = UniquePaths::default();
        for key in self.config.ladder.keys(base_key) {
            paths.extend(self.shards_for(key));
        }
        paths.into_inner()
    }

    /// Paths of the overlay sweep: the reserved overlay shard followed by the
    /// update shards.
    pub fn overlay_paths(&self) -> Vec<PathBuf> {
        let mut paths = UniquePaths::default();
        if let Some(key) = self.config.overlay_key {
            paths.extend(self.shards_for(key));
        }
        paths.extend(&self.updates);
        paths.into_inner()
    }

    /// Every path that may hold a record of `base_key`, in priority order.
    pub fn candidate_paths(&self, base_key: u64) -> Vec<PathBuf> {
        let mut paths = UniquePaths::default();
        for key in self.config.ladder.keys(base_key) {
            paths.extend(self.shards_for(key));
        }
        if let Some(key) = self.config.overlay_key {
            paths.extend(self.shards_for(key));
        }
        paths.extend(&self.updates);
        paths.into_inner()
    }

    /// Shard files holding `key`
    pub fn shards_for(&self, key: u64) -> &[ShardFile] {
        self.shards.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of regular shard files (updates excluded)
    pub fn shard_count(&self) -> usize {
        self.shards.values().map(Vec::len).sum()
    }

    /// Keys with at least one shard file, ascending
    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.shards.keys().copied()
    }

    /// Update shards, newest version first
    pub fn updates(&self) -> &[ShardFile] {
        &self.updates
    }

    /// Tier ladder of this archive
    pub fn ladder(&self) -> &TierLadder {
        &self.config.ladder
    }

    /// Naming convention of this archive
    pub fn naming(&self) -> &ShardNaming {
        &self.config.naming
    }

    /// Format of a shard path
    pub fn format_of(&self, path: &Path) -> Option<ShardFormat> {
        self.config.naming.format_of(path)
    }
}

/// Ordered path list that drops repeats, so no file is scanned twice in one
/// reader invocation.
#[derive(Default)]
struct UniquePaths {
    seen: HashSet<PathBuf>,
    paths: Vec<PathBuf>,
}

impl UniquePaths {
    fn extend<'a>(&mut self, shards: impl IntoIterator<Item = &'a ShardFile>) {
        for shard in shards {
            if self.seen.insert(shard.path.clone()) {
                self.paths.push(shard.path.clone());
            }
        }
    }

    fn into_inner(self) -> Vec<PathBuf> {
        self.paths
    }
}

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

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::glob;
use log::{trace, warn};

use crate::error::{ExportError, Result};
use crate::sharding::naming::{ShardFormat, ShardNaming};

/// A shard file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardFile {
    /// Key parsed from the file name
    pub key: u64,
    /// Location of the file
    pub path: PathBuf,
    /// Container format implied by the extension
    pub format: ShardFormat,
}

/// A shard file from the updates overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpdateFile {
    /// Version directory the file was found in, None for direct children
    pub version: Option<String>,
    pub file: ShardFile,
}

fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in glob(pattern)
        .map_err(|e| ExportError::InvalidConfig(format!("Invalid glob pattern: {}", e)))?
    {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => warn!("Error with glob entry: {}", e),
        }
    }

    paths.sort();
    Ok(paths)
}

/// Helper function to find the shard files directly inside a directory.
///
/// Files that match the prefix but not the full naming convention are skipped.
pub(crate) fn find_shard_files(dir: &Path, naming: &ShardNaming) -> Result<Vec<ShardFile>> {
    let mut shards = Vec::new();

    for path in glob_paths(&naming.glob_pattern(dir))? {
        if !path.is_file() {
            continue;
        }

        let parsed = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| naming.parse(name));

        match parsed {
            Some((key, format)) => shards.push(ShardFile { key, path, format }),
            None => trace!("Skipping non-shard file {}", path.display()),
        }
    }

    Ok(shards)
}

/// Helper function to find the shard files of an updates directory.
///
/// Shards may sit directly in `updates_dir` or one level deeper inside a
/// version directory such as `updates/2024-03-01/`.
pub(crate) fn find_update_files(
    updates_dir: &Path,
    naming: &ShardNaming,
) -> Result<Vec<UpdateFile>> {
    if !updates_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut updates: Vec<UpdateFile> = find_shard_files(updates_dir, naming)?
        .into_iter()
        .map(|file| UpdateFile {
            version: None,
            file,
        })
        .collect();

    let versions_pattern = format!(
        "{}/*",
        glob::Pattern::escape(&updates_dir.to_string_lossy()).trim_end_matches('/')
    );
    for version_dir in glob_paths(&versions_pattern)? {
        if !version_dir.is_dir() {
            continue;
        }

        let version = version_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        for file in find_shard_files(&version_dir, naming)? {
            updates.push(UpdateFile {
                version: version.clone(),
                file,
            });
        }
    }

    Ok(updates)
}

/// Keeps the newest copy of each update shard of one updates directory.
///
/// Copies are matched by file name, so callers must not mix files from
/// different roots. Version directories compare
/// lexicographically and unversioned files rank below every version. The
/// result is ordered newest version first, then by file name.
pub(crate) fn latest_updates(updates: Vec<UpdateFile>) -> Vec<UpdateFile> {
    let mut newest: BTreeMap<PathBuf, UpdateFile> = BTreeMap::new();

    for update in updates {
        let name = match update.file.path.file_name() {
            Some(name) => PathBuf::from(name),
            None => continue,
        };

        match newest.get(&name) {
            Some(current) if current.version >= update.version => {
                trace!(
                    "Ignoring {} superseded by version {:?}",
                    update.file.path.display(),
                    current.version
                );
            }
            _ => {
                newest.insert(name, update);
            }
        }
    }

    let mut latest: Vec<UpdateFile> = newest.into_values().collect();
    latest.sort_by(|a, b| {
        b.version
            .cmp(&a.version)
            .then_with(|| a.file.path.file_name().cmp(&b.file.path.file_name()))
    });
    latest
}

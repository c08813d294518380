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

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::trace;
use tar::Archive;

use crate::error::Result;
use crate::readers::entry::{parse_entry_name, read_entry_body, FirstMatch, ShardEntry};
use crate::readers::traits::ShardReader;

/// Position of a wanted entry body inside the archive.
#[derive(Debug)]
struct Located {
    id: u64,
    extension: String,
    offset: u64,
    size: u64,
}

/// Random-access reader for uncompressed tar shards.
///
/// The first pass walks the headers only, seeking over every entry body.
/// The second pass seeks straight to the wanted bodies and reads just those,
/// so a shard with a handful of wanted images out of thousands costs little
/// more than reading its headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedTarReader;

impl IndexedTarReader {
    /// Create a new IndexedTarReader
    pub fn new() -> Self {
        Self
    }

    fn locate<S: Read + Seek>(
        archive: &mut Archive<S>,
        filter: &mut FirstMatch<'_>,
    ) -> Result<Vec<Located>> {
        let mut located = Vec::new();

        for entry in archive.entries_with_seek()? {
            let entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let entry_path = entry.path()?;
            let Some((id, extension)) = parse_entry_name(&entry_path) else {
                trace!("Skipping entry {}", entry_path.display());
                continue;
            };

            if filter.accept(id) {
                located.push(Located {
                    id,
                    extension,
                    offset: entry.raw_file_position(),
                    size: entry.size(),
                });
            }
        }

        Ok(located)
    }
}

impl ShardReader for IndexedTarReader {
    fn scan(&self, path: &Path, wanted: &dyn Fn(u64) -> bool) -> Result<Vec<ShardEntry>> {
        let mut archive = Archive::new(BufReader::new(File::open(path)?));
        let mut filter = FirstMatch::new(wanted);
        let located = Self::locate(&mut archive, &mut filter)?;

        let mut source = archive.into_inner();
        let mut entries = Vec::with_capacity(located.len());

        for Located {
            id,
            extension,
            offset,
            size,
        } in located
        {
            source.seek(SeekFrom::Start(offset))?;
            let content = read_entry_body(&mut source, size)?;

            entries.push(ShardEntry {
                id,
                extension,
                content,
            });
        }

        trace!("Extracted {} entries from {}", entries.len(), path.display());
        Ok(entries)
    }

    fn name(&self) -> &'static str {
        "indexed tar"
    }
}

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
use std::io::{BufReader, Read};
use std::path::Path;

use log::trace;
use tar::Archive;

use crate::error::Result;
use crate::readers::entry::{parse_entry_name, read_entry_body, FirstMatch, ShardEntry};
use crate::readers::traits::ShardReader;

/// Compression wrapped around a streamed tar shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCompression {
    /// Plain tar
    None,
    /// Zstd frame(s) around the tar stream
    #[cfg(feature = "zstd")]
    Zstd,
}

/// Sequential reader that decodes a shard from front to back.
///
/// Works for any tar stream, including compressed ones that cannot seek.
/// Unwanted entry bodies are skipped as the stream advances.
#[derive(Debug, Clone, Copy)]
pub struct StreamingTarReader {
    compression: StreamCompression,
}

impl StreamingTarReader {
    /// Creates a reader for the given compression
    pub fn new(compression: StreamCompression) -> Self {
        Self { compression }
    }

    /// Creates a reader for plain tar streams
    pub fn plain() -> Self {
        Self::new(StreamCompression::None)
    }

    /// Creates a reader for zstd-compressed tar streams
    #[cfg(feature = "zstd")]
    pub fn zstd() -> Self {
        Self::new(StreamCompression::Zstd)
    }

    /// Compression this reader decodes
    pub fn compression(&self) -> StreamCompression {
        self.compression
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Read>> {
        let file = BufReader::new(File::open(path)?);

        match self.compression {
            StreamCompression::None => Ok(Box::new(file)),
            #[cfg(feature = "zstd")]
            StreamCompression::Zstd => {
                Ok(Box::new(zstd::stream::read::Decoder::with_buffer(file)?))
            }
        }
    }
}

impl Default for StreamingTarReader {
    fn default() -> Self {
        Self::plain()
    }
}

impl ShardReader for StreamingTarReader {
    fn scan(&self, path: &Path, wanted: &dyn Fn(u64) -> bool) -> Result<Vec<ShardEntry>> {
        let mut archive = Archive::new(self.open(path)?);
        let mut filter = FirstMatch::new(wanted);
        let mut entries = Vec::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let parsed = parse_entry_name(&entry.path()?);
            let Some((id, extension)) = parsed else {
                continue;
            };
            if !filter.accept(id) {
                continue;
            }

            let size = entry.size();
            let content = read_entry_body(&mut entry, size)?;
            entries.push(ShardEntry {
                id,
                extension,
                content,
            });
        }

        trace!("Streamed {} entries from {}", entries.len(), path.display());
        Ok(entries)
    }

    fn name(&self) -> &'static str {
        match self.compression {
            StreamCompression::None => "streaming tar",
            #[cfg(feature = "zstd")]
            StreamCompression::Zstd => "streaming tar.zst",
        }
    }
}

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
use std::fmt;
use std::sync::Arc;

use crate::error::{ExportError, Result};
use crate::readers::indexed::IndexedTarReader;
use crate::readers::streaming::StreamingTarReader;
use crate::readers::traits::ShardReader;
use crate::sharding::ShardFormat;

/// Selects the reader used for each shard format.
///
/// The default set reads plain tar shards with the [`IndexedTarReader`] and
/// zstd-compressed shards with the [`StreamingTarReader`]. Any mapping can be
/// replaced, which is also how tests substitute instrumented readers.
#[derive(Clone)]
pub struct ReaderSet {
    readers: BTreeMap<ShardFormat, Arc<dyn ShardReader>>,
}

impl Default for ReaderSet {
    fn default() -> Self {
        let set = Self::empty().with_reader(ShardFormat::Tar, Arc::new(IndexedTarReader::new()));

        #[cfg(feature = "zstd")]
        let set = set.with_reader(ShardFormat::TarZst, Arc::new(StreamingTarReader::zstd()));

        set
    }
}

impl ReaderSet {
    /// Creates a set without any readers
    pub fn empty() -> Self {
        Self {
            readers: BTreeMap::new(),
        }
    }

    /// Creates a set that streams every format, never seeking.
    pub fn streaming() -> Self {
        let set =
            Self::empty().with_reader(ShardFormat::Tar, Arc::new(StreamingTarReader::plain()));

        #[cfg(feature = "zstd")]
        let set = set.with_reader(ShardFormat::TarZst, Arc::new(StreamingTarReader::zstd()));

        set
    }

    /// Registers the reader for a format, replacing any previous one.
    pub fn with_reader(mut self, format: ShardFormat, reader: Arc<dyn ShardReader>) -> Self {
        self.readers.insert(format, reader);
        self
    }

    /// Reader registered for `format`
    pub fn reader_for(&self, format: ShardFormat) -> Result<&Arc<dyn ShardReader>> {
        self.readers
            .get(&format)
            .ok_or_else(|| ExportError::UnsupportedShardFormat(format.to_string()))
    }
}

impl fmt::Debug for ReaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.readers.iter().map(|(format, reader)| (format, reader.name())))
            .finish()
    }
}

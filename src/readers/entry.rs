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

use std::collections::HashSet;
use std::io::{self, Read};
use std::path::Path;

use bytes::Bytes;

use crate::constants::MAX_ENTRY_PREALLOCATION;

/// An entry pulled out of a shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardEntry {
    /// Id parsed from the entry's file name
    pub id: u64,
    /// Extension without the leading dot
    pub extension: String,
    /// Entry contents
    pub content: Bytes,
}

/// Parses the record id and extension from an entry path.
///
/// Only the final path component counts, so `images/0123/4567.png` yields
/// `(4567, "png")`. The id ends at the first dot, the way webdataset keys do;
/// everything after it is the extension. Returns None when the id part is not
/// a decimal integer.
pub fn parse_entry_name(path: &Path) -> Option<(u64, String)> {
    let name = path.file_name()?.to_str()?;
    let (stem, extension) = name.split_once('.').unwrap_or((name, ""));

    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let id = stem.parse::<u64>().ok()?;
    Some((id, extension.to_string()))
}

/// Reads an entry body of `size` bytes as declared by its header.
///
/// Fails with `UnexpectedEof` if the archive ends before `size` bytes.
pub(crate) fn read_entry_body<T: Read>(reader: T, size: u64) -> io::Result<Bytes> {
    let mut content = Vec::with_capacity(size.min(MAX_ENTRY_PREALLOCATION) as usize);
    reader.take(size).read_to_end(&mut content)?;

    if content.len() as u64 != size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("entry body truncated: {} of {} bytes", content.len(), size),
        ));
    }
    Ok(Bytes::from(content))
}

/// Accepts each wanted id once per scan.
pub(crate) struct FirstMatch<'a> {
    wanted: &'a dyn Fn(u64) -> bool,
    seen: HashSet<u64>,
}

impl<'a> FirstMatch<'a> {
    pub(crate) fn new(wanted: &'a dyn Fn(u64) -> bool) -> Self {
        Self {
            wanted,
            seen: HashSet::new(),
        }
    }

    pub(crate) fn accept(&mut self, id: u64) -> bool {
        (self.wanted)(id) && self.seen.insert(id)
    }
}

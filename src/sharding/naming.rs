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

use std::fmt;
use std::path::Path;

use crate::constants::{SHARD_FILE_PREFIX, TAR_EXTENSION, TAR_ZST_EXTENSION};
use crate::error::{ExportError, Result};

/// Container format of a shard file, implied by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShardFormat {
    /// Uncompressed tar, seekable.
    Tar,
    /// Zstd-compressed tar, only readable as a stream.
    TarZst,
}

impl fmt::Display for ShardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardFormat::Tar => write!(f, "tar"),
            ShardFormat::TarZst => write!(f, "tar.zst"),
        }
    }
}

/// Naming convention of shard files: `prefix + decimal key + extension`.
///
/// With the defaults a shard for key 7 is called `data-0007.tar`. The key is
/// parsed as a plain integer, so zero padding is optional.
#[derive(Debug, Clone)]
pub struct ShardNaming {
    /// Literal prefix before the key digits
    prefix: String,

    /// Known extensions, longest first so `.tar.zst` wins over `.tar`
    extensions: Vec<(String, ShardFormat)>,
}

impl Default for ShardNaming {
    fn default() -> Self {
        Self::new(SHARD_FILE_PREFIX)
    }
}

impl ShardNaming {
    /// Creates a naming convention with the given prefix and the default
    /// `.tar` and `.tar.zst` extensions.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extensions: Vec::new(),
        }
        .with_extension(TAR_EXTENSION, ShardFormat::Tar)
        .with_extension(TAR_ZST_EXTENSION, ShardFormat::TarZst)
    }

    /// Registers (or re-maps) an extension.
    pub fn with_extension(mut self, extension: impl Into<String>, format: ShardFormat) -> Self {
        let extension = extension.into();
        self.extensions.retain(|(known, _)| *known != extension);
        self.extensions.push((extension, format));
        self.extensions
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self
    }

    /// Literal file name prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(ExportError::InvalidConfig(
                "shard naming has no extensions".to_string(),
            ));
        }
        if self.extensions.iter().any(|(ext, _)| ext.is_empty()) {
            return Err(ExportError::InvalidConfig(
                "shard extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Glob pattern matching every candidate shard file directly inside `dir`.
    pub(crate) fn glob_pattern(&self, dir: &Path) -> String {
        let dir = glob::Pattern::escape(&dir.to_string_lossy());
        let prefix = glob::Pattern::escape(&self.prefix);
        format!("{}/{}*", dir.trim_end_matches('/'), prefix)
    }

    /// Parses a shard file name into its key and format.
    ///
    /// Returns None for names that do not follow the convention, including
    /// names whose key part is empty, non-numeric or out of range.
    pub fn parse(&self, file_name: &str) -> Option<(u64, ShardFormat)> {
        let rest = file_name.strip_prefix(self.prefix.as_str())?;
        let (digits, format) = self.extensions.iter().find_map(|(ext, format)| {
            rest.strip_suffix(ext.as_str()).map(|digits| (digits, *format))
        })?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        digits.parse::<u64>().ok().map(|key| (key, format))
    }

    /// Format of a shard path, judged by its extension alone.
    pub fn format_of(&self, path: &Path) -> Option<ShardFormat> {
        let name = path.file_name()?.to_str()?;
        self.extensions
            .iter()
            .find(|(ext, _)| name.ends_with(ext.as_str()))
            .map(|(_, format)| *format)
    }

    /// File name of the shard for `key` in `format`, zero padded to four digits.
    pub fn file_name(&self, key: u64, format: ShardFormat) -> Option<String> {
        self.extensions
            .iter()
            .find(|(_, known)| *known == format)
            .map(|(ext, _)| format!("{}{:04}{}", self.prefix, key, ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_names() {
        let naming = ShardNaming::default();

        assert_eq!(naming.parse("data-0007.tar"), Some((7, ShardFormat::Tar)));
        assert_eq!(naming.parse("data-1007.tar"), Some((1007, ShardFormat::Tar)));
        assert_eq!(naming.parse("data-7.tar"), Some((7, ShardFormat::Tar)));
        assert_eq!(
            naming.parse("data-0042.tar.zst"),
            Some((42, ShardFormat::TarZst))
        );
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        let naming = ShardNaming::default();

        assert_eq!(naming.parse("data-.tar"), None);
        assert_eq!(naming.parse("data-12a.tar"), None);
        assert_eq!(naming.parse("data-0007.tar.gz"), None);
        assert_eq!(naming.parse("other-0007.tar"), None);
        assert_eq!(naming.parse("data-0007.json"), None);
        assert_eq!(naming.parse("data-99999999999999999999999.tar"), None);
    }

    #[test]
    fn test_custom_prefix_and_extension() {
        let naming = ShardNaming::new("shard_").with_extension(".tgz", ShardFormat::TarZst);

        assert_eq!(naming.parse("shard_12.tgz"), Some((12, ShardFormat::TarZst)));
        assert_eq!(naming.parse("data-12.tar"), None);
        assert_eq!(naming.file_name(3, ShardFormat::Tar).unwrap(), "shard_0003.tar");
    }

    #[test]
    fn test_format_of_ignores_prefix() {
        let naming = ShardNaming::default();

        assert_eq!(
            naming.format_of(Path::new("/x/updates/v2/extra.tar.zst")),
            Some(ShardFormat::TarZst)
        );
        assert_eq!(naming.format_of(Path::new("a.tar")), Some(ShardFormat::Tar));
        assert_eq!(naming.format_of(Path::new("a.zip")), None);
    }

    #[test]
    fn test_glob_pattern_escapes_directory() {
        let naming = ShardNaming::default();
        let pattern = naming.glob_pattern(Path::new("/data/[set]"));
        assert_eq!(pattern, "/data/[[]set[]]/data-*");
    }
}

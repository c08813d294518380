//! Fixtures shared by the unit tests: small tar shards written to disk.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tar::{Builder, EntryType, Header};

/// Builds an in-memory tar archive from `(entry name, contents)` pairs.
///
/// Names ending in `/` become directory entries.
pub(crate) fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());

    for (name, data) in entries {
        let mut header = Header::new_gnu();
        header.set_mode(0o644);
        if name.ends_with('/') {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            builder
                .append_data(&mut header, name, io::empty())
                .unwrap();
        } else {
            header.set_entry_type(EntryType::Regular);
            header.set_size(data.len() as u64);
            builder.append_data(&mut header, name, *data).unwrap();
        }
    }

    builder.into_inner().unwrap()
}

/// Writes a plain tar shard.
pub(crate) fn write_tar_shard(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, tar_bytes(entries)).unwrap();
}

/// Writes a zstd-compressed tar shard.
#[cfg(feature = "zstd")]
pub(crate) fn write_tar_zst_shard(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let compressed = zstd::encode_all(&tar_bytes(entries)[..], 3).unwrap();
    fs::write(path, compressed).unwrap();
}

/// Creates an empty file, for tests that only care about file names.
pub(crate) fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap();
}

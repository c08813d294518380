use std::collections::HashSet;

use tempfile::tempdir;

use crate::readers::{IndexedTarReader, ShardReader};
use crate::test_utils::write_tar_shard;

#[test]
fn test_indexed_reader_returns_only_wanted_entries() {
    let temp_dir = tempdir().unwrap();
    let shard = temp_dir.path().join("data-0007.tar");
    write_tar_shard(
        &shard,
        &[
            ("7.jpg", b"seven"),
            ("1007.png", b"one thousand seven"),
            ("2007.webp", b"two thousand seven"),
        ],
    );

    let wanted: HashSet<u64> = [7, 2007, 9999].into_iter().collect();
    let entries = IndexedTarReader::new()
        .scan(&shard, &|id| wanted.contains(&id))
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, 7);
    assert_eq!(entries[0].extension, "jpg");
    assert_eq!(&entries[0].content[..], b"seven");
    assert_eq!(entries[1].id, 2007);
    assert_eq!(entries[1].extension, "webp");
    assert_eq!(&entries[1].content[..], b"two thousand seven");
}

#[test]
fn test_indexed_reader_handles_nested_paths_and_directories() {
    let temp_dir = tempdir().unwrap();
    let shard = temp_dir.path().join("data-0001.tar");
    write_tar_shard(
        &shard,
        &[
            ("images/", b""),
            ("images/0001/", b""),
            ("images/0001/1001.jpg", b"nested"),
            ("__index__.json", b"{}"),
        ],
    );

    let entries = IndexedTarReader::new().scan(&shard, &|_| true).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 1001);
    assert_eq!(&entries[0].content[..], b"nested");
}

#[test]
fn test_indexed_reader_keeps_first_duplicate() {
    let temp_dir = tempdir().unwrap();
    let shard = temp_dir.path().join("data-0003.tar");
    write_tar_shard(
        &shard,
        &[("3.jpg", b"first"), ("3.json", b"metadata"), ("a/3.png", b"third")],
    );

    let entries = IndexedTarReader::new().scan(&shard, &|id| id == 3).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].extension, "jpg");
    assert_eq!(&entries[0].content[..], b"first");
}

#[test]
fn test_indexed_reader_large_entry_body() {
    let temp_dir = tempdir().unwrap();
    let shard = temp_dir.path().join("data-0004.tar");
    let big: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    write_tar_shard(&shard, &[("4.bin", &big[..]), ("1004.bin", b"small")]);

    let entries = IndexedTarReader::new().scan(&shard, &|_| true).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(&entries[0].content[..], &big[..]);
    assert_eq!(&entries[1].content[..], b"small");
}

#[test]
fn test_indexed_reader_missing_file_is_io_error() {
    let temp_dir = tempdir().unwrap();
    let result = IndexedTarReader::new().scan(&temp_dir.path().join("data-0009.tar"), &|_| true);
    assert!(matches!(result, Err(crate::error::ExportError::Io(_))));
}

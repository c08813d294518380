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

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tar::{Builder, Header};
use tempfile::tempdir;

use shard_export::error::Result;
use shard_export::{
    ExportConfig, ExportPipeline, FileSaver, IndexConfig, NotFoundReason, Record, ShardIndex,
    TarSaver,
};

#[derive(Debug, Clone)]
struct Post {
    id: u64,
    rating: char,
    tags: Vec<&'static str>,
}

impl Record for Post {
    fn id(&self) -> u64 {
        self.id
    }
}

fn caption(post: &Post, _content: &[u8]) -> Result<String> {
    Ok(format!("rating:{}, {}", post.rating, post.tags.join(", ")))
}

fn tar_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

fn write_shard(path: &Path, entries: &[(&str, &[u8])]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, tar_archive(entries)).unwrap();
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_export_to_directory() -> Result<()> {
    init_logger();
    let archive = tempdir()?;
    let output = tempdir()?;

    write_shard(
        &archive.path().join("data-0007.tar"),
        &[("7.jpg", b"seven"), ("3007.png", b"three thousand seven")],
    );
    write_shard(&archive.path().join("data-1007.tar"), &[("1007.webp", b"one thousand seven")]);
    write_shard(&archive.path().join("data-0008.tar"), &[("8.jpg", b"eight")]);

    let index = ShardIndex::build(&[archive.path()], IndexConfig::default())?;
    let saver = Arc::new(FileSaver::new(output.path().join("images"))?);
    let pipeline = ExportPipeline::<Post>::new(index, saver, ExportConfig::new(4, 2))
        .with_captioner(caption);

    let posts = vec![
        Post { id: 1007, rating: 's', tags: vec!["1girl", "solo"] },
        Post { id: 7, rating: 'g', tags: vec!["landscape"] },
        Post { id: 3007, rating: 'q', tags: vec!["cat"] },
        Post { id: 2008, rating: 'g', tags: vec!["missing"] },
        Post { id: 5000, rating: 'g', tags: vec!["nowhere"] },
    ];
    let report = pipeline.export(posts)?;

    assert_eq!(report.requested, 5);
    assert_eq!(report.success, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.not_found_ids(), vec![2008, 5000]);
    assert_eq!(report.not_found[0].reason, NotFoundReason::MissingEntry);
    assert_eq!(report.not_found[1].reason, NotFoundReason::MissingShard);

    let images = output.path().join("images");
    assert_eq!(fs::read(images.join("7.jpg"))?, b"seven");
    assert_eq!(fs::read(images.join("1007.webp"))?, b"one thousand seven");
    assert_eq!(fs::read_to_string(images.join("1007.txt"))?, "rating:s, 1girl, solo");
    assert_eq!(fs::read_to_string(images.join("3007.txt"))?, "rating:q, cat");
    assert!(!images.join("2008.txt").exists());
    Ok(())
}

#[test]
fn test_export_to_single_tar() -> Result<()> {
    init_logger();
    let archive = tempdir()?;
    let output = tempdir()?;

    write_shard(
        &archive.path().join("data-0001.tar"),
        &[("1.jpg", b"one"), ("1001.jpg", b"thousand one")],
    );
    write_shard(&archive.path().join("data-0002.tar"), &[("2.png", b"two")]);

    let index = ShardIndex::build(&[archive.path()], IndexConfig::default())?;
    let saver = Arc::new(TarSaver::new(output.path(), "export.tar")?);
    let pipeline = ExportPipeline::<u64>::new(index, saver.clone(), ExportConfig::new(3, 1))
        .with_captioner(|id: &u64, content: &[u8]| -> Result<String> {
            Ok(format!("{} is {} bytes", id, content.len()))
        });

    let report = pipeline.export(vec![1, 2, 1001])?;
    saver.finish()?;
    assert_eq!(report.success, 3);

    let mut contents = Vec::new();
    let mut exported = tar::Archive::new(File::open(output.path().join("export.tar"))?);
    for entry in exported.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        let mut data = String::new();
        entry.read_to_string(&mut data)?;
        contents.push((name, data));
    }
    contents.sort();

    assert_eq!(
        contents,
        vec![
            ("1.jpg".to_string(), "one".to_string()),
            ("1.txt".to_string(), "1 is 3 bytes".to_string()),
            ("1001.jpg".to_string(), "thousand one".to_string()),
            ("1001.txt".to_string(), "1001 is 12 bytes".to_string()),
            ("2.png".to_string(), "two".to_string()),
            ("2.txt".to_string(), "2 is 3 bytes".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_several_roots_form_one_archive() -> Result<()> {
    init_logger();
    let old = tempdir()?;
    let new = tempdir()?;
    let output = tempdir()?;

    write_shard(&old.path().join("data-0004.tar"), &[("4.jpg", b"old four")]);
    write_shard(&new.path().join("data-0004.tar"), &[("4.jpg", b"new four"), ("1004.jpg", b"x")]);

    let index = ShardIndex::build(&[old.path(), new.path()], IndexConfig::default())?;
    assert_eq!(index.shard_count(), 2);

    let saver = Arc::new(FileSaver::new(output.path())?);
    let report = ExportPipeline::<u64>::new(index, saver, ExportConfig::sequential())
        .export(vec![4, 1004])?;

    assert_eq!(report.success, 2);
    // The first root takes precedence for the same key
    assert_eq!(fs::read(output.path().join("4.jpg"))?, b"old four");
    Ok(())
}

#[cfg(feature = "zstd")]
#[test]
fn test_compressed_and_plain_shards_mix() -> Result<()> {
    init_logger();
    let archive = tempdir()?;
    let output = tempdir()?;

    let compressed = zstd::encode_all(&tar_archive(&[("9.jpg", b"nine")])[..], 3)?;
    fs::write(archive.path().join("data-0009.tar.zst"), compressed)?;
    write_shard(&archive.path().join("data-1009.tar"), &[("1009.jpg", b"thousand nine")]);

    let index = ShardIndex::build(&[archive.path()], IndexConfig::default())?;
    let saver = Arc::new(FileSaver::new(output.path())?);
    let report = ExportPipeline::<u64>::new(index, saver, ExportConfig::new(2, 8))
        .export(vec![9, 1009])?;

    assert_eq!(report.success, 2);
    assert!(report.shard_failures.is_empty());
    assert_eq!(fs::read(output.path().join("9.jpg"))?, b"nine");
    Ok(())
}

#[test]
fn test_empty_archive_is_rejected() {
    init_logger();
    let archive = tempdir().unwrap();
    assert!(ShardIndex::build(&[archive.path()], IndexConfig::default()).is_err());
}

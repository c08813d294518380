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

//! Overlay shards and the updates directory are read once, after every
//! bucket's own tiers, for the records still missing.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::tempdir;

use shard_export::error::Result;
use shard_export::{
    ExportConfig, ExportPipeline, IndexConfig, NotFoundReason, Saver, ShardIndex, ShardNaming,
    TierLadder,
};

#[derive(Default)]
struct MemorySaver {
    items: Mutex<Vec<(u64, Vec<u8>)>>,
}

impl MemorySaver {
    fn content_of(&self, id: u64) -> Option<Vec<u8>> {
        let items = self.items.lock().unwrap();
        items.iter().find(|(i, _)| *i == id).map(|(_, c)| c.clone())
    }

    fn count_of(&self, id: u64) -> usize {
        self.items.lock().unwrap().iter().filter(|(i, _)| *i == id).count()
    }
}

impl Saver for MemorySaver {
    fn save(
        &self,
        id: u64,
        content: &[u8],
        _extension: &str,
        _caption: Option<&str>,
    ) -> Result<()> {
        self.items.lock().unwrap().push((id, content.to_vec()));
        Ok(())
    }
}

fn write_shard(path: &Path, entries: &[(&str, &[u8])]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, *data).unwrap();
    }
    fs::write(path, builder.into_inner().unwrap()).unwrap();
}

#[test]
fn test_newest_update_version_wins() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let archive = tempdir()?;
    let root = archive.path();

    write_shard(&root.join("data-0001.tar"), &[("1.jpg", b"base")]);
    write_shard(&root.join("updates").join("data-0050.tar"), &[("77.jpg", b"unversioned")]);
    write_shard(
        &root.join("updates").join("2023-10").join("data-0050.tar"),
        &[("77.jpg", b"october")],
    );
    write_shard(
        &root.join("updates").join("2024-02").join("data-0050.tar"),
        &[("77.jpg", b"february")],
    );
    write_shard(
        &root.join("updates").join("2023-10").join("data-0051.tar"),
        &[("78.jpg", b"only copy"), ("1.jpg", b"never used")],
    );

    let index = ShardIndex::build(&[root], IndexConfig::default())?;
    assert_eq!(index.updates().len(), 2);

    let saver = Arc::new(MemorySaver::default());
    let report = ExportPipeline::<u64>::new(index, saver.clone(), ExportConfig::new(2, 4))
        .export(vec![1, 77, 78, 79])?;

    assert_eq!(report.success, 3);
    assert_eq!(report.not_found_ids(), vec![79]);
    assert_eq!(report.not_found[0].reason, NotFoundReason::MissingShard);

    assert_eq!(saver.content_of(77), Some(b"february".to_vec()));
    assert_eq!(saver.content_of(78), Some(b"only copy".to_vec()));
    assert_eq!(saver.content_of(1), Some(b"base".to_vec()));
    assert_eq!(saver.count_of(1), 1);
    Ok(())
}

#[test]
fn test_update_shards_from_every_root_are_swept() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let first = tempdir()?;
    let second = tempdir()?;

    write_shard(&first.path().join("data-0009.tar"), &[("9.jpg", b"nine")]);
    write_shard(&first.path().join("updates").join("data-0001.tar"), &[("1.jpg", b"first root")]);
    write_shard(
        &second.path().join("updates").join("data-0001.tar"),
        &[("2.jpg", b"second root"), ("1.jpg", b"shadowed")],
    );

    let index = ShardIndex::build(&[first.path(), second.path()], IndexConfig::default())?;
    assert_eq!(index.updates().len(), 2);

    let saver = Arc::new(MemorySaver::default());
    let report = ExportPipeline::<u64>::new(index, saver.clone(), ExportConfig::new(2, 2))
        .export(vec![1, 2, 9])?;

    assert_eq!(report.success, 3);
    assert!(report.not_found.is_empty());
    assert_eq!(saver.content_of(1), Some(b"first root".to_vec()));
    assert_eq!(saver.content_of(2), Some(b"second root".to_vec()));
    assert_eq!(saver.count_of(1), 1);
    Ok(())
}

#[test]
fn test_overlay_shard_serves_every_bucket() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let archive = tempdir()?;
    let root = archive.path();

    write_shard(&root.join("data-0003.tar"), &[("3.jpg", b"three")]);
    write_shard(
        &root.join("data-2000.tar"),
        &[("1003.jpg", b"overlay 1003"), ("42.jpg", b"overlay 42"), ("3.jpg", b"overlay 3")],
    );

    let index = ShardIndex::build(&[root], IndexConfig::default())?;
    let saver = Arc::new(MemorySaver::default());
    let report = ExportPipeline::<u64>::new(index, saver.clone(), ExportConfig::sequential())
        .export(vec![3, 1003, 42])?;

    assert_eq!(report.success, 3);
    assert!(report.not_found.is_empty());
    // The bucket's own tier beats the overlay
    assert_eq!(saver.content_of(3), Some(b"three".to_vec()));
    assert_eq!(saver.content_of(1003), Some(b"overlay 1003".to_vec()));
    assert_eq!(saver.count_of(3), 1);
    Ok(())
}

#[test]
fn test_layout_without_overlay() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let archive = tempdir()?;
    let root = archive.path();

    write_shard(&root.join("part_5.tar"), &[("5.jpg", b"five")]);
    write_shard(&root.join("part_105.tar"), &[("205.jpg", b"two hundred five")]);
    write_shard(&root.join("updates").join("part_5.tar"), &[("305.jpg", b"ignored")]);

    let config = IndexConfig::without_overlay(ShardNaming::new("part_"), TierLadder::new(100, 2)?);
    let index = ShardIndex::build(&[root], config)?;

    let saver = Arc::new(MemorySaver::default());
    let report = ExportPipeline::<u64>::new(index, saver.clone(), ExportConfig::new(1, 1))
        .export(vec![5, 205, 305])?;

    assert_eq!(report.success, 2);
    assert_eq!(report.not_found_ids(), vec![305]);
    assert_eq!(report.not_found[0].reason, NotFoundReason::MissingEntry);
    Ok(())
}

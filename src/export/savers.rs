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

//! Savers shipped with the crate: a directory of loose files and a single
//! webdataset-style tar.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info};
use tar::{Builder, EntryType, Header};

use crate::constants::CAPTION_EXTENSION;
use crate::error::{ExportError, Result};
use crate::export::collaborators::Saver;

fn save_error(what: &str, path: &Path, e: impl std::fmt::Display) -> ExportError {
    ExportError::Save(format!("{} {}: {}", what, path.display(), e))
}

/// Writes every item as `<dir>/<id>.<ext>`, with the caption next to it as
/// `<dir>/<id>.<caption ext>`.
///
/// Different ids never touch the same file, so no locking is needed.
#[derive(Debug, Clone)]
pub struct FileSaver {
    output_dir: PathBuf,
    caption_extension: String,
}

impl FileSaver {
    /// Creates the output directory if needed.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .map_err(|e| save_error("cannot create output directory", &output_dir, e))?;

        Ok(Self {
            output_dir,
            caption_extension: CAPTION_EXTENSION.to_string(),
        })
    }

    /// Use another extension for caption files
    pub fn with_caption_extension(mut self, extension: impl Into<String>) -> Self {
        self.caption_extension = extension.into();
        self
    }

    /// Directory the files are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_file(&self, name: String, data: &[u8]) -> Result<()> {
        let path = self.output_dir.join(name);
        fs::write(&path, data).map_err(|e| save_error("cannot write", &path, e))
    }
}

impl Saver for FileSaver {
    fn save(&self, id: u64, content: &[u8], extension: &str, caption: Option<&str>) -> Result<()> {
        self.write_file(format!("{}.{}", id, extension), content)?;
        if let Some(caption) = caption {
            self.write_file(
                format!("{}.{}", id, self.caption_extension),
                caption.as_bytes(),
            )?;
        }
        Ok(())
    }
}

/// Appends every item to one tar archive, webdataset style: the payload as
/// `<id>.<ext>` immediately followed by its caption as `<id>.<caption ext>`.
///
/// Saves from concurrent workers are serialised by a mutex. The archive is
/// only complete after [`TarSaver::finish`]; a saver dropped unfinished
/// leaves the entries written so far without the end-of-archive marker.
pub struct TarSaver {
    path: PathBuf,
    caption_extension: String,
    builder: Mutex<Option<Builder<BufWriter<File>>>>,
}

impl TarSaver {
    /// Creates `output_dir/file_name`, truncating an existing file.
    pub fn new(output_dir: impl AsRef<Path>, file_name: &str) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)
            .map_err(|e| save_error("cannot create output directory", output_dir, e))?;

        let path = output_dir.join(file_name);
        let file = File::create(&path).map_err(|e| save_error("cannot create", &path, e))?;
        debug!("Writing export archive {}", path.display());

        Ok(Self {
            path,
            caption_extension: CAPTION_EXTENSION.to_string(),
            builder: Mutex::new(Some(Builder::new(BufWriter::new(file)))),
        })
    }

    /// Use another extension for caption entries
    pub fn with_caption_extension(mut self, extension: impl Into<String>) -> Self {
        self.caption_extension = extension.into();
        self
    }

    /// Path of the archive being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the end-of-archive marker and flushes the file.
    ///
    /// Saving after `finish` fails with `ExportError::Save`.
    pub fn finish(&self) -> Result<()> {
        let mut guard = self
            .builder
            .lock()
            .map_err(|_| ExportError::Save("archive lock poisoned".to_string()))?;

        let Some(builder) = guard.take() else {
            return Ok(());
        };
        let mut writer = builder
            .into_inner()
            .map_err(|e| save_error("cannot finish", &self.path, e))?;
        writer
            .flush()
            .map_err(|e| save_error("cannot flush", &self.path, e))?;

        info!("Finished export archive {}", self.path.display());
        Ok(())
    }
}

fn append_entry(
    builder: &mut Builder<BufWriter<File>>,
    name: &str,
    data: &[u8],
) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    builder.append_data(&mut header, name, data)
}

impl Saver for TarSaver {
    fn save(&self, id: u64, content: &[u8], extension: &str, caption: Option<&str>) -> Result<()> {
        let mut guard = self
            .builder
            .lock()
            .map_err(|_| ExportError::Save("archive lock poisoned".to_string()))?;
        let builder = guard.as_mut().ok_or_else(|| {
            ExportError::Save(format!("archive {} is already finished", self.path.display()))
        })?;

        append_entry(builder, &format!("{}.{}", id, extension), content)
            .map_err(|e| save_error("cannot append to", &self.path, e))?;
        if let Some(caption) = caption {
            append_entry(
                builder,
                &format!("{}.{}", id, self.caption_extension),
                caption.as_bytes(),
            )
            .map_err(|e| save_error("cannot append to", &self.path, e))?;
        }
        Ok(())
    }
}

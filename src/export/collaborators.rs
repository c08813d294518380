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

//! Per-item collaborators of the export pipeline.

use crate::error::Result;

/// Produces the caption stored next to an exported image.
///
/// Captioners see one record and its payload at a time and may be called
/// from several worker threads at once.
pub trait Captioner<R>: Send + Sync {
    /// Builds the caption for `record`.
    fn caption(&self, record: &R, content: &[u8]) -> Result<String>;
}

impl<R, F> Captioner<R> for F
where
    F: Fn(&R, &[u8]) -> Result<String> + Send + Sync,
{
    fn caption(&self, record: &R, content: &[u8]) -> Result<String> {
        self(record, content)
    }
}

/// Persists one exported item.
///
/// Savers are called concurrently for different ids and must not assume any
/// ordering between items. A saver that writes a single aggregate output is
/// expected to serialise internally.
pub trait Saver: Send + Sync {
    /// Stores the payload of `id` and, when present, its caption.
    fn save(&self, id: u64, content: &[u8], extension: &str, caption: Option<&str>) -> Result<()>;
}

impl<F> Saver for F
where
    F: Fn(u64, &[u8], &str, Option<&str>) -> Result<()> + Send + Sync,
{
    fn save(&self, id: u64, content: &[u8], extension: &str, caption: Option<&str>) -> Result<()> {
        self(id, content, extension, caption)
    }
}

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

//! Error types for shard resolution and export.

use std::io;
use thiserror::Error;

/// The main error type for export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No shard files were discovered under the configured roots.
    /// An empty archive is a caller error and aborts before any work starts.
    #[error("No shards found: {0}")]
    NoShardsFound(String),

    /// A naming, ladder or pipeline configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No reader is registered (or compiled in) for a shard format.
    #[error("Unsupported shard format: {0}")]
    UnsupportedShardFormat(String),

    /// The captioner failed for one item.
    #[error("Caption error: {0}")]
    Caption(String),

    /// The saver failed for one item.
    #[error("Save error: {0}")]
    Save(String),

    /// A collaborator panicked while processing one item.
    #[error("Panicked: {0}")]
    Panicked(String),

    /// Occurs when attempting to interact with a closed queue.
    #[error("Queue is closed: {0}")]
    QueueClosed(String),

    /// A general error occurred.
    #[error("{0}")]
    Other(String),

    /// An error occurred while scanning a specific shard.
    #[error("shard '{shard}': {source}")]
    Shard {
        shard: String,
        #[source]
        source: Box<ExportError>,
    },
}

impl ExportError {
    /// Wraps an error with the shard it originated from.
    pub fn in_shard(shard: impl Into<String>, source: ExportError) -> Self {
        ExportError::Shard {
            shard: shard.into(),
            source: Box::new(source),
        }
    }
}

/// A specialized Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

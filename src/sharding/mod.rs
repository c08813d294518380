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

//! Discovery of shard files and resolution of records to shards.
//!
//! Image payloads are spread over many tar shards named by a numeric key. A
//! record with id `n` is expected in the shard keyed `n % 1000`, but archives
//! that grew over time also park records in higher tiers (`n % 1000 + 1000`,
//! `+ 2000`, ...), in a reserved overlay shard and in an `updates` directory.
//! This module finds those files and tells the export pipeline which ones to
//! read for a given group of records.

mod discovery;
mod index;
mod ladder;
mod naming;


pub use discovery::ShardFile;
pub use index::{IndexConfig, ShardIndex};
pub use ladder::TierLadder;
pub use naming::{ShardFormat, ShardNaming};

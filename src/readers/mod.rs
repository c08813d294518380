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

//! Readers that pull wanted entries out of shard containers.
//!
//! Every container format gets one [`ShardReader`] implementation and a
//! [`ReaderSet`] picks the implementation for each shard file by format.
//! [`read_shards`] drives the readers over a list of shards on behalf of a
//! pending set, removing records as their payloads are found.

mod entry;
mod indexed;
mod reader_set;
mod resolve;
mod streaming;
mod traits;

#[cfg(test)]
mod tests;

pub use entry::{parse_entry_name, ShardEntry};
pub use indexed::IndexedTarReader;
pub use reader_set::ReaderSet;
pub use resolve::{read_shards, ReadOutcome, ShardFailure};
pub use streaming::{StreamCompression, StreamingTarReader};
pub use traits::ShardReader;

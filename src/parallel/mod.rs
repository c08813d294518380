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

//! Thread pool plumbing for the export pipeline.
//!
//! The pool is built from two small primitives: a closable [`TaskQueue`]
//! drained by worker threads and a one-shot [`Promise`] through which each
//! task's outcome travels back to the submitter.

pub mod promise;
pub mod task_queue;
pub mod worker_pool;


pub use promise::Promise;
pub use task_queue::TaskQueue;
pub use worker_pool::{run_guarded, WorkerPool, WorkerPoolConfig};

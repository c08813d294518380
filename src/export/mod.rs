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

//! The export pipeline: locate records in their shards, caption and save them.
//!
//! [`ExportPipeline`] drives a run over a [`ShardIndex`](crate::sharding::ShardIndex)
//! and produces an [`ExportReport`]. What happens to each located item is up
//! to the [`Captioner`] and [`Saver`] collaborators; [`FileSaver`] and
//! [`TarSaver`] cover the common outputs.

pub mod cancel;
pub mod collaborators;
mod dispatch;
pub mod pipeline;
pub mod report;
pub mod savers;
pub mod stage;


pub use cancel::CancellationToken;
pub use collaborators::{Captioner, Saver};
pub use pipeline::{ExportConfig, ExportPipeline};
pub use report::{ExportReport, NotFound, NotFoundReason};
pub use savers::{FileSaver, TarSaver};
pub use stage::ExportStage;

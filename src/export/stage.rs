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

use std::fmt;

use log::debug;

/// Where an export run currently is.
///
/// A run moves `Idle → Resolving → Reading → Dispatching` once per base-key
/// group, then through `OverlaySweep` to `Finalized`. A cancelled run jumps
/// straight to `Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    Resolving(u64),
    Reading(u64),
    Dispatching(u64),
    OverlaySweep,
    Finalized,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStage::Idle => write!(f, "idle"),
            ExportStage::Resolving(key) => write!(f, "resolving group {}", key),
            ExportStage::Reading(key) => write!(f, "reading group {}", key),
            ExportStage::Dispatching(key) => write!(f, "dispatching group {}", key),
            ExportStage::OverlaySweep => write!(f, "overlay sweep"),
            ExportStage::Finalized => write!(f, "finalized"),
        }
    }
}

/// Records the stage of a run and logs every transition.
#[derive(Debug)]
pub(crate) struct StageTracker {
    current: ExportStage,
    history: Vec<ExportStage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: ExportStage::Idle,
            history: vec![ExportStage::Idle],
        }
    }

    pub fn enter(&mut self, stage: ExportStage) {
        debug!("Export stage: {} -> {}", self.current, stage);
        self.current = stage;
        self.history.push(stage);
    }

    #[cfg(test)]
    pub fn current(&self) -> ExportStage {
        self.current
    }

    #[cfg(test)]
    pub fn history(&self) -> &[ExportStage] {
        &self.history
    }
}

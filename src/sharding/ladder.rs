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

use crate::constants::{BUCKET_MODULUS, TIER_COUNT};
use crate::error::{ExportError, Result};

/// Maps record ids to base keys and base keys to their candidate shard keys.
///
/// A record with id `n` lives in one of the shards keyed
/// `n % modulus + t * modulus` for `t` in `0..tiers`, most likely the first.
/// Both numbers are a property of the archive being read, so they are
/// configuration rather than constants of the algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLadder {
    modulus: u64,
    tiers: usize,
}

impl Default for TierLadder {
    fn default() -> Self {
        Self {
            modulus: BUCKET_MODULUS,
            tiers: TIER_COUNT,
        }
    }
}

impl TierLadder {
    /// Creates a ladder with the given bucket modulus and tier count.
    pub fn new(modulus: u64, tiers: usize) -> Result<Self> {
        if modulus == 0 {
            return Err(ExportError::InvalidConfig(
                "tier ladder modulus must be positive".to_string(),
            ));
        }
        if tiers == 0 {
            return Err(ExportError::InvalidConfig(
                "tier ladder needs at least one tier".to_string(),
            ));
        }
        Ok(Self { modulus, tiers })
    }

    /// Bucket modulus
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Number of tiers
    pub fn tiers(&self) -> usize {
        self.tiers
    }

    /// Base key of a record id.
    pub fn base_key(&self, id: u64) -> u64 {
        id % self.modulus
    }

    /// Candidate shard keys for a base key, most likely first.
    pub fn keys(&self, base_key: u64) -> impl Iterator<Item = u64> + '_ {
        (0..self.tiers as u64)
            .map_while(move |tier| tier.checked_mul(self.modulus)?.checked_add(base_key))
    }
}

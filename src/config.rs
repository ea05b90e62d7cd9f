// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! World sizing configuration

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, Result};

/// Upper bound for any single pre-allocation request
const MAX_PREALLOCATION: usize = 10_000_000;

/// Initial capacities of a [`World`](crate::world::World).
///
/// Only affects allocation; behaviour is identical for every valid config.
/// Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Archetype slots reserved up front
    pub archetype_capacity: usize,

    /// Location map entries reserved up front
    pub entity_capacity: usize,

    /// Rows reserved in each newly created archetype
    pub rows_per_archetype: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            archetype_capacity: 64,
            entity_capacity: 0,
            rows_per_archetype: 128,
        }
    }
}

impl WorldConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    pub fn with_rows_per_archetype(mut self, rows: usize) -> Self {
        self.rows_per_archetype = rows;
        self
    }

    /// Reject sizes that would turn a typo into a multi-gigabyte allocation
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("archetype_capacity", self.archetype_capacity),
            ("entity_capacity", self.entity_capacity),
            ("rows_per_archetype", self.rows_per_archetype),
        ];
        for (name, value) in fields {
            if value > MAX_PREALLOCATION {
                return Err(EcsError::Config(format!(
                    "{name} = {value} exceeds the limit of {MAX_PREALLOCATION}"
                )));
            }
        }
        Ok(())
    }
}

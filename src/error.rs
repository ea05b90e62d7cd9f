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

//! Error types

use std::fmt;

use crate::entity::EntityId;
use crate::index::ArchetypeId;

/// ECS error type
///
/// Every fallible operation validates its input before touching storage,
/// so an `Err` always leaves the world exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Entity handle is not (or no longer) present in the location map
    EntityNotFound(EntityId),

    /// Two values of the same component type in one call
    ConflictingComponent(&'static str),

    /// Entity does not carry the requested component
    ComponentNotFound(&'static str),

    /// Archetype id was never assigned
    ArchetypeNotFound(ArchetypeId),

    /// Row/column alignment or location bookkeeping is broken
    LayoutViolation(String),

    /// Invalid world configuration
    Config(String),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::EntityNotFound(entity) => write!(f, "Entity not found: {entity}"),
            EcsError::ConflictingComponent(name) => {
                write!(f, "Conflicting component: {name} supplied more than once")
            }
            EcsError::ComponentNotFound(name) => write!(f, "Component not found: {name}"),
            EcsError::ArchetypeNotFound(id) => write!(f, "Archetype not found: {id}"),
            EcsError::LayoutViolation(msg) => write!(f, "Layout violation: {msg}"),
            EcsError::Config(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<serde_json::Error> for EcsError {
    fn from(err: serde_json::Error) -> Self {
        EcsError::Config(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;

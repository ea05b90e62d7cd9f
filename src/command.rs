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

//! Command buffer for deferred structural changes
//!
//! Query results borrow the world, so systems record their spawns and
//! removals here and apply them once the borrow has ended.

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::component::{Component, ComponentList};
use crate::entity::EntityId;
use crate::error::Result;
use crate::world::World;

/// Type alias for world mutation closures
pub type CommandClosure = Box<dyn FnOnce(&mut World) -> Result<()> + Send>;

/// Deferred command for world mutations
pub enum Command {
    /// Spawn an entity with the listed components
    Spawn(ComponentList),

    /// Replace an entity's component set
    SetComponents(EntityId, ComponentList),

    /// Remove entity
    Remove(EntityId),

    /// Custom world mutation
    Custom(CommandClosure),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Spawn(components) => f.debug_tuple("Spawn").field(components).finish(),
            Command::SetComponents(e, components) => f
                .debug_tuple("SetComponents")
                .field(e)
                .field(components)
                .finish(),
            Command::Remove(e) => f.debug_tuple("Remove").field(e).finish(),
            Command::Custom(_) => write!(f, "Custom(...)"),
        }
    }
}

/// Command buffer for deferred operations
#[derive(Default, Debug)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Create new command buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Queue a spawn; the id is returned by [`apply`](Self::apply)
    pub fn spawn_with(&mut self, components: ComponentList) {
        self.commands.push(Command::Spawn(components));
    }

    pub fn set_components(&mut self, entity: EntityId, components: ComponentList) {
        self.commands
            .push(Command::SetComponents(entity, components));
    }

    /// Queue remove command
    pub fn remove(&mut self, entity: EntityId) {
        self.commands.push(Command::Remove(entity));
    }

    /// Queue a custom world mutation
    pub fn add<F>(&mut self, f: F)
    where
        F: FnOnce(&mut World) -> Result<()> + Send + 'static,
    {
        self.commands.push(Command::Custom(Box::new(f)));
    }

    /// Queue add component command
    pub fn add_component<T: Component>(&mut self, entity: EntityId, component: T) {
        self.add(move |world| world.add_component(entity, component));
    }

    /// Queue remove component command; the removed value is dropped
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) {
        self.add(move |world| world.remove_component::<T>(entity).map(|_| ()));
    }

    /// Apply all commands in queue order and clear the buffer.
    ///
    /// Stops at the first error; commands after it are discarded. Returns
    /// the ids of spawned entities in spawn order.
    pub fn apply(&mut self, world: &mut World) -> Result<Vec<EntityId>> {
        #[cfg(feature = "profiling")]
        let span = info_span!("command_buffer.apply", queued = self.commands.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let mut spawned = Vec::new();
        for command in self.commands.drain(..) {
            match command {
                Command::Spawn(components) => {
                    spawned.push(world.spawn_with(components)?);
                }
                Command::SetComponents(entity, components) => {
                    world.set_components(entity, components)?;
                }
                Command::Remove(entity) => {
                    world.remove(entity)?;
                }
                Command::Custom(f) => {
                    f(world)?;
                }
            }
        }
        Ok(spawned)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Clear buffer
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

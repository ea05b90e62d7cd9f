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

//! World: central entity and archetype storage

use ahash::AHashMap;
use std::any::type_name;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::archetype::{Archetype, ArchetypeSignature};
use crate::component::{Bundle, Component, ComponentId, ComponentRegistry};
use crate::config::WorldConfig;
use crate::entity::{EntityAllocator, EntityId, EntityLocation};
use crate::error::{EcsError, Result};
use crate::index::{ArchetypeId, ArchetypeIndex, EMPTY_ARCHETYPE};
use crate::query::{QueryResult, QueryResultMut, QuerySet};

/// Central ECS world
///
/// Owns every entity, archetype and component value. Entities start in the
/// empty archetype and move between archetypes as their component set changes.
pub struct World {
    config: WorldConfig,

    allocator: EntityAllocator,

    /// Single source of truth for where each live entity's row is
    entity_locations: AHashMap<EntityId, EntityLocation>,

    registry: ComponentRegistry,

    index: ArchetypeIndex,
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self::sized(WorldConfig::default())
    }

    /// Create a world pre-sized by `config`.
    ///
    /// Fails with [`EcsError::Config`] if any size exceeds the
    /// pre-allocation limit, before anything is allocated.
    pub fn with_config(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::sized(config))
    }

    fn sized(config: WorldConfig) -> Self {
        Self {
            config,
            allocator: EntityAllocator::new(),
            entity_locations: AHashMap::with_capacity(config.entity_capacity),
            registry: ComponentRegistry::new(),
            index: ArchetypeIndex::new(config.archetype_capacity, config.rows_per_archetype),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Spawn a new entity with no components.
    ///
    /// # Panics
    /// Panics if the entity id space overflows (which is practically impossible).
    pub fn spawn(&mut self) -> EntityId {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.spawn", entity_count = self.entity_locations.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let entity = self.allocator.allocate();
        let row = self.index.empty_mut().push_entity(entity);
        self.entity_locations.insert(
            entity,
            EntityLocation {
                archetype_id: EMPTY_ARCHETYPE,
                archetype_row: row,
            },
        );
        entity
    }

    /// Spawn directly into the archetype of `components`.
    ///
    /// Same result as `spawn` followed by `set_components`, without the
    /// intermediate row in the empty archetype. No id is consumed on error.
    pub fn spawn_with<B: Bundle>(&mut self, components: B) -> Result<EntityId> {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.spawn_with", entity_count = self.entity_locations.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let signature = components.component_ids(&mut self.registry)?;
        let target = self.index.get_or_create(&signature, &self.registry)?;

        let entity = self.allocator.allocate();
        let row = self.push_bundle(target, entity, components)?;
        self.entity_locations.insert(
            entity,
            EntityLocation {
                archetype_id: target,
                archetype_row: row,
            },
        );
        Ok(entity)
    }

    /// Replace the entity's whole component set.
    ///
    /// The entity's row is vacated (swap-compacted) before the new values
    /// are appended to the target archetype, so it never exists in two
    /// archetypes. An empty bundle moves it to the empty archetype.
    pub fn set_components<B: Bundle>(&mut self, entity: EntityId, components: B) -> Result<()> {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.set_components", entity = entity.to_raw());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        // Validate everything before touching any rows
        let location = self.checked_location(entity)?;
        let signature = components.component_ids(&mut self.registry)?;
        let target = self.index.get_or_create(&signature, &self.registry)?;

        self.vacate_row(location);
        let row = self.push_bundle(target, entity, components)?;
        self.entity_locations.insert(
            entity,
            EntityLocation {
                archetype_id: target,
                archetype_row: row,
            },
        );
        Ok(())
    }

    /// Delete an entity and all its components.
    ///
    /// The handle is invalid afterwards; removing it again fails with
    /// [`EcsError::EntityNotFound`].
    pub fn remove(&mut self, entity: EntityId) -> Result<()> {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.remove", entity = entity.to_raw());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let location = self.checked_location(entity)?;
        self.vacate_row(location);
        self.entity_locations.remove(&entity);
        Ok(())
    }

    /// Add one component, keeping the others.
    ///
    /// Overwrites in place if the entity already has a `T`.
    pub fn add_component<T: Component>(&mut self, entity: EntityId, component: T) -> Result<()> {
        let location = self.checked_location(entity)?;
        let id = self.registry.register::<T>();

        let archetype = self.archetype_at(location.archetype_id)?;
        if archetype.contains(id) {
            if let Some(slot) = self.get_component_mut::<T>(entity) {
                *slot = component;
            }
            return Ok(());
        }

        let mut signature = archetype.signature().clone();
        signature.push(id);
        signature.sort_unstable();
        let target = self.index.get_or_create(&signature, &self.registry)?;

        self.migrate(entity, location, target, Some(component))?;
        Ok(())
    }

    /// Take one component off an entity and return it.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<T> {
        let location = self.checked_location(entity)?;
        let missing = || EcsError::ComponentNotFound(type_name::<T>());
        let id = self.registry.id_of::<T>().ok_or_else(missing)?;

        let archetype = self.archetype_at(location.archetype_id)?;
        if !archetype.contains(id) {
            return Err(missing());
        }
        let mut signature: ArchetypeSignature = archetype.signature().clone();
        signature.retain(|component| *component != id);
        let target = self.index.get_or_create(&signature, &self.registry)?;

        self.migrate::<T>(entity, location, target, None)?
            .ok_or_else(|| {
                EcsError::LayoutViolation(format!(
                    "{entity} lost its {} value during migration",
                    type_name::<T>()
                ))
            })
    }

    /// Get immutable reference to a component on an entity
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        let location = self.entity_locations.get(&entity)?;
        self.index
            .get(location.archetype_id)?
            .get::<T>(location.archetype_row)
    }

    /// Get mutable reference to a component on an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        let location = *self.entity_locations.get(&entity)?;
        self.index
            .get_mut(location.archetype_id)?
            .get_mut::<T>(location.archetype_row)
    }

    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        let Some(id) = self.registry.id_of::<T>() else {
            return false;
        };
        self.entity_locations
            .get(&entity)
            .and_then(|location| self.index.get(location.archetype_id))
            .is_some_and(|archetype| archetype.contains(id))
    }

    /// Get entity location
    pub fn location(&self, entity: EntityId) -> Option<EntityLocation> {
        self.entity_locations.get(&entity).copied()
    }

    /// Check whether the handle names a live entity
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entity_locations.contains_key(&entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entity_locations.len()
    }

    /// Number of archetypes, including the empty one
    pub fn archetype_count(&self) -> usize {
        self.index.len()
    }

    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.index.get(id)
    }

    pub fn archetypes(&self) -> &[Archetype] {
        self.index.archetypes()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Id of `T`, if the world has seen it
    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.registry.id_of::<T>()
    }

    /// Id of `T`, registering it on first sight
    pub fn register_component<T: Component>(&mut self) -> ComponentId {
        self.registry.register::<T>()
    }

    /// Archetype id for a set of component ids, in any order.
    ///
    /// Creates the archetype on first sight. Repeated ids are rejected.
    pub fn determine_archetype(&mut self, components: &[ComponentId]) -> Result<ArchetypeId> {
        let signature = self
            .registry
            .canonicalize(components.iter().copied().collect())?;
        self.index.get_or_create(&signature, &self.registry)
    }

    /// Component ids of an archetype, sorted
    pub fn determine_types(&self, archetype: ArchetypeId) -> Option<&[ComponentId]> {
        self.index.signature_of(archetype).map(|signature| signature.as_slice())
    }

    /// Archetypes whose signature is a superset of `components`
    pub fn matching_archetypes(&self, components: &[ComponentId]) -> Vec<ArchetypeId> {
        let mut required: ArchetypeSignature = components.iter().copied().collect();
        required.sort_unstable();
        required.dedup();
        self.index.matching(&required)
    }

    /// Query every entity that has all components of `Q`.
    ///
    /// `()` and unseen component types yield an empty result.
    pub fn query<Q: QuerySet>(&self) -> QueryResult<'_, Q> {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.query", archetypes = self.index.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let Some(required) = self.required_components::<Q>() else {
            return QueryResult::empty();
        };
        let matches = self.index.matching(&required);
        QueryResult::new(matches.iter().filter_map(|&id| self.index.get(id)))
    }

    /// Mutable query; the same component type may not appear twice.
    pub fn query_mut<Q: QuerySet>(&mut self) -> Result<QueryResultMut<'_, Q>> {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.query_mut", archetypes = self.index.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let components = Q::components();
        for (at, (type_id, name)) in components.iter().enumerate() {
            if components[..at].iter().any(|(seen, _)| seen == type_id) {
                return Err(EcsError::ConflictingComponent(*name));
            }
        }

        let Some(required) = self.required_components::<Q>() else {
            return Ok(QueryResultMut::empty());
        };
        let matches = self.index.matching(&required);
        Ok(QueryResultMut::new(self.index.many_mut(&matches)))
    }

    /// Sorted ids of `Q`'s components; `None` if empty or any is unregistered
    fn required_components<Q: QuerySet>(&self) -> Option<ArchetypeSignature> {
        let mut required = ArchetypeSignature::new();
        for (type_id, _) in Q::components() {
            required.push(self.registry.id_of_type(type_id)?);
        }
        required.sort_unstable();
        required.dedup();
        (!required.is_empty()).then_some(required)
    }

    fn archetype_at(&self, id: ArchetypeId) -> Result<&Archetype> {
        self.index.get(id).ok_or(EcsError::ArchetypeNotFound(id))
    }

    /// Location of a live entity, cross-checked against its archetype row
    fn checked_location(&self, entity: EntityId) -> Result<EntityLocation> {
        let location = self.location(entity).ok_or(EcsError::EntityNotFound(entity))?;
        let archetype = self.archetype_at(location.archetype_id)?;
        match archetype.entities().get(location.archetype_row) {
            Some(&at_row) if at_row == entity => Ok(location),
            _ => Err(EcsError::LayoutViolation(format!(
                "{entity} is not at row {} of archetype {}",
                location.archetype_row, location.archetype_id
            ))),
        }
    }

    /// Swap-compact the entity's row out of its archetype and repoint the
    /// entity that was moved into the hole. The caller owns the location entry
    /// of the vacating entity.
    fn vacate_row(&mut self, location: EntityLocation) {
        let Some(archetype) = self.index.get_mut(location.archetype_id) else {
            return;
        };
        if let Some(swapped) = archetype.swap_remove_row(location.archetype_row) {
            self.set_location(swapped, location);
        }
    }

    fn push_bundle<B: Bundle>(
        &mut self,
        target: ArchetypeId,
        entity: EntityId,
        components: B,
    ) -> Result<usize> {
        let archetype = self
            .index
            .get_mut(target)
            .ok_or(EcsError::ArchetypeNotFound(target))?;
        components.write_into(archetype);
        Ok(archetype.push_entity(entity))
    }

    /// Move a row between archetypes, inserting or extracting one `T`
    fn migrate<T: Component>(
        &mut self,
        entity: EntityId,
        location: EntityLocation,
        target: ArchetypeId,
        insert: Option<T>,
    ) -> Result<Option<T>> {
        let (source, destination) = self
            .index
            .pair_mut(location.archetype_id, target)
            .ok_or(EcsError::ArchetypeNotFound(target))?;
        let migration = source
            .migrate_row(location.archetype_row, destination, insert)
            .ok_or_else(|| {
                EcsError::LayoutViolation(format!("{entity} has no row to migrate"))
            })?;

        if let Some(swapped) = migration.swapped {
            self.set_location(swapped, location);
        }
        self.set_location(
            entity,
            EntityLocation {
                archetype_id: target,
                archetype_row: migration.new_row,
            },
        );
        Ok(migration.extracted)
    }

    fn set_location(&mut self, entity: EntityId, location: EntityLocation) {
        if let Some(slot) = self.entity_locations.get_mut(&entity) {
            *slot = location;
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entity_locations.len())
            .field("archetypes", &self.index.len())
            .field("components", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position(f32, f32);

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity(f32, f32);

    #[test]
    fn test_spawn_remove() -> Result<()> {
        let mut world = World::new();

        let entity = world.spawn();
        assert_eq!(
            world.location(entity),
            Some(EntityLocation {
                archetype_id: 0,
                archetype_row: 0
            })
        );

        world.remove(entity)?;
        assert!(world.location(entity).is_none());
        assert_eq!(world.remove(entity), Err(EcsError::EntityNotFound(entity)));
        Ok(())
    }

    #[test]
    fn test_archetype_segregation() -> Result<()> {
        let mut world = World::new();

        struct A;
        struct B;
        struct C;

        world.spawn_with((A, B))?;
        world.spawn_with((A, C))?;
        world.spawn_with((B, C))?;

        // Three archetypes plus the empty one
        assert_eq!(world.archetype_count(), 4);
        Ok(())
    }

    #[test]
    fn test_set_components_relocates() -> Result<()> {
        let mut world = World::new();
        let entity = world.spawn();
        world.set_components(entity, (Position(1.0, 2.0), Velocity(0.5, 0.5)))?;

        let location = world.location(entity).unwrap();
        assert_ne!(location.archetype_id, 0);
        assert_eq!(world.get_component::<Position>(entity), Some(&Position(1.0, 2.0)));
        assert!(world.archetype(0).unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_duplicate_types_leave_world_unchanged() -> Result<()> {
        let mut world = World::new();
        let entity = world.spawn_with((Position(0.0, 0.0),))?;
        let before = world.location(entity);

        let err = world
            .set_components(entity, (Velocity(1.0, 1.0), Velocity(2.0, 2.0)))
            .unwrap_err();
        assert!(matches!(err, EcsError::ConflictingComponent(_)));
        assert_eq!(world.location(entity), before);
        assert_eq!(world.get_component::<Position>(entity), Some(&Position(0.0, 0.0)));
        Ok(())
    }

    #[test]
    fn test_add_then_remove_component() -> Result<()> {
        let mut world = World::new();
        let entity = world.spawn_with((Position(1.0, 1.0),))?;

        world.add_component(entity, Velocity(2.0, 2.0))?;
        assert!(world.has_component::<Velocity>(entity));
        world.add_component(entity, Velocity(3.0, 3.0))?;
        assert_eq!(world.get_component::<Velocity>(entity), Some(&Velocity(3.0, 3.0)));

        let removed = world.remove_component::<Velocity>(entity)?;
        assert_eq!(removed, Velocity(3.0, 3.0));
        assert!(!world.has_component::<Velocity>(entity));
        assert_eq!(world.get_component::<Position>(entity), Some(&Position(1.0, 1.0)));
        assert!(matches!(
            world.remove_component::<Velocity>(entity),
            Err(EcsError::ComponentNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_query_mut_rejects_repeated_type() {
        let mut world = World::new();
        assert!(matches!(
            world.query_mut::<(Position, Position)>(),
            Err(EcsError::ConflictingComponent(_))
        ));
    }

    #[test]
    fn test_with_config_rejects_oversized_capacity() {
        let config = WorldConfig {
            rows_per_archetype: usize::MAX,
            ..WorldConfig::default()
        };
        assert!(matches!(World::with_config(config), Err(EcsError::Config(_))));

        let config = WorldConfig::default().with_entity_capacity(usize::MAX);
        assert!(matches!(World::with_config(config), Err(EcsError::Config(_))));
    }

    #[test]
    fn test_with_config_presizes() -> Result<()> {
        let config = WorldConfig::default().with_rows_per_archetype(16);
        let mut world = World::with_config(config)?;
        assert_eq!(world.config(), &config);

        let entity = world.spawn_with((Position(1.0, 2.0),))?;
        assert_eq!(world.get_component::<Position>(entity), Some(&Position(1.0, 2.0)));
        Ok(())
    }
}

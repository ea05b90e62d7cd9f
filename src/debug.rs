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

//! Debugging and layout validation

use crate::entity::{EntityId, EntityLocation};
use crate::error::{EcsError, Result};
use crate::index::ArchetypeId;
use crate::world::World;

/// World inspector for debugging
pub struct WorldInspector;

impl WorldInspector {
    /// Get archetype summary
    pub fn archetype_summary(world: &World) -> Vec<ArchetypeInfo> {
        world
            .archetypes()
            .iter()
            .map(|archetype| ArchetypeInfo {
                id: archetype.id(),
                components: archetype
                    .columns()
                    .iter()
                    .map(|column| column.info().name())
                    .collect(),
                entity_count: archetype.len(),
            })
            .collect()
    }

    /// Print world summary to console
    pub fn print_summary(world: &World) {
        println!("=== World Summary ===");
        println!("Entities: {}", world.entity_count());
        println!("Archetypes: {}", world.archetype_count());

        println!("\n=== Archetypes ===");
        for info in Self::archetype_summary(world) {
            println!(
                "Archetype {}: {} entities, [{}]",
                info.id,
                info.entity_count,
                info.components.join(", ")
            );
        }
    }

    /// Print entity details
    pub fn print_entity(world: &World, entity: EntityId) {
        let Some(location) = world.location(entity) else {
            println!("{entity} not found");
            return;
        };
        println!("=== {entity} ===");
        println!("Archetype: {}", location.archetype_id);
        println!("Row: {}", location.archetype_row);
        if let Some(archetype) = world.archetype(location.archetype_id) {
            for column in archetype.columns() {
                println!("  {}", column.info().name());
            }
        }
    }
}

/// Archetype information for debugging
#[derive(Clone, Debug)]
pub struct ArchetypeInfo {
    pub id: ArchetypeId,
    /// Type names, in signature order
    pub components: Vec<&'static str>,
    pub entity_count: usize,
}

/// Check the storage invariants:
///
/// * every archetype's columns have the same length as its entity list
/// * every row's entity has a location entry pointing back at that row
/// * every live entity occupies exactly one row
pub fn validate_layout(world: &World) -> Result<()> {
    let mut rows = 0;
    for archetype in world.archetypes() {
        for column in archetype.columns() {
            if column.len() != archetype.len() {
                return Err(EcsError::LayoutViolation(format!(
                    "archetype {}: column {} has {} rows, entity list has {}",
                    archetype.id(),
                    column.info().name(),
                    column.len(),
                    archetype.len()
                )));
            }
        }
        for (row, &entity) in archetype.entities().iter().enumerate() {
            let expected = EntityLocation {
                archetype_id: archetype.id(),
                archetype_row: row,
            };
            if world.location(entity) != Some(expected) {
                return Err(EcsError::LayoutViolation(format!(
                    "{entity} at archetype {} row {row} has location {:?}",
                    archetype.id(),
                    world.location(entity)
                )));
            }
        }
        rows += archetype.len();
    }

    if rows != world.entity_count() {
        return Err(EcsError::LayoutViolation(format!(
            "{rows} rows for {} live entities",
            world.entity_count()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(dead_code)]
    use super::*;

    struct Position(f32, f32);
    struct Velocity(f32, f32);

    #[test]
    fn test_archetype_summary_names_components() -> Result<()> {
        let mut world = World::new();
        world.spawn_with((Position(0.0, 0.0), Velocity(1.0, 1.0)))?;
        world.spawn();

        let summary = WorldInspector::archetype_summary(&world);
        assert_eq!(summary.len(), 2);
        assert!(summary[0].components.is_empty());
        assert_eq!(summary[0].entity_count, 1);
        assert_eq!(summary[1].components.len(), 2);
        assert!(summary[1].components[0].ends_with("Position"));
        Ok(())
    }

    #[test]
    fn test_validate_layout_after_churn() -> Result<()> {
        let mut world = World::new();
        let entities: Vec<_> = (0..10).map(|_| world.spawn()).collect();
        for (i, &entity) in entities.iter().enumerate() {
            if i % 2 == 0 {
                world.set_components(entity, (Position(i as f32, 0.0),))?;
            }
        }
        world.remove(entities[0])?;
        world.remove(entities[5])?;
        validate_layout(&world)
    }
}

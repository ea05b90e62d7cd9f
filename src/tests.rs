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

//! Crate-level tests for the archetype store

#[cfg(test)]
mod tests {
    #![allow(dead_code)]
    #![allow(clippy::module_inception)]
    use crate::{validate_layout, ComponentList, EntityLocation, World, EMPTY_ARCHETYPE};
    use crate::{EcsError, Result};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Health(i32);

    fn pos(x: f32, y: f32) -> Position {
        Position { x, y }
    }

    fn vel(x: f32, y: f32) -> Velocity {
        Velocity { x, y }
    }

    #[test]
    fn test_spawn_places_entity_in_empty_archetype() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();

        assert!(a < b);
        assert_eq!(
            world.location(b),
            Some(EntityLocation {
                archetype_id: EMPTY_ARCHETYPE,
                archetype_row: 1
            })
        );
        assert_eq!(world.archetype(EMPTY_ARCHETYPE).unwrap().len(), 2);
    }

    #[test]
    fn test_query_returns_only_full_matches() -> Result<()> {
        let mut world = World::new();
        let e0 = world.spawn();
        let e1 = world.spawn();
        let e2 = world.spawn();
        world.set_components(e0, (pos(0.0, 0.0), vel(1.0, 1.0)))?;
        world.set_components(e1, (pos(2.0, 2.0),))?;
        world.set_components(e2, (vel(3.0, 3.0),))?;

        let result = world.query::<(Position, Velocity)>();
        assert_eq!(result.entities().collect::<Vec<_>>(), vec![e0]);
        assert_eq!(
            result.column::<Position>().unwrap().collect::<Vec<_>>(),
            vec![&pos(0.0, 0.0)]
        );
        assert_eq!(
            result.column::<Velocity>().unwrap().collect::<Vec<_>>(),
            vec![&vel(1.0, 1.0)]
        );
        Ok(())
    }

    #[test]
    fn test_removing_middle_row_keeps_neighbours() -> Result<()> {
        let mut world = World::new();
        let entities: Vec<_> = (0..3)
            .map(|i| world.spawn_with((pos(i as f32, 0.0),)))
            .collect::<Result<_>>()?;

        world.remove(entities[1])?;

        let archetype_id = world.location(entities[0]).unwrap().archetype_id;
        assert_eq!(world.archetype(archetype_id).unwrap().len(), 2);
        assert_eq!(world.get_component::<Position>(entities[0]), Some(&pos(0.0, 0.0)));
        assert_eq!(world.get_component::<Position>(entities[2]), Some(&pos(2.0, 0.0)));
        // The former last row moved into the hole
        assert_eq!(world.location(entities[2]).unwrap().archetype_row, 1);

        let found: Vec<_> = world.query::<(Position,)>().entities().collect();
        assert_eq!(found, vec![entities[0], entities[2]]);
        Ok(())
    }

    #[test]
    fn test_double_remove_is_not_found() -> Result<()> {
        let mut world = World::new();
        let entity = world.spawn();
        world.remove(entity)?;

        assert_eq!(world.remove(entity), Err(EcsError::EntityNotFound(entity)));
        assert_eq!(
            world.set_components(entity, (Health(1),)),
            Err(EcsError::EntityNotFound(entity))
        );
        Ok(())
    }

    #[test]
    fn test_set_empty_returns_to_empty_archetype() -> Result<()> {
        let mut world = World::new();
        let entity = world.spawn();
        world.set_components(entity, (pos(1.0, 1.0), vel(1.0, 1.0)))?;
        let full = world.location(entity).unwrap().archetype_id;

        world.set_components(entity, ())?;

        assert_eq!(world.location(entity).unwrap().archetype_id, EMPTY_ARCHETYPE);
        assert!(world.archetype(full).unwrap().is_empty());
        assert!(world.get_component::<Position>(entity).is_none());

        // An empty dynamic list behaves the same
        world.set_components(entity, (Health(3),))?;
        world.set_components(entity, ComponentList::new())?;
        assert_eq!(world.location(entity).unwrap().archetype_id, EMPTY_ARCHETYPE);
        validate_layout(&world)
    }

    #[test]
    fn test_permuted_sets_share_archetype() -> Result<()> {
        let mut world = World::new();
        let a = world.spawn_with((pos(0.0, 0.0), vel(0.0, 0.0), Health(1)))?;
        let b = world.spawn_with((Health(2), pos(0.0, 0.0), vel(0.0, 0.0)))?;
        let c = world.spawn_with(
            ComponentList::new()
                .with(vel(0.0, 0.0))
                .with(Health(3))
                .with(pos(0.0, 0.0)),
        )?;

        let archetype = world.location(a).unwrap().archetype_id;
        assert_eq!(world.location(b).unwrap().archetype_id, archetype);
        assert_eq!(world.location(c).unwrap().archetype_id, archetype);

        let ids = [
            world.component_id::<Velocity>().unwrap(),
            world.component_id::<Health>().unwrap(),
            world.component_id::<Position>().unwrap(),
        ];
        assert_eq!(world.determine_archetype(&ids)?, archetype);
        assert_eq!(world.determine_types(archetype).unwrap().len(), 3);
        Ok(())
    }

    #[test]
    fn test_determine_archetype_empty_set_is_zero() -> Result<()> {
        let mut world = World::new();
        assert_eq!(world.determine_archetype(&[])?, EMPTY_ARCHETYPE);
        assert_eq!(world.determine_types(EMPTY_ARCHETYPE), Some(&[][..]));
        assert!(world.determine_types(42).is_none());
        Ok(())
    }

    #[test]
    fn test_empty_query_is_empty() -> Result<()> {
        let mut world = World::new();
        world.spawn_with((pos(0.0, 0.0),))?;
        world.spawn();

        assert!(world.query::<()>().is_empty());
        assert!(world.query_mut::<()>()?.is_empty());
        // Never-seen type
        assert!(world.query::<(Health,)>().is_empty());
        assert!(world.matching_archetypes(&[]).is_empty());
        Ok(())
    }

    #[test]
    fn test_query_spans_archetypes_in_order() -> Result<()> {
        let mut world = World::new();
        let a = world.spawn_with((pos(1.0, 0.0),))?;
        let b = world.spawn_with((pos(2.0, 0.0), Health(5)))?;
        let c = world.spawn_with((pos(3.0, 0.0),))?;

        let result = world.query::<(Position,)>();
        assert_eq!(result.len(), 3);
        assert_eq!(result.batches().len(), 2);
        assert_eq!(result.entities().collect::<Vec<_>>(), vec![a, c, b]);

        let (entity, (position,)) = result.get(2).unwrap();
        assert_eq!(entity, b);
        assert_eq!(position.x, 2.0);
        assert!(result.get(3).is_none());
        assert!(result.column::<Health>().is_none());

        let xs: Vec<f32> = result.iter().map(|(_, (p,))| p.x).collect();
        assert_eq!(xs, vec![1.0, 3.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_query_mut_updates_in_place() -> Result<()> {
        let mut world = World::new();
        let moving = world.spawn_with((pos(0.0, 0.0), vel(1.0, 2.0)))?;
        let still = world.spawn_with((pos(5.0, 5.0),))?;

        for _ in 0..3 {
            for (_, (position, velocity)) in world.query_mut::<(Position, Velocity)>()? {
                position.x += velocity.x;
                position.y += velocity.y;
            }
        }

        assert_eq!(world.get_component::<Position>(moving), Some(&pos(3.0, 6.0)));
        assert_eq!(world.get_component::<Position>(still), Some(&pos(5.0, 5.0)));
        Ok(())
    }

    #[test]
    fn test_query_mut_iter_mut_then_for_each() -> Result<()> {
        let mut world = World::new();
        for i in 0..4 {
            world.spawn_with((Health(i),))?;
        }

        let mut result = world.query_mut::<(Health,)>()?;
        for (_, (health,)) in result.iter_mut() {
            health.0 *= 10;
        }
        result.for_each_mut(|_, (health,)| health.0 += 1);

        let values: Vec<i32> = world.query::<(Health,)>().iter().map(|(_, (h,))| h.0).collect();
        assert_eq!(values, vec![1, 11, 21, 31]);
        Ok(())
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_par_for_each_mut_touches_every_row() -> Result<()> {
        let mut world = World::new();
        for i in 0..1000 {
            if i % 3 == 0 {
                world.spawn_with((Health(i), vel(0.0, 0.0)))?;
            } else {
                world.spawn_with((Health(i),))?;
            }
        }

        world
            .query_mut::<(Health,)>()?
            .par_for_each_mut(|_, (health,)| health.0 = -health.0);

        let total: i64 = world
            .query::<(Health,)>()
            .iter()
            .map(|(_, (h,))| h.0 as i64)
            .sum();
        assert_eq!(total, -(0..1000i64).sum::<i64>());
        Ok(())
    }

    #[test]
    fn test_location_entry_per_live_entity() -> Result<()> {
        let mut world = World::new();
        let entities: Vec<_> = (0..20).map(|_| world.spawn()).collect();
        for (i, &entity) in entities.iter().enumerate() {
            match i % 4 {
                0 => world.set_components(entity, (pos(0.0, 0.0),))?,
                1 => world.set_components(entity, (pos(0.0, 0.0), vel(0.0, 0.0)))?,
                2 => world.remove(entity)?,
                _ => {}
            }
        }

        assert_eq!(world.entity_count(), 15);
        validate_layout(&world)
    }
}

use columnar_ecs::prelude::*;
use columnar_ecs::{EntityLocation, EMPTY_ARCHETYPE};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position(f32, f32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity(f32, f32);

fn row_of(world: &World, entity: EntityId) -> usize {
    world.location(entity).unwrap().archetype_row
}

#[test]
fn removing_last_row_moves_nothing() -> Result<()> {
    let mut world = World::new();
    let a = world.spawn_with((Position(0.0, 0.0),))?;
    let b = world.spawn_with((Position(1.0, 1.0),))?;

    world.remove(b)?;
    assert_eq!(row_of(&world, a), 0);
    assert_eq!(world.get_component::<Position>(a), Some(&Position(0.0, 0.0)));
    validate_layout(&world)
}

#[test]
fn removing_first_row_moves_last_into_it() -> Result<()> {
    let mut world = World::new();
    let entities: Vec<_> = (0..5)
        .map(|i| world.spawn_with((Position(i as f32, 0.0), Velocity(0.0, i as f32))))
        .collect::<Result<_>>()?;

    world.remove(entities[0])?;

    // Only the former last entity changed rows
    assert_eq!(row_of(&world, entities[4]), 0);
    for (row, &entity) in entities.iter().enumerate().skip(1).take(3) {
        assert_eq!(row_of(&world, entity), row);
    }
    let archetype = world.archetype(world.location(entities[4]).unwrap().archetype_id).unwrap();
    assert_eq!(archetype.len(), 4);
    assert_eq!(archetype.entities()[0], entities[4]);
    assert_eq!(archetype.slice::<Position>().unwrap()[0], Position(4.0, 0.0));
    assert_eq!(archetype.slice::<Velocity>().unwrap()[0], Velocity(0.0, 4.0));
    validate_layout(&world)
}

#[test]
fn empty_archetype_compacts_too() -> Result<()> {
    let mut world = World::new();
    let entities: Vec<_> = (0..4).map(|_| world.spawn()).collect();

    world.remove(entities[1])?;
    assert_eq!(
        world.location(entities[3]),
        Some(EntityLocation {
            archetype_id: EMPTY_ARCHETYPE,
            archetype_row: 1
        })
    );

    // Leaving the empty archetype through set_components compacts the same way
    world.set_components(entities[0], (Position(9.0, 9.0),))?;
    assert_eq!(row_of(&world, entities[2]), 0);
    assert_eq!(world.archetype(EMPTY_ARCHETYPE).unwrap().len(), 2);
    validate_layout(&world)
}

#[test]
fn set_components_round_trip() -> Result<()> {
    let mut world = World::new();
    let entity = world.spawn();
    let other = world.spawn_with((Position(1.0, 1.0), Velocity(1.0, 1.0)))?;

    world.set_components(entity, (Velocity(2.0, 2.0), Position(2.0, 2.0)))?;
    let both = world.location(other).unwrap().archetype_id;
    assert_eq!(world.location(entity).unwrap().archetype_id, both);
    assert_eq!(world.archetype(both).unwrap().len(), 2);

    world.set_components(entity, ())?;
    assert_eq!(world.location(entity).unwrap().archetype_id, EMPTY_ARCHETYPE);
    assert_eq!(world.archetype(both).unwrap().len(), 1);
    assert_eq!(row_of(&world, other), 0);
    validate_layout(&world)
}

#[test]
fn same_signature_still_relocates_to_end() -> Result<()> {
    let mut world = World::new();
    let first = world.spawn_with((Position(0.0, 0.0),))?;
    let second = world.spawn_with((Position(1.0, 1.0),))?;

    world.set_components(first, (Position(5.0, 5.0),))?;

    assert_eq!(row_of(&world, second), 0);
    assert_eq!(row_of(&world, first), 1);
    assert_eq!(world.get_component::<Position>(first), Some(&Position(5.0, 5.0)));
    validate_layout(&world)
}

#[test]
fn component_migration_compacts_source() -> Result<()> {
    let mut world = World::new();
    let a = world.spawn_with((Position(0.0, 0.0),))?;
    let b = world.spawn_with((Position(1.0, 1.0),))?;
    let c = world.spawn_with((Position(2.0, 2.0),))?;

    world.add_component(a, Velocity(7.0, 7.0))?;
    assert_eq!(row_of(&world, c), 0);
    assert_eq!(row_of(&world, b), 1);
    assert_eq!(world.get_component::<Position>(a), Some(&Position(0.0, 0.0)));

    let velocity = world.remove_component::<Velocity>(a)?;
    assert_eq!(velocity, Velocity(7.0, 7.0));
    assert_eq!(
        world.location(a).unwrap().archetype_id,
        world.location(b).unwrap().archetype_id
    );
    assert_eq!(row_of(&world, a), 2);
    validate_layout(&world)
}

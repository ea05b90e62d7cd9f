use columnar_ecs::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Health(i32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct Damage(i32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct Dead;

#[test]
fn deferred_removal_after_query() -> Result<()> {
    let mut world = World::new();
    let weak = world.spawn_with((Health(5), Damage(10)))?;
    let strong = world.spawn_with((Health(50), Damage(10)))?;

    let mut commands = CommandBuffer::new();
    for (entity, (health, damage)) in world.query_mut::<(Health, Damage)>()? {
        health.0 -= damage.0;
        if health.0 <= 0 {
            commands.remove(entity);
        }
    }
    commands.apply(&mut world)?;

    assert!(!world.contains(weak));
    assert_eq!(world.get_component::<Health>(strong), Some(&Health(40)));
    validate_layout(&world)
}

#[test]
fn deferred_component_changes() -> Result<()> {
    let mut world = World::new();
    let entity = world.spawn_with((Health(0), Damage(1)))?;

    let mut commands = CommandBuffer::new();
    for (entity, (health,)) in world.query::<(Health,)>().iter() {
        if health.0 == 0 {
            commands.add_component(entity, Dead);
            commands.remove_component::<Damage>(entity);
        }
    }
    assert_eq!(commands.len(), 2);
    commands.apply(&mut world)?;

    assert!(world.has_component::<Dead>(entity));
    assert!(!world.has_component::<Damage>(entity));
    assert_eq!(world.get_component::<Health>(entity), Some(&Health(0)));
    Ok(())
}

#[test]
fn deferred_set_and_spawn() -> Result<()> {
    let mut world = World::new();
    let entity = world.spawn();

    let mut commands = CommandBuffer::with_capacity(2);
    commands.set_components(entity, ComponentList::new().with(Health(3)));
    commands.spawn_with(ComponentList::new().with(Health(4)).with(Dead));
    let spawned = commands.apply(&mut world)?;

    assert_eq!(world.get_component::<Health>(entity), Some(&Health(3)));
    assert_eq!(spawned.len(), 1);
    assert!(world.has_component::<Dead>(spawned[0]));
    assert!(spawned[0] > entity);
    Ok(())
}

#[test]
fn conflicting_list_stops_apply() {
    let mut world = World::new();
    let entity = world.spawn();

    let mut commands = CommandBuffer::new();
    commands.set_components(entity, ComponentList::new().with(Health(1)).with(Health(2)));
    commands.remove(entity);

    assert!(matches!(
        commands.apply(&mut world),
        Err(EcsError::ConflictingComponent(_))
    ));
    assert!(world.contains(entity));
    assert!(!world.has_component::<Health>(entity));
}

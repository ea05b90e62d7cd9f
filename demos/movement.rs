//! Example: movement and damage systems over the archetype store
//!
//! Three entities with different component sets; each tick moves everything
//! that has a velocity and damages everything that has health.

use columnar_ecs::prelude::*;

#[derive(Debug)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug)]
struct Health(i32);

/// Update Position using Velocity
fn movement_system(world: &mut World) -> Result<()> {
    for (_, (position, velocity)) in world.query_mut::<(Position, Velocity)>()? {
        position.x += velocity.dx;
        position.y += velocity.dy;
    }
    Ok(())
}

/// Reduce Health for all entities that have it
fn damage_system(world: &mut World, amount: i32) -> Result<()> {
    world
        .query_mut::<(Health,)>()?
        .for_each_mut(|_, (health,)| health.0 -= amount);
    Ok(())
}

fn print_positions(world: &World) {
    for (entity, (position,)) in world.query::<(Position,)>().iter() {
        println!("{entity} -> {position:?}");
    }
}

fn main() -> Result<()> {
    let mut world = World::new();

    let player = world.spawn();
    let enemy = world.spawn();
    let projectile = world.spawn();

    world.set_components(
        player,
        (
            Position { x: 0.0, y: 0.0 },
            Velocity { dx: 1.0, dy: 1.0 },
            Health(100),
        ),
    )?;
    world.set_components(enemy, (Position { x: 10.0, y: 5.0 }, Health(50)))?;
    world.set_components(
        projectile,
        (Position { x: 2.0, y: 2.0 }, Velocity { dx: 5.0, dy: 0.0 }),
    )?;

    println!("== Initial State ==");
    print_positions(&world);

    movement_system(&mut world)?;
    damage_system(&mut world, 10)?;

    println!("\n== After 1 Tick ==");
    print_positions(&world);
    for (entity, (health,)) in world.query::<(Health,)>().iter() {
        println!("{entity} -> Health: {}", health.0);
    }

    println!("\n== Removing projectile ==");
    world.remove(projectile)?;

    println!("\n== Final State (Position query) ==");
    print_positions(&world);

    println!();
    WorldInspector::print_summary(&world);
    validate_layout(&world)
}

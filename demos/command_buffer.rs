//! Example: deferring structural changes while a query is borrowed
//!
//! Projectiles hit targets during iteration; the hits are recorded in a
//! command buffer and applied once the query result is gone.

use columnar_ecs::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
}

#[derive(Debug, Clone, Copy)]
struct Health(i32);

#[derive(Debug, Clone, Copy)]
struct Burning;

fn main() -> Result<()> {
    let mut world = World::new();

    for i in 0..6 {
        world.spawn_with((Position { x: i as f32 }, Health(30 * i)))?;
    }
    world.spawn_with((Position { x: 0.0 }, Velocity { dx: 1.5 }))?;

    let mut commands = CommandBuffer::new();
    for tick in 0..3 {
        for (entity, (health,)) in world.query_mut::<(Health,)>()? {
            health.0 -= 25;
            if health.0 <= 0 {
                commands.remove(entity);
            } else if health.0 < 50 {
                commands.add_component(entity, Burning);
            }
        }

        for (_, (position, velocity)) in world.query_mut::<(Position, Velocity)>()? {
            position.x += velocity.dx;
        }

        if tick == 1 {
            commands.spawn_with(ComponentList::new().with(Position { x: 9.0 }).with(Health(10)));
        }

        let spawned = commands.apply(&mut world)?;
        println!(
            "tick {tick}: {} entities, {} burning, spawned {:?}",
            world.entity_count(),
            world.query::<(Burning,)>().len(),
            spawned
        );
    }

    WorldInspector::print_summary(&world);
    validate_layout(&world)
}

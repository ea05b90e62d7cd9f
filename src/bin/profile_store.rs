#![allow(dead_code, unused_imports)]

use columnar_ecs::World;
use std::{fs::File, time::Instant};

#[cfg(feature = "profiling")]
use tracing_subscriber::{self, prelude::*};

#[derive(Debug, Clone)]
struct Position(f32, f32);

#[derive(Debug, Clone)]
struct Velocity(f32, f32);

#[derive(Debug, Clone)]
struct Acceleration(f32, f32);

#[cfg(feature = "profiling")]
#[tracing::instrument(skip(world))]
fn profile_store(world: &mut World, count: usize) -> columnar_ecs::Result<()> {
    let entities: Vec<_> = {
        let _span = tracing::info_span!("spawn_loop", count = count).entered();
        (0..count).map(|_| world.spawn()).collect()
    };

    {
        let _span = tracing::info_span!("set_loop", count = count).entered();
        for (i, &entity) in entities.iter().enumerate() {
            if i % 1_000 == 0 {
                tracing::info!("Setting components {}/{}", i, count);
            }
            world.set_components(
                entity,
                (Position(0.0, 0.0), Velocity(1.0, 1.0), Acceleration(1.0, 1.0)),
            )?;
        }
    }

    {
        let _span = tracing::info_span!("query_loop").entered();
        for _ in 0..100 {
            let matched = world.query::<(Position, Velocity)>().len();
            tracing::debug!(matched, "query");
        }
    }

    let _span = tracing::info_span!("remove_loop", count = count).entered();
    for entity in entities {
        world.remove(entity)?;
    }
    Ok(())
}

#[cfg(feature = "profiling")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing subscriber to write to a file
    let file = File::create("trace.json")?;
    let (non_blocking, _guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .init();

    let mut world = World::new();

    println!("Profiling spawn / set 3 components / query / remove...");
    let start = Instant::now();
    profile_store(&mut world, 10_000)?;
    println!("Store workload on 10k entities complete in: {:?}", start.elapsed());
    Ok(())
}

#[cfg(not(feature = "profiling"))]
fn main() {
    println!("profile_store binary requires --features profiling");
}

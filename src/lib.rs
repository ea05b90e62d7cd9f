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

//! Columnar ECS - archetype-based entity component storage
//!
//! Entities sharing one exact component set live in the same archetype,
//! whose components are stored column by column. Structural changes move
//! rows between archetypes with swap-with-last compaction; queries visit
//! only the archetypes that hold every requested component.
//!
//! ```
//! use columnar_ecs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position(f32, f32);
//! struct Velocity(f32, f32);
//!
//! let mut world = World::new();
//! let moving = world.spawn();
//! world.set_components(moving, (Position(0.0, 0.0), Velocity(1.0, 1.0))).unwrap();
//!
//! for (_, (pos, vel)) in world.query_mut::<(Position, Velocity)>().unwrap() {
//!     pos.0 += vel.0;
//!     pos.1 += vel.1;
//! }
//! assert_eq!(world.get_component::<Position>(moving), Some(&Position(1.0, 1.0)));
//! ```

pub mod archetype;
pub mod command;
pub mod component;
pub mod config;
pub mod debug;
pub mod entity;
pub mod error;
pub mod index;
pub mod prelude;
pub mod query;
pub mod world;

#[cfg(test)]
mod tests;

pub use archetype::*;
pub use command::*;
pub use component::*;
pub use config::*;
pub use debug::*;
pub use entity::*;
pub use error::*;
pub use index::*;
pub use query::*;
pub use world::*;

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

//! Component and Bundle traits
//!
//! Components are plain data attached to entities. Each Rust type gets a
//! compact [`ComponentId`] the first time the registry sees it; archetype
//! signatures are sorted runs of those ids.
//! Bundles group the components handed to `set_components` in one call.

use std::any::{type_name, TypeId};
use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::smallvec;

use crate::archetype::{Archetype, ArchetypeSignature, ColumnStorage};
use crate::error::{EcsError, Result};

/// Maximum number of components supported by tuple Bundle implementations
pub const MAX_BUNDLE_COMPONENTS: usize = 8;

/// Marker trait for components
///
/// Components must be 'static (no borrowed data)
pub trait Component: 'static + Send + Sync {}

/// Automatically implement Component for all valid types
impl<T: 'static + Send + Sync> Component for T {}

/// Dense per-world tag for a component type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Position in the registry
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runtime description of a component type: identity plus the column factory.
#[derive(Clone, Copy)]
pub struct ComponentInfo {
    id: ComponentId,
    type_id: TypeId,
    name: &'static str,
    new_storage: fn() -> Box<dyn ColumnStorage>,
}

impl ComponentInfo {
    fn of<T: Component>(id: ComponentId) -> Self {
        Self {
            id,
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            new_storage: new_storage::<T>,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full Rust type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn new_storage(&self) -> Box<dyn ColumnStorage> {
        (self.new_storage)()
    }
}

fn new_storage<T: Component>() -> Box<dyn ColumnStorage> {
    Box::new(Vec::<T>::new())
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Maps Rust types to [`ComponentId`]s, assigned in first-seen order.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_type: FxHashMap<TypeId, ComponentId>,
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the id of `T`, registering it on first sight
    pub fn register<T: Component>(&mut self) -> ComponentId {
        if let Some(&id) = self.by_type.get(&TypeId::of::<T>()) {
            return id;
        }
        let id = ComponentId(self.infos.len() as u32);
        self.infos.push(ComponentInfo::of::<T>(id));
        self.by_type.insert(TypeId::of::<T>(), id);
        id
    }

    pub fn id_of<T: Component>(&self) -> Option<ComponentId> {
        self.id_of_type(TypeId::of::<T>())
    }

    pub fn id_of_type(&self, type_id: TypeId) -> Option<ComponentId> {
        self.by_type.get(&type_id).copied()
    }

    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Number of registered component types
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Sort `ids` into a canonical signature.
    ///
    /// Fails with [`EcsError::ConflictingComponent`] if an id appears twice.
    pub fn canonicalize(&self, mut ids: ArchetypeSignature) -> Result<ArchetypeSignature> {
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            let name = self.info(pair[0]).map_or("<unregistered>", |info| info.name());
            return Err(EcsError::ConflictingComponent(name));
        }
        Ok(ids)
    }
}

/// Bundle of components
///
/// A bundle is the full component set handed to `World::set_components`.
/// Implemented for tuples of up to [`MAX_BUNDLE_COMPONENTS`] components,
/// for `()` (no components) and for the dynamic [`ComponentList`].
pub trait Bundle: Send + 'static {
    /// Register every member type and return the canonical signature
    fn component_ids(&self, registry: &mut ComponentRegistry) -> Result<ArchetypeSignature>;

    /// Push each value onto its column. Does not touch the entity list.
    fn write_into(self, archetype: &mut Archetype);
}

impl Bundle for () {
    fn component_ids(&self, _registry: &mut ComponentRegistry) -> Result<ArchetypeSignature> {
        Ok(ArchetypeSignature::new())
    }

    fn write_into(self, _archetype: &mut Archetype) {}
}

// Macro for tuple Bundle implementations
macro_rules! impl_bundle {
    ($($T:ident),*) => {
        impl<$($T: Component),*> Bundle for ($($T,)*) {
            fn component_ids(&self, registry: &mut ComponentRegistry) -> Result<ArchetypeSignature> {
                let ids: ArchetypeSignature = smallvec![$(registry.register::<$T>()),*];
                registry.canonicalize(ids)
            }

            #[allow(non_snake_case)]
            fn write_into(self, archetype: &mut Archetype) {
                let ($($T,)*) = self;
                $(
                    let pushed = archetype.push_component($T);
                    debug_assert!(pushed, "BUG: archetype has no column for {}", type_name::<$T>());
                )*
            }
        }
    };
}

// Implement for tuples of 1-8 components
impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

/// Object-safe view of a single component value, used by [`ComponentList`].
///
/// Method names stay distinct from inherent ones, since the blanket impl
/// covers every `Component`, `ComponentRegistry` and `World` included.
pub trait AnyComponent: Send {
    fn register_type(&self, registry: &mut ComponentRegistry) -> ComponentId;

    fn component_name(&self) -> &'static str;

    fn write_boxed(self: Box<Self>, archetype: &mut Archetype) -> bool;
}

impl<T: Component> AnyComponent for T {
    fn register_type(&self, registry: &mut ComponentRegistry) -> ComponentId {
        registry.register::<T>()
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn write_boxed(self: Box<Self>, archetype: &mut Archetype) -> bool {
        archetype.push_component(*self)
    }
}

/// Heterogeneous, runtime-built component set.
///
/// ```
/// use columnar_ecs::prelude::*;
///
/// struct Health(u32);
/// struct Name(&'static str);
///
/// let mut world = World::new();
/// let entity = world.spawn();
/// let components = ComponentList::new().with(Health(10)).with(Name("orc"));
/// world.set_components(entity, components).unwrap();
/// assert_eq!(world.get_component::<Health>(entity).map(|h| h.0), Some(10));
/// ```
#[derive(Default)]
pub struct ComponentList {
    items: Vec<Box<dyn AnyComponent>>,
}

impl ComponentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style push
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.push(component);
        self
    }

    pub fn push<T: Component>(&mut self, component: T) {
        self.items.push(Box::new(component));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Type names of the contained values, in insertion order
    pub fn component_names(&self) -> Vec<&'static str> {
        self.items.iter().map(|item| item.component_name()).collect()
    }
}

impl fmt::Debug for ComponentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.component_names()).finish()
    }
}

impl Bundle for ComponentList {
    fn component_ids(&self, registry: &mut ComponentRegistry) -> Result<ArchetypeSignature> {
        let ids: ArchetypeSignature = self
            .items
            .iter()
            .map(|item| item.register_type(registry))
            .collect();
        registry.canonicalize(ids)
    }

    fn write_into(self, archetype: &mut Archetype) {
        for item in self.items {
            let pushed = item.write_boxed(archetype);
            debug_assert!(pushed, "BUG: archetype is missing a column for a listed component");
        }
    }
}

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

//! Archetype storage with row allocation and swap-compacted removal

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::component::{Component, ComponentId, ComponentInfo};
use crate::entity::EntityId;
use crate::index::ArchetypeId;

/// Component signature: sorted, duplicate-free component ids
pub type ArchetypeSignature = SmallVec<[ComponentId; 8]>;

/// Archetype: Structure of Arrays storage
///
/// `entities[row]` and `columns[c][row]` always describe the same entity;
/// every mutation keeps all of them at the same length.
pub struct Archetype {
    id: ArchetypeId,
    signature: ArchetypeSignature,
    entities: Vec<EntityId>,
    columns: Vec<ComponentColumn>,
    column_indices: FxHashMap<TypeId, usize>,
}

/// Outcome of moving one row to another archetype
#[derive(Debug)]
pub(crate) struct Migration<T> {
    /// Row of the moved entity in the destination
    pub new_row: usize,
    /// Entity that was swapped into the vacated source row, if any
    pub swapped: Option<EntityId>,
    /// Value of type `T` taken out of the source row
    pub extracted: Option<T>,
}

impl Archetype {
    /// Create new archetype with one empty column per component
    pub fn new<'a>(
        id: ArchetypeId,
        signature: ArchetypeSignature,
        infos: impl IntoIterator<Item = &'a ComponentInfo>,
        reserve: usize,
    ) -> Self {
        let mut archetype = Self {
            id,
            signature,
            entities: Vec::new(),
            columns: Vec::new(),
            column_indices: FxHashMap::default(),
        };
        for info in infos {
            if !archetype.column_indices.contains_key(&info.type_id()) {
                archetype
                    .column_indices
                    .insert(info.type_id(), archetype.columns.len());
                archetype.columns.push(ComponentColumn::new(info));
            }
        }
        archetype.reserve_rows(reserve);
        archetype
    }

    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    /// Get signature
    pub fn signature(&self) -> &ArchetypeSignature {
        &self.signature
    }

    /// Check membership by compact id
    pub fn contains(&self, component: ComponentId) -> bool {
        self.signature.binary_search(&component).is_ok()
    }

    pub fn has_column(&self, type_id: TypeId) -> bool {
        self.column_indices.contains_key(&type_id)
    }

    /// Get all entities
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if archetype is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Reserve space for additional rows
    pub fn reserve_rows(&mut self, additional: usize) {
        if self.entities.capacity() - self.entities.len() < additional {
            self.entities.reserve(additional);
            for column in &mut self.columns {
                column.storage.reserve(additional);
            }
        }
    }

    /// Get column immutably
    pub fn column(&self, type_id: TypeId) -> Option<&ComponentColumn> {
        let idx = *self.column_indices.get(&type_id)?;
        self.columns.get(idx)
    }

    /// Get column mutably
    pub fn column_mut(&mut self, type_id: TypeId) -> Option<&mut ComponentColumn> {
        let idx = *self.column_indices.get(&type_id)?;
        self.columns.get_mut(idx)
    }

    /// Get column index for a component type
    pub fn column_index(&self, type_id: TypeId) -> Option<usize> {
        self.column_indices.get(&type_id).copied()
    }

    /// All columns, in signature order
    pub fn columns(&self) -> &[ComponentColumn] {
        &self.columns
    }

    /// Entity list and mutable columns at once, for mutable queries
    pub(crate) fn split_mut(&mut self) -> (&[EntityId], &mut [ComponentColumn]) {
        (&self.entities, &mut self.columns)
    }

    /// Typed component slice for `T`
    pub fn slice<T: Component>(&self) -> Option<&[T]> {
        self.column(TypeId::of::<T>())?.as_slice::<T>()
    }

    pub fn get<T: Component>(&self, row: usize) -> Option<&T> {
        self.slice::<T>()?.get(row)
    }

    pub fn get_mut<T: Component>(&mut self, row: usize) -> Option<&mut T> {
        self.column_mut(TypeId::of::<T>())?
            .as_mut_slice::<T>()?
            .get_mut(row)
    }

    /// Push a value onto the column of `T`. Returns false if there is no such column.
    pub(crate) fn push_component<T: Component>(&mut self, value: T) -> bool {
        match self.column_mut(TypeId::of::<T>()) {
            Some(column) => column.push(value),
            None => false,
        }
    }

    /// Append `entity` after its components were pushed; returns its row.
    pub(crate) fn push_entity(&mut self, entity: EntityId) -> usize {
        self.entities.push(entity);
        let row = self.entities.len() - 1;
        debug_assert!(
            self.columns.iter().all(|column| column.len() == self.entities.len()),
            "BUG: archetype {} columns out of alignment after push",
            self.id
        );
        row
    }

    /// Remove `row` using swap-with-last compaction.
    ///
    /// Every column pops its last value; if `row` was not the last row, the
    /// popped value is written back into `row`, and likewise for the entity
    /// list. Returns the entity that now occupies `row`, if one was moved.
    pub fn swap_remove_row(&mut self, row: usize) -> Option<EntityId> {
        if row >= self.entities.len() {
            return None;
        }
        for column in &mut self.columns {
            column.storage.swap_remove(row);
        }
        self.swap_remove_entity(row)
    }

    fn swap_remove_entity(&mut self, row: usize) -> Option<EntityId> {
        let last_row = self.entities.len().checked_sub(1)?;
        let last_entity = self.entities.pop()?;
        if row == last_row {
            return None;
        }
        self.entities[row] = last_entity;
        Some(last_entity)
    }

    /// Move the entity at `row` into `dst`.
    ///
    /// Values whose type `dst` also stores are moved across, the column of
    /// `T` (if present here) is taken out and returned, everything else is
    /// dropped. `insert` is pushed onto the destination column of `T`.
    /// The source row is swap-compacted.
    pub(crate) fn migrate_row<T: Component>(
        &mut self,
        row: usize,
        dst: &mut Archetype,
        insert: Option<T>,
    ) -> Option<Migration<T>> {
        let entity = *self.entities.get(row)?;
        let target = TypeId::of::<T>();
        let mut extracted = None;

        for column in &mut self.columns {
            // Inherent call; `column.type_id()` would resolve to `Any` on `&mut`
            let type_id = ComponentColumn::type_id(column);
            if type_id == target {
                extracted = column.take::<T>(row);
                continue;
            }
            match dst.column_mut(type_id) {
                Some(dst_column) => column.storage.move_row(row, dst_column.storage.as_mut()),
                None => column.storage.swap_remove(row),
            }
        }
        if let Some(value) = insert {
            let pushed = dst.push_component(value);
            debug_assert!(pushed, "BUG: destination archetype {} lacks inserted column", dst.id);
        }

        let new_row = dst.push_entity(entity);
        let swapped = self.swap_remove_entity(row);
        Some(Migration {
            new_row,
            swapped,
            extracted,
        })
    }
}

impl std::fmt::Debug for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archetype")
            .field("id", &self.id)
            .field("signature", &self.signature)
            .field("len", &self.entities.len())
            .finish()
    }
}

/// Per-type column operations behind a vtable.
///
/// Implemented for `Vec<T>`; the archetype only ever talks to columns
/// through this trait, so it stays independent of concrete component types.
pub(crate) trait ColumnStorage: Send + Sync {
    fn len(&self) -> usize;

    fn reserve(&mut self, additional: usize);

    /// Drop the value at `row`, moving the last value into its place
    fn swap_remove(&mut self, row: usize);

    /// Swap-remove the value at `row` and push it onto `dst`
    fn move_row(&mut self, row: usize, dst: &mut dyn ColumnStorage);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ColumnStorage for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn reserve(&mut self, additional: usize) {
        Vec::reserve(self, additional);
    }

    fn swap_remove(&mut self, row: usize) {
        Vec::swap_remove(self, row);
    }

    fn move_row(&mut self, row: usize, dst: &mut dyn ColumnStorage) {
        let value = Vec::swap_remove(self, row);
        match dst.as_any_mut().downcast_mut::<Vec<T>>() {
            Some(dst) => dst.push(value),
            None => debug_assert!(false, "BUG: column type mismatch while moving a row"),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Type-erased component column
pub struct ComponentColumn {
    info: ComponentInfo,
    storage: Box<dyn ColumnStorage>,
}

impl ComponentColumn {
    /// Create new, empty column for the described type
    pub fn new(info: &ComponentInfo) -> Self {
        Self {
            info: *info,
            storage: info.new_storage(),
        }
    }

    pub fn info(&self) -> &ComponentInfo {
        &self.info
    }

    pub fn type_id(&self) -> TypeId {
        self.info.type_id()
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Is empty
    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    /// Typed view; `None` if `T` is not this column's type
    pub fn as_slice<T: Component>(&self) -> Option<&[T]> {
        self.storage
            .as_any()
            .downcast_ref::<Vec<T>>()
            .map(Vec::as_slice)
    }

    pub fn as_mut_slice<T: Component>(&mut self) -> Option<&mut [T]> {
        self.storage
            .as_any_mut()
            .downcast_mut::<Vec<T>>()
            .map(Vec::as_mut_slice)
    }

    /// Get component at index
    pub fn get<T: Component>(&self, index: usize) -> Option<&T> {
        self.as_slice::<T>()?.get(index)
    }

    fn push<T: Component>(&mut self, value: T) -> bool {
        match self.storage.as_any_mut().downcast_mut::<Vec<T>>() {
            Some(values) => {
                values.push(value);
                true
            }
            None => false,
        }
    }

    fn take<T: Component>(&mut self, row: usize) -> Option<T> {
        let values = self.storage.as_any_mut().downcast_mut::<Vec<T>>()?;
        (row < values.len()).then(|| values.swap_remove(row))
    }
}

impl std::fmt::Debug for ComponentColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentColumn")
            .field("component", &self.info.name())
            .field("len", &self.len())
            .finish()
    }
}

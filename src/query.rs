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

//! Query system with archetype filtering
//!
//! A query names a tuple of component types and yields every entity whose
//! archetype holds all of them, together with the matching column slices.
//! Results borrow the world, so the borrow checker rules out structural
//! changes while a result is alive.

use std::any::{type_name, TypeId};

use smallvec::{smallvec, SmallVec};

use crate::archetype::Archetype;
use crate::component::Component;
use crate::entity::EntityId;
use crate::index::ArchetypeId;

pub const MAX_QUERY_COMPONENTS: usize = 8;

/// Required component types with their names
pub type QueryComponents = SmallVec<[(TypeId, &'static str); MAX_QUERY_COMPONENTS]>;

/// Type-level description of a query: which columns to borrow and how to
/// turn a row into an item.
///
/// Implemented for `()` (matches nothing) and tuples of 1-8 components.
pub trait QuerySet: 'static {
    /// Shared column slices of one archetype
    type Columns<'w>: Copy;
    /// Exclusive column slices of one archetype
    type ColumnsMut<'w>: Send;
    type Item<'w>;
    type ItemMut<'w>;

    fn components() -> QueryComponents;

    fn columns(archetype: &Archetype) -> Option<Self::Columns<'_>>;

    fn columns_mut(archetype: &mut Archetype) -> Option<(&[EntityId], Self::ColumnsMut<'_>)>;

    fn fetch<'w>(columns: Self::Columns<'w>, row: usize) -> Option<Self::Item<'w>>;

    /// Shorten the borrow of exclusive columns
    fn reborrow<'a>(columns: &'a mut Self::ColumnsMut<'_>) -> Self::ColumnsMut<'a>;

    /// Split the first row off the front of `columns`
    fn next_mut<'w>(columns: &mut Self::ColumnsMut<'w>) -> Option<Self::ItemMut<'w>>;
}

impl QuerySet for () {
    type Columns<'w> = ();
    type ColumnsMut<'w> = ();
    type Item<'w> = ();
    type ItemMut<'w> = ();

    fn components() -> QueryComponents {
        QueryComponents::new()
    }

    fn columns(_archetype: &Archetype) -> Option<Self::Columns<'_>> {
        Some(())
    }

    fn columns_mut(archetype: &mut Archetype) -> Option<(&[EntityId], Self::ColumnsMut<'_>)> {
        Some((archetype.entities(), ()))
    }

    fn fetch<'w>(_columns: Self::Columns<'w>, _row: usize) -> Option<Self::Item<'w>> {
        Some(())
    }

    fn reborrow<'a>(_columns: &'a mut Self::ColumnsMut<'_>) -> Self::ColumnsMut<'a> {}

    fn next_mut<'w>(_columns: &mut Self::ColumnsMut<'w>) -> Option<Self::ItemMut<'w>> {
        Some(())
    }
}

macro_rules! impl_query_set {
    ($($T:ident),*) => {
        impl<$($T: Component),*> QuerySet for ($($T,)*) {
            type Columns<'w> = ($(&'w [$T],)*);
            type ColumnsMut<'w> = ($(&'w mut [$T],)*);
            type Item<'w> = ($(&'w $T,)*);
            type ItemMut<'w> = ($(&'w mut $T,)*);

            fn components() -> QueryComponents {
                smallvec![$((TypeId::of::<$T>(), type_name::<$T>())),*]
            }

            fn columns(archetype: &Archetype) -> Option<Self::Columns<'_>> {
                Some(($(archetype.slice::<$T>()?,)*))
            }

            #[allow(non_snake_case)]
            fn columns_mut(archetype: &mut Archetype) -> Option<(&[EntityId], Self::ColumnsMut<'_>)> {
                let indices = [$(archetype.column_index(TypeId::of::<$T>())?),*];
                let (entities, columns) = archetype.split_mut();
                // Fails on repeated types, which would alias
                let [$($T),*] = columns.get_disjoint_mut(indices).ok()?;
                Some((entities, ($($T.as_mut_slice::<$T>()?,)*)))
            }

            #[allow(non_snake_case)]
            fn fetch<'w>(columns: Self::Columns<'w>, row: usize) -> Option<Self::Item<'w>> {
                let ($($T,)*) = columns;
                Some(($($T.get(row)?,)*))
            }

            #[allow(non_snake_case)]
            fn reborrow<'a>(columns: &'a mut Self::ColumnsMut<'_>) -> Self::ColumnsMut<'a> {
                let ($($T,)*) = columns;
                ($(&mut **$T,)*)
            }

            #[allow(non_snake_case)]
            fn next_mut<'w>(columns: &mut Self::ColumnsMut<'w>) -> Option<Self::ItemMut<'w>> {
                let ($($T,)*) = columns;
                Some(($({
                    let slice = std::mem::take($T);
                    let (head, tail) = slice.split_first_mut()?;
                    *$T = tail;
                    head
                },)*))
            }
        }
    };
}

impl_query_set!(A);
impl_query_set!(A, B);
impl_query_set!(A, B, C);
impl_query_set!(A, B, C, D);
impl_query_set!(A, B, C, D, E);
impl_query_set!(A, B, C, D, E, F);
impl_query_set!(A, B, C, D, E, F, G);
impl_query_set!(A, B, C, D, E, F, G, H);

fn names_component<Q: QuerySet, T: Component>() -> bool {
    Q::components()
        .iter()
        .any(|(type_id, _)| *type_id == TypeId::of::<T>())
}

/// Rows of one matched archetype
pub struct QueryBatch<'w, Q: QuerySet> {
    archetype: &'w Archetype,
    columns: Q::Columns<'w>,
}

impl<'w, Q: QuerySet> QueryBatch<'w, Q> {
    pub fn archetype_id(&self) -> ArchetypeId {
        self.archetype.id()
    }

    pub fn entities(&self) -> &'w [EntityId] {
        self.archetype.entities()
    }

    /// Column slices, index-aligned with [`entities`](Self::entities)
    pub fn columns(&self) -> Q::Columns<'w> {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.archetype.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetype.is_empty()
    }
}

/// Read view over every entity matching `Q`.
///
/// Index `i` of [`entities`](Self::entities) and of every
/// [`column`](Self::column) refer to the same entity.
pub struct QueryResult<'w, Q: QuerySet> {
    batches: Vec<QueryBatch<'w, Q>>,
    len: usize,
}

impl<'w, Q: QuerySet> QueryResult<'w, Q> {
    pub(crate) fn empty() -> Self {
        Self {
            batches: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn new(archetypes: impl Iterator<Item = &'w Archetype>) -> Self {
        let batches: Vec<_> = archetypes
            .filter(|archetype| !archetype.is_empty())
            .filter_map(|archetype| {
                Some(QueryBatch {
                    archetype,
                    columns: Q::columns(archetype)?,
                })
            })
            .collect();
        let len = batches.iter().map(QueryBatch::len).sum();
        Self { batches, len }
    }

    /// Number of matching entities
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Per-archetype batches, in ascending archetype order
    pub fn batches(&self) -> &[QueryBatch<'w, Q>] {
        &self.batches
    }

    /// Matching entities, concatenated over archetypes
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + use<'_, 'w, Q> {
        self.batches
            .iter()
            .flat_map(|batch| batch.entities().iter().copied())
    }

    /// Values of `T`, aligned with [`entities`](Self::entities).
    ///
    /// `None` if `T` is not one of the queried types.
    pub fn column<T: Component>(&self) -> Option<impl Iterator<Item = &'w T> + '_> {
        if !names_component::<Q, T>() {
            return None;
        }
        Some(self.batches.iter().flat_map(|batch| {
            batch
                .archetype
                .slice::<T>()
                .unwrap_or_default()
                .iter()
        }))
    }

    /// Entity and components at result index `index`
    pub fn get(&self, index: usize) -> Option<(EntityId, Q::Item<'w>)> {
        let mut index = index;
        for batch in &self.batches {
            if index < batch.len() {
                let entity = *batch.entities().get(index)?;
                return Some((entity, Q::fetch(batch.columns, index)?));
            }
            index -= batch.len();
        }
        None
    }

    pub fn iter(&self) -> QueryIter<'_, 'w, Q> {
        QueryIter {
            batches: self.batches.iter(),
            current: None,
            row: 0,
            remaining: self.len,
        }
    }
}

impl<'a, 'w, Q: QuerySet> IntoIterator for &'a QueryResult<'w, Q> {
    type Item = (EntityId, Q::Item<'w>);
    type IntoIter = QueryIter<'a, 'w, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Immutable query iterator
pub struct QueryIter<'a, 'w, Q: QuerySet> {
    batches: std::slice::Iter<'a, QueryBatch<'w, Q>>,
    current: Option<&'a QueryBatch<'w, Q>>,
    row: usize,
    remaining: usize,
}

impl<'a, 'w, Q: QuerySet> Iterator for QueryIter<'a, 'w, Q> {
    type Item = (EntityId, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let batch = match self.current {
                Some(batch) => batch,
                None => {
                    self.current = Some(self.batches.next()?);
                    self.row = 0;
                    continue;
                }
            };

            let Some(&entity) = batch.entities().get(self.row) else {
                self.current = None;
                continue;
            };
            let row = self.row;
            self.row += 1;
            if let Some(item) = Q::fetch(batch.columns, row) {
                self.remaining = self.remaining.saturating_sub(1);
                return Some((entity, item));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, 'w, Q: QuerySet> ExactSizeIterator for QueryIter<'a, 'w, Q> {}

/// Rows of one matched archetype, with exclusive access to the columns
pub struct QueryBatchMut<'w, Q: QuerySet> {
    archetype_id: ArchetypeId,
    entities: &'w [EntityId],
    columns: Q::ColumnsMut<'w>,
}

impl<'w, Q: QuerySet> QueryBatchMut<'w, Q> {
    pub fn archetype_id(&self) -> ArchetypeId {
        self.archetype_id
    }

    pub fn entities(&self) -> &'w [EntityId] {
        self.entities
    }

    /// Column slices, index-aligned with [`entities`](Self::entities)
    pub fn into_columns(self) -> Q::ColumnsMut<'w> {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn next_row(&mut self) -> Option<(EntityId, Q::ItemMut<'w>)> {
        let (&entity, rest) = self.entities.split_first()?;
        self.entities = rest;
        Some((entity, Q::next_mut(&mut self.columns)?))
    }
}

/// Mutable view over every entity matching `Q`.
pub struct QueryResultMut<'w, Q: QuerySet> {
    batches: Vec<QueryBatchMut<'w, Q>>,
    len: usize,
}

impl<'w, Q: QuerySet> QueryResultMut<'w, Q> {
    pub(crate) fn empty() -> Self {
        Self {
            batches: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn new(archetypes: Vec<&'w mut Archetype>) -> Self {
        let batches: Vec<_> = archetypes
            .into_iter()
            .filter(|archetype| !archetype.is_empty())
            .filter_map(|archetype| {
                let archetype_id = archetype.id();
                let (entities, columns) = Q::columns_mut(archetype)?;
                Some(QueryBatchMut {
                    archetype_id,
                    entities,
                    columns,
                })
            })
            .collect();
        let len = batches.iter().map(QueryBatchMut::len).sum();
        Self { batches, len }
    }

    /// Number of matching entities
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Matching entities, concatenated over archetypes
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + use<'_, 'w, Q> {
        self.batches
            .iter()
            .flat_map(|batch| batch.entities.iter().copied())
    }

    /// Iterate without consuming the result
    pub fn iter_mut(&mut self) -> QueryIterMut<'_, Q> {
        let batches: Vec<_> = self
            .batches
            .iter_mut()
            .map(|batch| QueryBatchMut {
                archetype_id: batch.archetype_id,
                entities: batch.entities,
                columns: Q::reborrow(&mut batch.columns),
            })
            .collect();
        QueryIterMut {
            remaining: self.len,
            batches: batches.into_iter(),
            current: None,
        }
    }

    /// Per-archetype batches, in ascending archetype order
    pub fn into_batches(self) -> Vec<QueryBatchMut<'w, Q>> {
        self.batches
    }

    pub fn for_each_mut<F>(self, mut func: F)
    where
        F: FnMut(EntityId, Q::ItemMut<'w>),
    {
        for (entity, item) in self {
            func(entity, item);
        }
    }

    /// Visit matching archetypes in parallel; rows of one archetype run in order.
    #[cfg(feature = "parallel")]
    pub fn par_for_each_mut<F>(self, func: F)
    where
        F: Fn(EntityId, Q::ItemMut<'w>) + Send + Sync,
    {
        use rayon::prelude::*;

        self.batches.into_par_iter().for_each(|mut batch| {
            while let Some((entity, item)) = batch.next_row() {
                func(entity, item);
            }
        });
    }
}

impl<'w, Q: QuerySet> IntoIterator for QueryResultMut<'w, Q> {
    type Item = (EntityId, Q::ItemMut<'w>);
    type IntoIter = QueryIterMut<'w, Q>;

    fn into_iter(self) -> Self::IntoIter {
        QueryIterMut {
            remaining: self.len,
            batches: self.batches.into_iter(),
            current: None,
        }
    }
}

/// Mutable query iterator
pub struct QueryIterMut<'w, Q: QuerySet> {
    batches: std::vec::IntoIter<QueryBatchMut<'w, Q>>,
    current: Option<QueryBatchMut<'w, Q>>,
    remaining: usize,
}

impl<'w, Q: QuerySet> Iterator for QueryIterMut<'w, Q> {
    type Item = (EntityId, Q::ItemMut<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                self.current = Some(self.batches.next()?);
            }
            let next = self.current.as_mut().and_then(QueryBatchMut::next_row);
            match next {
                Some(item) => {
                    self.remaining = self.remaining.saturating_sub(1);
                    return Some(item);
                }
                None => self.current = None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'w, Q: QuerySet> ExactSizeIterator for QueryIterMut<'w, Q> {}

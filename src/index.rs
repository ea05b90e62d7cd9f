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

//! Archetype index: signature <-> id in both directions, plus a
//! per-component list of the archetypes that contain it.

use ahash::AHashMap;

use crate::archetype::{Archetype, ArchetypeSignature};
use crate::component::{ComponentId, ComponentRegistry};
use crate::error::{EcsError, Result};

/// Stable archetype identifier, assigned in creation order
pub type ArchetypeId = usize;

/// The archetype of entities without components. Always exists.
pub const EMPTY_ARCHETYPE: ArchetypeId = 0;

pub struct ArchetypeIndex {
    /// All archetypes, position == id
    archetypes: Vec<Archetype>,

    /// Canonical signature -> id
    by_signature: AHashMap<ArchetypeSignature, ArchetypeId>,

    /// Component index -> ascending ids of archetypes containing it
    by_component: Vec<Vec<ArchetypeId>>,

    /// Rows reserved in every new archetype
    row_reserve: usize,
}

impl ArchetypeIndex {
    pub fn new(archetype_capacity: usize, row_reserve: usize) -> Self {
        let mut index = Self {
            archetypes: Vec::with_capacity(archetype_capacity),
            by_signature: AHashMap::with_capacity(archetype_capacity),
            by_component: Vec::new(),
            row_reserve,
        };

        // Bootstrap the empty archetype (entities with no components)
        let empty = ArchetypeSignature::new();
        index.archetypes.push(Archetype::new(
            EMPTY_ARCHETYPE,
            empty.clone(),
            std::iter::empty(),
            row_reserve,
        ));
        index.by_signature.insert(empty, EMPTY_ARCHETYPE);
        index
    }

    /// Look up an archetype by canonical signature without creating it
    pub fn lookup(&self, signature: &ArchetypeSignature) -> Option<ArchetypeId> {
        self.by_signature.get(signature).copied()
    }

    /// Resolve a canonical (sorted, duplicate-free) signature to its id,
    /// creating the archetype and its empty columns on first sight.
    pub fn get_or_create(
        &mut self,
        signature: &ArchetypeSignature,
        registry: &ComponentRegistry,
    ) -> Result<ArchetypeId> {
        if let Some(id) = self.lookup(signature) {
            return Ok(id);
        }
        debug_assert!(
            signature.windows(2).all(|pair| pair[0] < pair[1]),
            "BUG: signature {signature:?} is not canonical"
        );

        let infos = signature
            .iter()
            .map(|&component| {
                registry.info(component).copied().ok_or_else(|| {
                    EcsError::LayoutViolation(format!("component {component} is not registered"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let id = self.archetypes.len();
        self.archetypes.push(Archetype::new(
            id,
            signature.clone(),
            infos.iter(),
            self.row_reserve,
        ));
        self.by_signature.insert(signature.clone(), id);

        for &component in signature {
            let slot = component.index();
            if slot >= self.by_component.len() {
                self.by_component.resize_with(slot + 1, Vec::new);
            }
            self.by_component[slot].push(id);
        }

        #[cfg(feature = "profiling")]
        tracing::debug!(
            archetype = id,
            components = signature.len(),
            total = self.archetypes.len(),
            "created archetype"
        );

        Ok(id)
    }

    /// Ids of every archetype whose signature is a superset of `required`.
    ///
    /// Intersects the per-component archetype lists, starting from the
    /// shortest, so the cost follows the number of candidate archetypes
    /// rather than the total. Empty `required` matches nothing.
    pub fn matching(&self, required: &[ComponentId]) -> Vec<ArchetypeId> {
        let mut lists = Vec::with_capacity(required.len());
        for component in required {
            match self.by_component.get(component.index()) {
                Some(list) if !list.is_empty() => lists.push(list.as_slice()),
                _ => return Vec::new(),
            }
        }
        let Some((shortest_at, shortest)) = lists
            .iter()
            .enumerate()
            .min_by_key(|(_, list)| list.len())
            .map(|(at, list)| (at, *list))
        else {
            return Vec::new();
        };

        shortest
            .iter()
            .copied()
            .filter(|id| {
                lists
                    .iter()
                    .enumerate()
                    .all(|(at, list)| at == shortest_at || list.binary_search(id).is_ok())
            })
            .collect()
    }

    /// Component ids of an archetype (reverse mapping)
    pub fn signature_of(&self, id: ArchetypeId) -> Option<&ArchetypeSignature> {
        self.archetypes.get(id).map(Archetype::signature)
    }

    pub fn get(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id)
    }

    pub fn get_mut(&mut self, id: ArchetypeId) -> Option<&mut Archetype> {
        self.archetypes.get_mut(id)
    }

    /// Archetype 0; created in `new` and never removed
    pub(crate) fn empty_mut(&mut self) -> &mut Archetype {
        &mut self.archetypes[EMPTY_ARCHETYPE]
    }

    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    /// Number of archetypes, including the empty one
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Two distinct archetypes mutably at once
    pub(crate) fn pair_mut(
        &mut self,
        a: ArchetypeId,
        b: ArchetypeId,
    ) -> Option<(&mut Archetype, &mut Archetype)> {
        if a == b || a >= self.archetypes.len() || b >= self.archetypes.len() {
            return None;
        }
        if a < b {
            let (left, right) = self.archetypes.split_at_mut(b);
            Some((&mut left[a], &mut right[0]))
        } else {
            let (left, right) = self.archetypes.split_at_mut(a);
            Some((&mut right[0], &mut left[b]))
        }
    }

    /// Mutable references to the archetypes named by `ids`.
    ///
    /// `ids` must be strictly ascending; walking the storage with
    /// `split_at_mut` keeps this linear in `ids.len()`.
    pub(crate) fn many_mut(&mut self, ids: &[ArchetypeId]) -> Vec<&mut Archetype> {
        debug_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        let mut out = Vec::with_capacity(ids.len());
        let mut rest: &mut [Archetype] = &mut self.archetypes;
        let mut offset = 0;
        for &id in ids {
            let Some(skip) = id.checked_sub(offset) else {
                break;
            };
            if skip >= rest.len() {
                break;
            }
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(skip);
            let Some((archetype, tail)) = tail.split_first_mut() else {
                break;
            };
            out.push(archetype);
            rest = tail;
            offset = id + 1;
        }
        out
    }
}

impl std::fmt::Debug for ArchetypeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchetypeIndex")
            .field("archetypes", &self.archetypes.len())
            .field("component_lists", &self.by_component.len())
            .finish()
    }
}

//! The element record store: arena + free list + id table + level
//! sampler, combined into one allocator keyed by [`ElementId`].
//!
//! Grounded on `ElementManager.h`/`Elements.cpp`'s combination of
//! `Elements` (the byte arena) with the allocate/free entry points that
//! `Index::Insert` calls through. Rust's ownership rules make a single
//! owner for "the bytes" and "the free list that points into them" the
//! natural split, so this module holds both rather than mirroring the
//! source's separate `ElementManager` indirection layer.

use crate::arena::Arena;
use crate::element_id::{ElementId, NO_ELEMENT};
use crate::error::Error;
use crate::free_list::FreeList;
use crate::layout::{HEADER_BYTES, LayerLayout, LINK_BYTES, build_layer_layouts};
use crate::params::IndexParams;
use crate::rng::LevelSampler;

const EXTERNAL_ID_OFFSET: usize = 0;
const LEVEL_OFFSET: usize = 4;

/// One allocated element's record, addressed by its arena offset.
#[derive(Debug, Clone, Copy)]
struct Slot {
    offset: usize,
    level: usize,
}

/// Free function so callers can build a `locate` closure that captures
/// only `slots`, not all of `self` — keeping it disjoint from whatever
/// other field a caller also needs to borrow mutably alongside it.
fn locate_in(slots: &[Option<Slot>], id: ElementId) -> Option<usize> {
    slots
        .get(id.index().checked_sub(1)?)
        .copied()
        .flatten()
        .map(|slot| slot.offset)
}

pub struct ElementStore {
    params: IndexParams,
    layouts: Vec<LayerLayout>,
    arena: Arena,
    free_list: FreeList,
    /// `id.index() - 1` -> record location, or `None` once freed and
    /// popped back off the free list permanently (never re-used without
    /// a corresponding `alloc`, so lookups can't go stale silently).
    slots: Vec<Option<Slot>>,
    sampler: LevelSampler,
    live_count: usize,
}

impl ElementStore {
    pub fn new(params: IndexParams, block_size: usize) -> Result<Self, Error> {
        params.validate().map_err(|_| Error::OutOfMemory)?;
        let layouts = build_layer_layouts(&params, block_size);
        let arena = Arena::new(&layouts, block_size)?;
        Ok(Self {
            free_list: FreeList::new(layouts.len()),
            slots: Vec::with_capacity(params.max_elements as usize),
            sampler: LevelSampler::new(),
            layouts,
            arena,
            params,
            live_count: 0,
        })
    }

    pub fn layouts(&self) -> &[LayerLayout] {
        &self.layouts
    }

    pub fn sample_level(&mut self) -> usize {
        self.sampler.sample_level(&self.layouts)
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Allocate a record for `external_id` sampled to `level`, reusing a
    /// free-list slot at that level before bump-allocating a fresh one,
    /// per `Elements::AllocateNextElement`.
    pub fn alloc(&mut self, external_id: u32, level: usize, payload: &[f32]) -> Result<ElementId, Error> {
        debug_assert_eq!(payload.len(), self.params.dimension as usize);

        let slots = &self.slots;
        let (id, offset) = if let Some((id, offset)) =
            self.free_list
                .pop_from_layer(&mut self.arena, level, |id| locate_in(slots, id))
        {
            (id, offset)
        } else {
            let record_size = self.layouts[level].bytes_per_element;
            let offset = self
                .arena
                .alloc_record(level, record_size)
                .ok_or(Error::OutOfMemory)?;
            self.slots.push(None);
            (ElementId(self.slots.len() as u32), offset)
        };

        let data_offset = offset + HEADER_BYTES;
        let data_bytes = payload.len() * 4;
        let record_size = self.layouts[level].bytes_per_element;
        let links_bytes = record_size - HEADER_BYTES - data_bytes;
        self.arena.write_u32(offset + EXTERNAL_ID_OFFSET, external_id);
        self.arena.write_u32(offset + LEVEL_OFFSET, level as u32);
        self.arena.write_f32_slice(data_offset, payload);
        self.arena.zero_range(data_offset + data_bytes, links_bytes);

        let slot_index = id.index() - 1;
        self.slots[slot_index] = Some(Slot { offset, level });
        self.live_count += 1;
        Ok(id)
    }

    pub fn free(&mut self, id: ElementId) -> Result<(), Error> {
        let slot = self.slots.get(id.index().checked_sub(1).ok_or(Error::InvalidId(id))?)
            .copied()
            .flatten()
            .ok_or(Error::InvalidId(id))?;
        let slots = &self.slots;
        self.free_list.insert(&mut self.arena, slot.offset, id, slot.level, |id| {
            locate_in(slots, id)
        });
        self.slots[id.index() - 1] = None;
        self.live_count -= 1;
        Ok(())
    }

    fn slot(&self, id: ElementId) -> Result<Slot, Error> {
        if id.is_none() {
            return Err(Error::InvalidId(id));
        }
        self.slots
            .get(id.index() - 1)
            .copied()
            .flatten()
            .ok_or(Error::InvalidId(id))
    }

    pub fn level_of(&self, id: ElementId) -> Result<usize, Error> {
        Ok(self.slot(id)?.level)
    }

    pub fn external_id_of(&self, id: ElementId) -> Result<u32, Error> {
        let slot = self.slot(id)?;
        Ok(self.arena.read_u32(slot.offset + EXTERNAL_ID_OFFSET))
    }

    pub fn payload_of(&self, id: ElementId) -> Result<Vec<f32>, Error> {
        let slot = self.slot(id)?;
        Ok(self
            .arena
            .read_f32_slice(slot.offset + HEADER_BYTES, self.params.dimension as usize))
    }

    /// The neighbor array for `id` at `layer`, which is only valid when
    /// `layer <= id`'s own level.
    pub fn neighbors(&self, id: ElementId, layer: usize) -> Result<Vec<ElementId>, Error> {
        let slot = self.slot(id)?;
        if layer > slot.level {
            return Err(Error::InvalidId(id));
        }
        let layout = &self.layouts[layer];
        let base = slot.offset + layout.links_offset;
        let mut neighbors = Vec::with_capacity(layout.max_neighbors);
        for i in 0..layout.max_neighbors {
            let raw = self.arena.read_u32(base + i * LINK_BYTES);
            if raw != NO_ELEMENT.0 {
                neighbors.push(ElementId(raw));
            }
        }
        Ok(neighbors)
    }

    pub fn set_neighbors(
        &mut self,
        id: ElementId,
        layer: usize,
        neighbors: &[ElementId],
    ) -> Result<(), Error> {
        let slot = self.slot(id)?;
        if layer > slot.level {
            return Err(Error::InvalidId(id));
        }
        let layout = &self.layouts[layer];
        debug_assert!(neighbors.len() <= layout.max_neighbors);
        let base = slot.offset + layout.links_offset;
        for i in 0..layout.max_neighbors {
            let value = neighbors.get(i).copied().unwrap_or(NO_ELEMENT);
            self.arena.write_u32(base + i * LINK_BYTES, value.0);
        }
        Ok(())
    }

    pub fn params(&self) -> &IndexParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ElementStore {
        let params = IndexParams::new(4, 1000, 8);
        ElementStore::new(params, 4096).unwrap()
    }

    #[test]
    fn alloc_then_read_payload_round_trips() {
        let mut store = store();
        let id = store.alloc(10, 0, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(store.payload_of(id).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(store.external_id_of(id).unwrap(), 10);
        assert_eq!(store.level_of(id).unwrap(), 0);
    }

    #[test]
    fn fresh_record_has_no_neighbors() {
        let mut store = store();
        let id = store.alloc(1, 0, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(store.neighbors(id, 0).unwrap().is_empty());
    }

    #[test]
    fn set_then_get_neighbors_round_trips() {
        let mut store = store();
        let a = store.alloc(1, 1, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        let b = store.alloc(2, 1, &[1.0, 1.0, 1.0, 1.0]).unwrap();
        store.set_neighbors(a, 0, &[b]).unwrap();
        assert_eq!(store.neighbors(a, 0).unwrap(), vec![b]);
    }

    #[test]
    fn freeing_then_reallocating_reuses_the_slot() {
        let mut store = store();
        let a = store.alloc(1, 0, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        store.free(a).unwrap();
        assert_eq!(store.live_count(), 0);
        let b = store.alloc(2, 0, &[9.0, 9.0, 9.0, 9.0]).unwrap();
        assert_eq!(store.payload_of(b).unwrap(), vec![9.0, 9.0, 9.0, 9.0]);
    }

    #[test]
    fn accessing_a_freed_id_is_an_error() {
        let mut store = store();
        let a = store.alloc(1, 0, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        store.free(a).unwrap();
        assert!(store.payload_of(a).is_err());
    }

    #[test]
    fn neighbors_at_a_layer_above_own_level_errors() {
        let mut store = store();
        let a = store.alloc(1, 0, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(store.neighbors(a, 1).is_err());
    }
}

//! Doubly-linked free list overlaid on freed element records.
//!
//! Grounded on `Elements.h`'s `DeleteListNode` and `Elements.cpp`'s
//! `FreeElement`: a freed record's bytes are reinterpreted in place as
//! `{DeletedElementId, DeletedElementLevel, NextDeletedElementId,
//! PrevDeletedElementId}` rather than returning the backing bytes to the
//! allocator. The list threads through every layer's free nodes in a
//! single global order, while `layer_heads`/`layer_tails` let
//! [`crate::element_store::ElementStore`] find the nearest reusable slot
//! for a given layer in O(1).
//!
//! Every method here takes a `locate` closure mapping an already-known
//! id to the byte offset of its record; `FreeList` itself only ever
//! stores ids, never offsets, so the id-to-offset table stays owned by
//! `ElementStore`.

use crate::arena::Arena;
use crate::element_id::{ElementId, NO_ELEMENT};

const ID_OFFSET: usize = 0;
const LEVEL_OFFSET: usize = 4;
const NEXT_OFFSET: usize = 8;
const PREV_OFFSET: usize = 12;

/// Bytes needed to overlay a `FreeNode` on a freed record. Every record
/// is at least `HEADER_BYTES` (8) plus one link array, so this always
/// fits within the smallest possible record.
pub const FREE_NODE_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeNode {
    id: ElementId,
    level: usize,
    next: ElementId,
    prev: ElementId,
}

impl FreeNode {
    fn read(arena: &Arena, offset: usize) -> Self {
        Self {
            id: ElementId(arena.read_u32(offset + ID_OFFSET)),
            level: arena.read_u32(offset + LEVEL_OFFSET) as usize,
            next: ElementId(arena.read_u32(offset + NEXT_OFFSET)),
            prev: ElementId(arena.read_u32(offset + PREV_OFFSET)),
        }
    }

    fn write(self, arena: &mut Arena, offset: usize) {
        arena.write_u32(offset + ID_OFFSET, self.id.0);
        arena.write_u32(offset + LEVEL_OFFSET, self.level as u32);
        arena.write_u32(offset + NEXT_OFFSET, self.next.0);
        arena.write_u32(offset + PREV_OFFSET, self.prev.0);
    }
}

/// Global free list plus per-layer head/tail bookkeeping, per §4.2.
#[derive(Debug)]
pub struct FreeList {
    global_head: ElementId,
    layer_heads: Vec<ElementId>,
    layer_tails: Vec<ElementId>,
}

impl FreeList {
    pub fn new(layer_count: usize) -> Self {
        Self {
            global_head: NO_ELEMENT,
            layer_heads: vec![NO_ELEMENT; layer_count],
            layer_tails: vec![NO_ELEMENT; layer_count],
        }
    }

    pub fn head_of_layer(&self, level: usize) -> ElementId {
        self.layer_heads[level]
    }

    /// Insert `id` (whose record lives at `offset` and was sampled to
    /// `level`) into the free list. When the layer already has free nodes,
    /// `id` takes the layer head's place (LIFO reuse within a layer): its
    /// `next` is the old head, its `prev` is whatever the old head's `prev`
    /// was. When the layer is empty, `id` starts a new group slotted in at
    /// the boundary between the nearest lower layer's group (or the global
    /// head) and the nearest higher layer's tail.
    pub fn insert(
        &mut self,
        arena: &mut Arena,
        offset: usize,
        id: ElementId,
        level: usize,
        locate: impl Fn(ElementId) -> Option<usize>,
    ) {
        let layer_was_empty = self.layer_heads[level].is_none();

        let (next, prev) = if layer_was_empty {
            let next = self.layer_heads[..level]
                .iter()
                .rev()
                .copied()
                .find(|id| id.is_some())
                .unwrap_or(self.global_head);
            let prev = self.layer_tails[level + 1..]
                .iter()
                .copied()
                .find(|id| id.is_some())
                .unwrap_or(NO_ELEMENT);
            (next, prev)
        } else {
            let old_head = self.layer_heads[level];
            let prev = locate(old_head)
                .map(|offset| FreeNode::read(arena, offset).prev)
                .unwrap_or(NO_ELEMENT);
            (old_head, prev)
        };

        FreeNode {
            id,
            level,
            next,
            prev,
        }
        .write(arena, offset);

        if let Some(prev_offset) = prev.is_some().then(|| locate(prev)).flatten() {
            let mut prev_node = FreeNode::read(arena, prev_offset);
            prev_node.next = id;
            prev_node.write(arena, prev_offset);
        } else {
            self.global_head = id;
        }

        if let Some(next_offset) = next.is_some().then(|| locate(next)).flatten() {
            let mut next_node = FreeNode::read(arena, next_offset);
            next_node.prev = id;
            next_node.write(arena, next_offset);
        }

        self.layer_heads[level] = id;
        if layer_was_empty {
            self.layer_tails[level] = id;
        }
    }

    /// Pop the most recently freed element at `level`, if any, returning
    /// its id and the byte offset its record still occupies.
    pub fn pop_from_layer(
        &mut self,
        arena: &mut Arena,
        level: usize,
        locate: impl Fn(ElementId) -> Option<usize>,
    ) -> Option<(ElementId, usize)> {
        let head = self.layer_heads[level];
        if head.is_none() {
            return None;
        }
        let head_offset = locate(head)?;
        let node = FreeNode::read(arena, head_offset);
        debug_assert_eq!(node.level, level);

        if let Some(prev_offset) = node.prev.is_some().then(|| locate(node.prev)).flatten() {
            let mut prev_node = FreeNode::read(arena, prev_offset);
            prev_node.next = node.next;
            prev_node.write(arena, prev_offset);
        } else {
            self.global_head = node.next;
        }
        if let Some(next_offset) = node.next.is_some().then(|| locate(node.next)).flatten() {
            let mut next_node = FreeNode::read(arena, next_offset);
            next_node.prev = node.prev;
            next_node.write(arena, next_offset);
        }

        let next_is_same_layer = node.next.is_some()
            && locate(node.next)
                .map(|offset| FreeNode::read(arena, offset).level == level)
                .unwrap_or(false);
        self.layer_heads[level] = if next_is_same_layer {
            node.next
        } else {
            NO_ELEMENT
        };
        if self.layer_tails[level] == head {
            self.layer_tails[level] = self.layer_heads[level];
        }

        Some((head, head_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tiny_arena() -> Arena {
        let params = crate::params::IndexParams::new(2, 64, 4);
        let layouts = crate::layout::build_layer_layouts(&params, 256);
        Arena::new(&layouts, 256).unwrap()
    }

    #[test]
    fn insert_then_pop_round_trips_a_single_node() {
        let mut arena = tiny_arena();
        let mut free_list = FreeList::new(3);
        let offsets: HashMap<ElementId, usize> = HashMap::from([(ElementId(1), 128)]);

        free_list.insert(&mut arena, 128, ElementId(1), 0, |id| offsets.get(&id).copied());
        assert_eq!(free_list.head_of_layer(0), ElementId(1));

        let (popped, offset) =
            free_list.pop_from_layer(&mut arena, 0, |id| offsets.get(&id).copied()).unwrap();
        assert_eq!(popped, ElementId(1));
        assert_eq!(offset, 128);
        assert!(free_list.head_of_layer(0).is_none());
    }

    #[test]
    fn pop_on_empty_layer_returns_none() {
        let mut arena = tiny_arena();
        let mut free_list = FreeList::new(3);
        assert!(free_list.pop_from_layer(&mut arena, 1, |_| None).is_none());
    }

    #[test]
    fn two_nodes_on_same_layer_pop_in_lifo_order() {
        let mut arena = tiny_arena();
        let mut free_list = FreeList::new(3);
        let mut offsets: HashMap<ElementId, usize> = HashMap::new();
        offsets.insert(ElementId(1), 64);
        offsets.insert(ElementId(2), 128);

        free_list.insert(&mut arena, 64, ElementId(1), 0, |id| offsets.get(&id).copied());
        free_list.insert(&mut arena, 128, ElementId(2), 0, |id| offsets.get(&id).copied());

        let (first, _) = free_list
            .pop_from_layer(&mut arena, 0, |id| offsets.get(&id).copied())
            .unwrap();
        assert_eq!(first, ElementId(2));
        let (second, _) = free_list
            .pop_from_layer(&mut arena, 0, |id| offsets.get(&id).copied())
            .unwrap();
        assert_eq!(second, ElementId(1));
    }
}

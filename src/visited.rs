//! A visited-set keyed by [`ElementId`].
//!
//! Grounded on `hnsw/mod.rs`'s `PassThroughHasher`: ids are already
//! small dense integers handed out by the arena, so hashing them through
//! SipHash (the `HashSet` default) buys nothing but cycles. A
//! pass-through hasher treats the id itself as its own hash.

use std::collections::HashSet;
use std::hash::{BuildHasherDefault, Hasher};

use crate::element_id::ElementId;

#[derive(Default)]
pub struct PassThroughHasher(u64);

impl Hasher for PassThroughHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, _bytes: &[u8]) {
        unreachable!("PassThroughHasher only ever hashes a u32 via write_u32")
    }

    fn write_u32(&mut self, id: u32) {
        self.0 = id as u64;
    }
}

pub type VisitedSet = HashSet<ElementId, BuildHasherDefault<PassThroughHasher>>;

impl std::hash::Hash for ElementId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visited_set_tracks_membership() {
        let mut visited: VisitedSet = VisitedSet::default();
        visited.insert(ElementId(7));
        assert!(visited.contains(&ElementId(7)));
        assert!(!visited.contains(&ElementId(8)));
    }
}

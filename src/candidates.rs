//! Priority queues over `(id, distance)` candidates.
//!
//! Grounded on `Index::Candidate`/`Index::CandidateQueue` in
//! `examples/original_source/src/Index.h`: the source builds both a
//! nearest-first and a furthest-first view over the *same* candidate
//! data by swapping the comparator on an otherwise identical
//! `std::priority_queue`. `BinaryHeap` can't be re-compared after the
//! fact, so this module keeps the two orderings as distinct newtypes
//! sharing one `Candidate` payload, and [`FurthestFirstQueue::into_sorted_nearest_first`]
//! is the direct translation of "rebuild a `CandidateQueue` from an
//! existing container with the other comparator" (§4.4).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::element_id::ElementId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: ElementId,
    pub distance: f32,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    /// Total order by distance, `NaN` sorted as greater than everything
    /// (a distance function is never expected to produce one, but a heap
    /// must never panic comparing).
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Max-heap ordered so the *nearest* candidate is always on top — the
/// min-heap of the search loop's frontier.
#[derive(Debug, Default)]
pub struct NearestFirstQueue {
    heap: BinaryHeap<std::cmp::Reverse<Candidate>>,
}

impl NearestFirstQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.heap.push(std::cmp::Reverse(candidate));
    }

    pub fn pop(&mut self) -> Option<Candidate> {
        self.heap.pop().map(|std::cmp::Reverse(c)| c)
    }

    pub fn peek(&self) -> Option<&Candidate> {
        self.heap.peek().map(|std::cmp::Reverse(c)| c)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Max-heap ordered so the *furthest* candidate is always on top — used
/// to hold the running `ef`-bounded result set, so the element to evict
/// when a nearer one arrives is always a single `peek`/`pop` away.
#[derive(Debug, Default)]
pub struct FurthestFirstQueue {
    heap: BinaryHeap<Candidate>,
}

impl FurthestFirstQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.heap.push(candidate);
    }

    pub fn pop(&mut self) -> Option<Candidate> {
        self.heap.pop()
    }

    pub fn peek(&self) -> Option<&Candidate> {
        self.heap.peek()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.heap.into_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.heap.iter()
    }

    /// Rebuild a nearest-first view over the same candidates, per
    /// `Index::CandidateQueue`'s two-constructors-one-container pattern.
    pub fn into_sorted_nearest_first(self) -> Vec<Candidate> {
        self.heap.into_sorted_vec()
    }
}

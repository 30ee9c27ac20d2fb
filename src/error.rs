use thiserror::Error;

use crate::ElementId;

/// Errors produced by the arena allocator, the graph builder, and the
/// public [`crate::Index`] facade.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum Error {
    /// Backing allocation failed at `create` time, or every arena block is
    /// in use and no free-list slot of the needed size is available.
    #[error("arena exhausted: no block or reusable slot available")]
    OutOfMemory,

    /// `alloc` returned `NoElement`; surfaced to callers of `insert`.
    #[error("insert failed: element store returned no element")]
    InsertFailure,

    /// An accessor was called with `NoElement` or with an id that was
    /// never allocated (or has since been freed).
    #[error("invalid element id {0:?}")]
    InvalidId(ElementId),

    /// The injected distance function's contract requires both vectors to
    /// have length `Dimension`.
    #[error("dimension mismatch: index is {expected}-dimensional, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Internal invariant: a priority queue expected to be non-empty was
    /// popped while empty. Indicates a bug in the search/selection code,
    /// never a user-triggerable condition.
    #[error("internal queue was unexpectedly empty")]
    EmptyQueue,
}

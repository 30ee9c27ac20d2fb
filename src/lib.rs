//! Arena-backed Hierarchical Navigable Small World (HNSW) index.
//!
//! Vectors are inserted into a multi-layer proximity graph; each layer's
//! element records (header, payload, neighbor links) are packed into one
//! contiguous byte arena per [`ElementStore`], with freed records reused
//! via an in-place free list rather than returned to a general-purpose
//! allocator. See [`Index`] for the public surface.

pub mod arena;
pub mod candidates;
pub mod distance;
pub mod element_id;
pub mod element_store;
pub mod error;
pub mod free_list;
pub mod graph_builder;
pub mod index;
pub mod layout;
pub mod params;
pub mod rng;
pub mod visited;

pub use distance::DistanceFn;
pub use element_id::ElementId;
pub use error::Error;
pub use index::Index;
pub use params::IndexParams;

//! The public facade: `create`/`insert`/`free` and read accessors.
//!
//! Grounded on `Index::Index`/`Index::Insert` in
//! `examples/original_source/src/Index.h`, generalized over an injected
//! [`DistanceFn`] (the source takes a raw function pointer; this keeps
//! the same "caller supplies the metric" contract as a generic parameter
//! so it specializes to a concrete SIMD implementation at compile time).

use crate::distance::DistanceFn;
use crate::element_id::ElementId;
use crate::element_store::ElementStore;
use crate::error::Error;
use crate::graph_builder::GraphBuilder;
use crate::params::{DEFAULT_BLOCK_SIZE, IndexParams};

/// An in-memory HNSW index over fixed-dimension `f32` vectors.
///
/// `D` is the distance metric, injected once at `create` and reused for
/// every insert thereafter.
pub struct Index<D: DistanceFn> {
    store: ElementStore,
    builder: GraphBuilder,
    distance: D,
}

impl<D: DistanceFn> Index<D> {
    /// Allocate the arena, lookup table, and per-layer metadata for
    /// `params`, using `block_size` for arena bookkeeping.
    #[tracing::instrument(skip_all, fields(dimension = params.dimension, max_elements = params.max_elements))]
    pub fn create(params: IndexParams, distance: D, block_size: usize) -> Result<Self, Error> {
        let store = ElementStore::new(params, block_size)?;
        let builder = GraphBuilder::new(params.ef_construction);
        Ok(Self {
            store,
            builder,
            distance,
        })
    }

    /// `create` with the default arena block size.
    pub fn create_with_defaults(params: IndexParams, distance: D) -> Result<Self, Error> {
        Self::create(params, distance, DEFAULT_BLOCK_SIZE)
    }

    /// Insert `payload` under `external_id`, wiring it into every layer
    /// it samples to. Returns the new element's id.
    #[tracing::instrument(skip_all)]
    pub fn insert(&mut self, payload: &[f32], external_id: u32) -> Result<ElementId, Error> {
        if payload.len() != self.store.params().dimension as usize {
            return Err(Error::DimensionMismatch {
                expected: self.store.params().dimension as usize,
                found: payload.len(),
            });
        }
        self.builder
            .insert(&mut self.store, self.distance, payload, external_id)
    }

    /// Convert `id`'s record into a free-list node. Per §9 Open Question
    /// 3, freeing the current entrypoint leaves it dangling — callers
    /// that do this must insert again before the next search-dependent
    /// call.
    pub fn free(&mut self, id: ElementId) -> Result<(), Error> {
        self.builder.free(&mut self.store, id)
    }

    pub fn entrypoint(&self) -> ElementId {
        self.builder.entrypoint()
    }

    pub fn level_of(&self, id: ElementId) -> Result<u32, Error> {
        Ok(self.store.level_of(id)? as u32)
    }

    pub fn payload_of(&self, id: ElementId) -> Result<Vec<f32>, Error> {
        self.store.payload_of(id)
    }

    pub fn external_id_of(&self, id: ElementId) -> Result<u32, Error> {
        self.store.external_id_of(id)
    }

    pub fn neighbors(&self, id: ElementId, layer: u32) -> Result<Vec<ElementId>, Error> {
        self.store.neighbors(id, layer as usize)
    }

    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }

    pub fn params(&self) -> &IndexParams {
        self.store.params()
    }

    /// The per-layer byte layout and occupancy estimates computed at
    /// `create` time, for reporting tools.
    pub fn layer_stats(&self) -> &[crate::layout::LayerLayout] {
        self.store.layouts()
    }

    pub fn params_layout_count(&self) -> usize {
        self.store.layouts().len()
    }
}

//! Per-layer byte layout computed once from [`IndexParams`].
//!
//! Grounded on `Elements.cpp`'s `get_level_probabilities` and the
//! `bytes_per_element`/`links_offset` arithmetic in
//! `Elements::Create` (see `examples/original_source/src/Elements.cpp`).

use crate::params::IndexParams;

/// Header is `{external_id: u32, level: u32}`.
pub const HEADER_BYTES: usize = 8;
/// A `Link` is `{outgoing: u32, incoming_next: u32}`.
pub const LINK_BYTES: usize = 8;
/// Probabilities below this cutoff terminate the layer count.
const PROBABILITY_CUTOFF: f64 = 1e-12;

/// Byte layout and allocation bookkeeping constants for one layer index.
///
/// A `LayerLayout` plays two roles inherited from the source design: it is
/// both the bucket that elements sampled to *this* level are allocated
/// from (`bytes_per_element`, `estimated_*`), and the fixed-offset
/// descriptor used to reach the neighbor array for *this* layer index
/// inside any record whose own level is `>= self.level` (`links_offset`,
/// `max_neighbors`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerLayout {
    pub level: usize,
    pub probability: f64,
    /// `max_neighbors(0) = M0`, `max_neighbors(l>0) = M`.
    pub max_neighbors: usize,
    /// Offset from the start of a record to this layer's neighbor array.
    /// Independent of the owning element's own level.
    pub links_offset: usize,
    /// Size in bytes of a record whose own sampled level equals `self.level`.
    pub bytes_per_element: usize,
    pub estimated_elements: usize,
    pub estimated_total_bytes: usize,
    pub estimated_total_blocks: usize,
}

/// Compute the truncated geometric layer probabilities: `p(l) =
/// e^(-l/mL) * (1 - e^(-1/mL))`, `mL = 1/ln(M)`, stopping once `p(l) <
/// 1e-12`.
pub fn layer_probabilities(m: u32) -> Vec<f64> {
    let m_l = 1.0 / (m as f64).ln();
    let mut probabilities = Vec::new();
    for level in 0.. {
        let p = (-(level as f64) / m_l).exp() * (1.0 - (-1.0 / m_l).exp());
        if p < PROBABILITY_CUTOFF {
            break;
        }
        probabilities.push(p);
    }
    probabilities
}

/// Build the full per-layer layout table for `params`, given the arena
/// block size used to estimate block counts.
pub fn build_layer_layouts(params: &IndexParams, block_size: usize) -> Vec<LayerLayout> {
    let probabilities = layer_probabilities(params.m);
    let data_bytes = params.dimension as usize * 4;
    let links_zero = params.m0 as usize * LINK_BYTES;
    let links_non_zero = params.m as usize * LINK_BYTES;

    let mut layouts = Vec::with_capacity(probabilities.len());
    for (level, &p) in probabilities.iter().enumerate() {
        let total_links_bytes = links_zero + level * links_non_zero;
        let bytes_per_element = HEADER_BYTES + data_bytes + total_links_bytes;
        let estimated_elements = (p * params.max_elements as f64) as usize;
        let estimated_total_bytes = estimated_elements * bytes_per_element;
        let estimated_total_blocks = if estimated_total_bytes == 0 {
            0
        } else {
            estimated_total_bytes.div_ceil(block_size)
        };
        let links_offset_before = if level == 0 {
            0
        } else {
            links_zero + (level - 1) * links_non_zero
        };
        let links_offset = HEADER_BYTES + data_bytes + links_offset_before;
        let max_neighbors = if level == 0 {
            params.m0 as usize
        } else {
            params.m as usize
        };

        layouts.push(LayerLayout {
            level,
            probability: p,
            max_neighbors,
            links_offset,
            bytes_per_element,
            estimated_elements,
            estimated_total_bytes,
            estimated_total_blocks,
        });
    }
    layouts
}

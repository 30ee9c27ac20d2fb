//! A single contiguous byte buffer handing out fixed-size records per
//! layer, bump-pointer style.
//!
//! Grounded on `Elements::Create`/`Elements::AllocateNextElement` in
//! `examples/original_source/src/Elements.cpp`: each layer's slab is
//! carved from the high end of one shared allocation downward, with 25%
//! headroom reserved as a shared pool of spare blocks. This crate keeps
//! the byte-blob design (per the REDESIGN GUIDANCE's second option)
//! behind checked accessor methods rather than raw pointer casts.

use crate::Error;
use crate::layout::LayerLayout;

struct LayerCursor {
    /// Next write offset within the layer's current block.
    cursor: usize,
    /// Bytes remaining in the current block before a fresh one is needed.
    free_bytes: usize,
}

/// One contiguous arena of `⌈1.25 · Σ estimated_blocks⌉ · block_size`
/// bytes, bump-allocating fixed-size records per layer.
pub struct Arena {
    bytes: Vec<u8>,
    block_size: usize,
    /// Blocks not yet claimed by any layer, counted from the low-address
    /// end: claiming a block decrements this and returns the offset
    /// `free_blocks * block_size`, so consumption proceeds from high
    /// addresses toward low ones exactly as in the source.
    free_blocks: usize,
    cursors: Vec<LayerCursor>,
}

impl Arena {
    pub fn new(layouts: &[LayerLayout], block_size: usize) -> Result<Self, Error> {
        let total_estimated_blocks: usize =
            layouts.iter().map(|l| l.estimated_total_blocks).sum();
        let n_blocks = ((total_estimated_blocks as f64) * 1.25).ceil() as usize;
        let n_blocks = n_blocks.max(1);

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(n_blocks * block_size)
            .map_err(|_| Error::OutOfMemory)?;
        bytes.resize(n_blocks * block_size, 0);

        let mut free_blocks = n_blocks;
        let mut cursors = Vec::with_capacity(layouts.len());
        for layout in layouts {
            free_blocks = free_blocks.saturating_sub(layout.estimated_total_blocks);
            cursors.push(LayerCursor {
                cursor: free_blocks * block_size,
                free_bytes: layout.estimated_total_blocks * block_size,
            });
        }

        Ok(Self {
            bytes,
            block_size,
            free_blocks,
            cursors,
        })
    }

    /// Bump-allocate `record_size` bytes from `layer_idx`'s slab, claiming
    /// a fresh block from the shared pool on exhaustion. Returns the byte
    /// offset of the new record, or `None` if no block remains.
    pub fn alloc_record(&mut self, layer_idx: usize, record_size: usize) -> Option<usize> {
        let block_size = self.block_size;
        let free_blocks = &mut self.free_blocks;
        let state = &mut self.cursors[layer_idx];

        if state.free_bytes < record_size {
            if *free_blocks == 0 {
                return None;
            }
            *free_blocks -= 1;
            state.cursor = *free_blocks * block_size;
            state.free_bytes = block_size;
        }

        let offset = state.cursor;
        state.cursor += record_size;
        state.free_bytes -= record_size;
        Some(offset)
    }

    #[inline]
    pub fn read_u32(&self, offset: usize) -> u32 {
        u32::from_ne_bytes(self.bytes[offset..offset + 4].try_into().unwrap())
    }

    #[inline]
    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
    }

    #[inline]
    pub fn read_f32(&self, offset: usize) -> f32 {
        f32::from_ne_bytes(self.bytes[offset..offset + 4].try_into().unwrap())
    }

    #[inline]
    pub fn write_f32(&mut self, offset: usize, value: f32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
    }

    /// Reads `len` packed `f32`s starting at `offset`. Element-wise
    /// rather than a reinterpret cast: the arena gives no alignment
    /// guarantee at arbitrary record offsets, so a pointer cast here
    /// would be unsound.
    pub fn read_f32_slice(&self, offset: usize, len: usize) -> Vec<f32> {
        (0..len).map(|i| self.read_f32(offset + i * 4)).collect()
    }

    pub fn write_f32_slice(&mut self, offset: usize, values: &[f32]) {
        for (i, &v) in values.iter().enumerate() {
            self.write_f32(offset + i * 4, v);
        }
    }

    pub fn zero_range(&mut self, offset: usize, len: usize) {
        self.bytes[offset..offset + len].fill(0);
    }
}

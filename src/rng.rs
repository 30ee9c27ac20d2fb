//! Deterministic level sampling.
//!
//! Grounded on `Elements::Elements`'s `rnd_(1337)` and
//! `select_next_random_layer` in `examples/original_source/src/Elements.cpp`:
//! every index seeds its own Mersenne Twister with the literal constant
//! `1337` rather than drawing from host entropy, so that two indices
//! built from the same inserts produce the same graph. `rand_mt` is the
//! one crate in this tree the teacher doesn't already depend on — no
//! corpus crate implements MT19937, and the source's seed is part of the
//! observable behavior this index reproduces, not an implementation
//! detail free to change.

use rand_core::RngCore;
use rand_mt::Mt19937GenRand32;

use crate::layout::LayerLayout;

const SEED: u32 = 1337;

/// Samples an insertion level from the layer probability table, the way
/// `select_next_random_layer` does: draw a uniform `[0, 1)` float, walk
/// the probability table subtracting each layer's mass until the
/// remainder goes negative, falling back to the last layer if the walk
/// runs out (floating-point truncation can make the probabilities sum to
/// just under 1).
pub struct LevelSampler {
    rng: Mt19937GenRand32,
}

impl LevelSampler {
    pub fn new() -> Self {
        Self {
            rng: Mt19937GenRand32::new(SEED),
        }
    }

    pub fn sample_level(&mut self, layouts: &[LayerLayout]) -> usize {
        let draw = (self.rng.next_u32() as f64) / (u32::MAX as f64 + 1.0);
        let mut remainder = draw;
        for layout in layouts {
            if remainder < layout.probability {
                return layout.level;
            }
            remainder -= layout.probability;
        }
        layouts.len().saturating_sub(1)
    }
}

impl Default for LevelSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Default beam width used during insertion (`efConstruction`).
///
/// Hard-coded to 200 in the source this design is grounded on; exposed here
/// as a configurable field instead, per §4.5's note that it "is a parameter
/// of the design".
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default arena block size in bytes, used when a caller doesn't override it
/// at `create` time.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Immutable configuration bundle for an [`crate::Index`].
///
/// Every field here is fixed for the life of the index: dimension can't
/// change after `create`, and `m`/`m0` determine the byte layout of every
/// element record (see [`crate::layout::LayerLayout`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexParams {
    /// Vector length `D`. Constant for the life of the index.
    pub dimension: u32,
    /// Upper bound on simultaneously live elements; sizes the lookup table.
    pub max_elements: u32,
    /// Target out-degree on layers `l > 0`.
    pub m: u32,
    /// Target out-degree on layer 0.
    pub m0: u32,
    /// Beam width used during insertion (`efConstruction`).
    pub ef_construction: usize,
}

impl IndexParams {
    /// Build params with `m0 = 2 * m` and the default `efConstruction`,
    /// matching the implicit default in the source this is grounded on.
    pub fn new(dimension: u32, max_elements: u32, m: u32) -> Self {
        Self {
            dimension,
            max_elements,
            m,
            m0: m * 2,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
        }
    }

    /// Override `m0` instead of taking the `2 * m` default.
    pub fn with_m0(mut self, m0: u32) -> Self {
        self.m0 = m0;
        self
    }

    /// Override `efConstruction`.
    pub fn with_ef_construction(mut self, ef_construction: usize) -> Self {
        self.ef_construction = ef_construction;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.m <= 1 {
            return Err("M must be > 1");
        }
        if self.m0 == 0 {
            return Err("M0 must be > 0");
        }
        if self.dimension == 0 {
            return Err("Dimension must be > 0");
        }
        if self.max_elements == 0 {
            return Err("MaxElems must be > 0");
        }
        Ok(())
    }
}

//! Kernel tunables

use crate::blocked::DEFAULT_BLOCK_WIDTH;
use crate::spmv_blocked::Strategy;
use tessera_core::{Result, SparseError};

/// Block width and accumulation strategy for the blocked kernel.
///
/// Larger widths give fewer, coarser blocks and cheaper construction;
/// smaller widths bound the `x` window tighter but scatter rows over more
/// blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    pub block_width: usize,
    pub strategy: Strategy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            block_width: DEFAULT_BLOCK_WIDTH,
            strategy: Strategy::Auto,
        }
    }
}

impl KernelConfig {
    #[must_use]
    pub fn with_block_width(mut self, cb: usize) -> Self {
        self.block_width = cb;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Reject a zero block width up front.
    pub fn validate(&self) -> Result<()> {
        if self.block_width == 0 {
            return Err(SparseError::InvalidParameter {
                name: "cb",
                value: 0,
                reason: "block width must be positive",
            });
        }
        Ok(())
    }
}

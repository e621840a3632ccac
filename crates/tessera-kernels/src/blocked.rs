//! Cache-blocked matrix builder
//
// Regroups CSR nonzeros by column block so one pass over a block reads only a
// `cb`-wide window of `x`. Built once per (matrix, cb) and reused across
// many products.

#![allow(
    clippy::many_single_char_names,
    reason = "Math kernels conventionally use i/j/k/p for indices"
)]
use crate::util::{i64_to_usize, usize_to_i64};
use log::debug;
use tessera_core::{nblocks_for, BlockedCsr, Csr, Result, SparseError};

/// Default block width in columns.
pub const DEFAULT_BLOCK_WIDTH: usize = 4096;

/// Reorganize `a` into column blocks of width `cb` (two-pass counting sort).
///
/// Every nonzero appears exactly once in the result. Inside a block, entries
/// follow the row-major scan order of `a`, but callers must not rely on it.
pub fn build_blocked(a: &Csr<f64, i64>, cb: usize) -> Result<BlockedCsr<f64, i64>> {
    if cb == 0 {
        return Err(SparseError::InvalidParameter {
            name: "cb",
            value: cb,
            reason: "block width must be positive",
        });
    }
    let nnz = a.nnz();
    let nblocks = nblocks_for(a.ncols, cb);

    // Pass 1: histogram of block sizes, prefix-summed in place
    let mut block_ptr = vec![0i64; nblocks + 1];
    for &j in &a.indices {
        block_ptr[i64_to_usize(j) / cb + 1] += 1;
    }
    for b in 0..nblocks {
        block_ptr[b + 1] += block_ptr[b];
    }

    // Pass 2: scatter in row order
    let mut row_indices = vec![0i64; nnz];
    let mut col_indices = vec![0i64; nnz];
    let mut data = vec![0.0f64; nnz];
    let mut current: Vec<usize> = block_ptr[..nblocks].iter().map(|&p| i64_to_usize(p)).collect();
    for i in 0..a.nrows {
        let r = a.row_range(i);
        for (&j, &v) in a.indices[r.clone()].iter().zip(&a.data[r]) {
            let b = i64_to_usize(j) / cb;
            let dst = current[b];
            current[b] += 1;
            row_indices[dst] = usize_to_i64(i);
            col_indices[dst] = j;
            data[dst] = v;
        }
    }

    debug!(
        "built column-blocked matrix: {}x{}, nnz={nnz}, cb={cb}, nblocks={nblocks}",
        a.nrows, a.ncols
    );
    BlockedCsr::from_parts(
        a.nrows,
        a.ncols,
        cb,
        block_ptr,
        row_indices,
        col_indices,
        data,
        false,
    )
}

/// Shape of a blocked layout: how full the blocks are and how many blocks
/// each row is spread across.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStats {
    pub nblocks: usize,
    pub empty_blocks: usize,
    pub max_block_nnz: usize,
    /// Mean number of distinct blocks per non-empty row
    pub mean_fan_in: f64,
    pub max_fan_in: usize,
}

/// Compute [`BlockStats`] for `b`. O(nnz + nrows).
#[must_use]
pub fn block_stats(b: &BlockedCsr<f64, i64>) -> BlockStats {
    let nblocks = b.nblocks();
    let mut empty_blocks = 0usize;
    let mut max_block_nnz = 0usize;
    // fan_in[i] counts distinct blocks for row i; last_seen dedups within a block
    let mut fan_in = vec![0usize; b.nrows];
    let mut last_seen = vec![usize::MAX; b.nrows];
    for blk in 0..nblocks {
        let view = b.block(blk);
        if view.is_empty() {
            empty_blocks += 1;
        }
        max_block_nnz = max_block_nnz.max(view.len());
        for &i in view.rows {
            let i = i64_to_usize(i);
            if last_seen[i] != blk {
                last_seen[i] = blk;
                fan_in[i] += 1;
            }
        }
    }
    let touched = fan_in.iter().filter(|&&f| f > 0).count();
    let total: usize = fan_in.iter().sum();
    #[allow(clippy::cast_precision_loss)]
    let mean_fan_in = if touched == 0 {
        0.0
    } else {
        total as f64 / touched as f64
    };
    BlockStats {
        nblocks,
        empty_blocks,
        max_block_nnz,
        mean_fan_in,
        max_fan_in: fan_in.into_iter().max().unwrap_or(0),
    }
}

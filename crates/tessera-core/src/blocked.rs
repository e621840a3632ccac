//! Column-blocked CSR definitions
//
// Nonzeros are grouped by column block (`col / cb`) instead of by row. Each
// block is a contiguous run of (row, col, value) triples stored as parallel
// arrays; order inside a block is unspecified.

use crate::error::{Result, SparseError};
use std::ops::Range;

/// Column-blocked layout of a sparse matrix.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct BlockedCsr<T, I> {
    pub nrows: usize,
    pub ncols: usize,
    /// Block width in columns
    pub cb: usize,
    /// Block pointer, length nblocks + 1
    pub block_ptr: Vec<I>,
    pub row_indices: Vec<I>,
    pub col_indices: Vec<I>,
    pub data: Vec<T>,
}

/// Borrowed triples of one column block.
#[derive(Debug, Clone, Copy)]
pub struct BlockView<'a> {
    pub rows: &'a [i64],
    pub cols: &'a [i64],
    pub data: &'a [f64],
}

impl BlockView<'_> {
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T, I> BlockedCsr<T, I> {
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }
    #[inline]
    #[must_use]
    pub const fn nnz(&self) -> usize {
        self.data.len()
    }
    #[inline]
    #[must_use]
    pub fn nblocks(&self) -> usize {
        self.block_ptr.len().saturating_sub(1)
    }
}

/// Number of column blocks of width `cb` needed to cover `ncols`.
#[inline]
#[must_use]
pub const fn nblocks_for(ncols: usize, cb: usize) -> usize {
    ncols.div_ceil(cb)
}

impl BlockedCsr<f64, i64> {
    /// Assemble from raw arrays, checking the block partition.
    ///
    /// With `check`, every entry is also verified to lie in its block's
    /// column window and inside the matrix bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        nrows: usize,
        ncols: usize,
        cb: usize,
        block_ptr: Vec<i64>,
        row_indices: Vec<i64>,
        col_indices: Vec<i64>,
        data: Vec<f64>,
        check: bool,
    ) -> Result<Self> {
        if cb == 0 {
            return Err(SparseError::InvalidParameter {
                name: "cb",
                value: cb,
                reason: "block width must be positive",
            });
        }
        let nblocks = nblocks_for(ncols, cb);
        if block_ptr.len() != nblocks + 1 {
            return Err(SparseError::format("block_ptr length must be nblocks + 1"));
        }
        let nnz = data.len();
        if row_indices.len() != nnz || col_indices.len() != nnz {
            return Err(SparseError::format(
                "row_indices, col_indices and data must have equal length",
            ));
        }
        if block_ptr[0] != 0 {
            return Err(SparseError::format("block_ptr first element must be 0"));
        }
        if usize::try_from(block_ptr[nblocks]).ok() != Some(nnz) {
            return Err(SparseError::format("block_ptr last element must equal nnz"));
        }
        if block_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(SparseError::format("block_ptr must be non-decreasing"));
        }
        let out = Self {
            nrows,
            ncols,
            cb,
            block_ptr,
            row_indices,
            col_indices,
            data,
        };
        if check {
            for b in 0..nblocks {
                let lo = b * cb;
                let hi = (lo + cb).min(ncols);
                let blk = out.block(b);
                for (&i, &j) in blk.rows.iter().zip(blk.cols) {
                    let ok_i = usize::try_from(i).is_ok_and(|ii| ii < nrows);
                    let ok_j = usize::try_from(j).is_ok_and(|jj| (lo..hi).contains(&jj));
                    if !ok_i || !ok_j {
                        return Err(SparseError::format(format!(
                            "entry ({i}, {j}) does not belong to block {b}"
                        )));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Storage positions of block `b`.
    #[inline]
    #[must_use]
    pub fn block_range(&self, b: usize) -> Range<usize> {
        to_usize(self.block_ptr[b])..to_usize(self.block_ptr[b + 1])
    }

    /// Triples of block `b`.
    ///
    /// # Panics
    ///
    /// Panics if `b >= nblocks()`.
    #[inline]
    #[must_use]
    pub fn block(&self, b: usize) -> BlockView<'_> {
        let r = self.block_range(b);
        BlockView {
            rows: &self.row_indices[r.clone()],
            cols: &self.col_indices[r.clone()],
            data: &self.data[r],
        }
    }

    /// Column window `[lo, hi)` covered by block `b`.
    #[inline]
    #[must_use]
    pub fn block_columns(&self, b: usize) -> Range<usize> {
        let lo = b * self.cb;
        lo..(lo + self.cb).min(self.ncols)
    }
}

#[inline]
fn to_usize(x: i64) -> usize {
    debug_assert!(x >= 0);
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    {
        x as usize
    }
}

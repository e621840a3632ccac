//! CSR format definitions and constructors

use crate::coo::check_dims;
use crate::error::{Result, SparseError};

/// Compressed sparse rows.
///
/// Column indices inside a row carry no ordering guarantee and duplicates
/// are kept as separate entries; kernels accumulate them additively.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Csr<T, I> {
    pub nrows: usize,
    pub ncols: usize,
    pub indptr: Vec<I>,  // row pointer, length nrows + 1
    pub indices: Vec<I>, // column indices per row
    pub data: Vec<T>,
}

impl<T, I> Csr<T, I> {
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
}

impl Csr<f64, i64> {
    /// Assemble a CSR from raw arrays.
    ///
    /// The row pointer is always validated; `check` additionally walks every
    /// column index against `ncols`.
    pub fn from_parts(
        nrows: usize,
        ncols: usize,
        indptr: Vec<i64>,
        indices: Vec<i64>,
        data: Vec<f64>,
        check: bool,
    ) -> Result<Self> {
        check_dims(nrows, ncols)?;
        if indptr.len() != nrows + 1 {
            return Err(SparseError::format("indptr length must be nrows + 1"));
        }
        if indices.len() != data.len() {
            return Err(SparseError::format("indices and data must have equal length"));
        }
        let nnz = indices.len();
        if usize::try_from(indptr[nrows]).ok() != Some(nnz) {
            return Err(SparseError::format("indptr last element must equal nnz"));
        }
        if indptr[0] != 0 {
            return Err(SparseError::format("indptr first element must be 0"));
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(SparseError::format("indptr must be non-decreasing"));
        }
        if check {
            if let Some(&j) = indices
                .iter()
                .find(|&&j| !usize::try_from(j).is_ok_and(|jj| jj < ncols))
            {
                return Err(SparseError::format(format!(
                    "column index {j} out of bounds for ncols = {ncols}"
                )));
            }
        }
        Ok(Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        })
    }

    #[inline]
    #[must_use]
    pub const fn from_parts_unchecked(
        nrows: usize,
        ncols: usize,
        indptr: Vec<i64>,
        indices: Vec<i64>,
        data: Vec<f64>,
    ) -> Self {
        Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        }
    }

    /// Half-open range of storage positions holding row `i`.
    #[inline]
    #[must_use]
    pub fn row_range(&self, i: usize) -> std::ops::Range<usize> {
        to_usize(self.indptr[i])..to_usize(self.indptr[i + 1])
    }

    /// Column indices and values of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= nrows`.
    #[inline]
    #[must_use]
    pub fn row(&self, i: usize) -> (&[i64], &[f64]) {
        let r = self.row_range(i);
        (&self.indices[r.clone()], &self.data[r])
    }

    /// Sort column indices within each row. Duplicates stay separate.
    pub fn sort_indices(&mut self) {
        let mut perm: Vec<(i64, f64)> = Vec::new();
        for i in 0..self.nrows {
            let r = self.row_range(i);
            perm.clear();
            perm.extend(
                self.indices[r.clone()]
                    .iter()
                    .copied()
                    .zip(self.data[r.clone()].iter().copied()),
            );
            perm.sort_by_key(|&(j, _)| j);
            for (p, (j, v)) in r.zip(perm.iter().copied()) {
                self.indices[p] = j;
                self.data[p] = v;
            }
        }
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

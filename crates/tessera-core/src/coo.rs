//! COO (coordinate triples) definitions and constructors

use crate::error::{Result, SparseError};

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Coo<T, I> {
    pub data: Vec<T>,
    pub row: Vec<I>, // length nnz, 0-based
    pub col: Vec<I>, // length nnz, 0-based
    pub ncols: usize,
    pub nrows: usize,
}

impl<T, I> Coo<T, I> {
    #[inline]
    #[must_use]
    pub const fn nnz(&self) -> usize {
        self.data.len()
    }
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }
}

impl Coo<f64, i64> {
    /// Assemble triples, validating lengths and (when `check`) index bounds.
    ///
    /// Zero dimensions are rejected before anything else is looked at.
    #[inline]
    pub fn from_parts(
        nrows: usize,
        ncols: usize,
        row: Vec<i64>,
        col: Vec<i64>,
        data: Vec<f64>,
        check: bool,
    ) -> Result<Self> {
        check_dims(nrows, ncols)?;
        if row.len() != data.len() || col.len() != data.len() {
            return Err(SparseError::format("row/col/data must have equal length"));
        }
        if check {
            for (k, (&i, &j)) in row.iter().zip(col.iter()).enumerate() {
                let ok_i = usize::try_from(i).is_ok_and(|ii| ii < nrows);
                let ok_j = usize::try_from(j).is_ok_and(|jj| jj < ncols);
                if !ok_i || !ok_j {
                    return Err(SparseError::format(format!(
                        "entry {k} at ({i}, {j}) out of bounds for {nrows}x{ncols}"
                    )));
                }
            }
        }
        Ok(Self {
            data,
            row,
            col,
            ncols,
            nrows,
        })
    }

    /// Build from 0-based `(row, col, value)` triples.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self> {
        check_dims(nrows, ncols)?;
        let mut row = Vec::with_capacity(triplets.len());
        let mut col = Vec::with_capacity(triplets.len());
        let mut data = Vec::with_capacity(triplets.len());
        for &(i, j, v) in triplets {
            row.push(to_index(i)?);
            col.push(to_index(j)?);
            data.push(v);
        }
        Self::from_parts(nrows, ncols, row, col, data, true)
    }

    #[inline]
    #[must_use]
    pub const fn from_parts_unchecked(
        nrows: usize,
        ncols: usize,
        row: Vec<i64>,
        col: Vec<i64>,
        data: Vec<f64>,
    ) -> Self {
        Self {
            data,
            row,
            col,
            ncols,
            nrows,
        }
    }
}

/// Reject zero dimensions.
pub(crate) fn check_dims(nrows: usize, ncols: usize) -> Result<()> {
    if nrows == 0 {
        return Err(SparseError::InvalidParameter {
            name: "nrows",
            value: nrows,
            reason: "matrix dimensions must be positive",
        });
    }
    if ncols == 0 {
        return Err(SparseError::InvalidParameter {
            name: "ncols",
            value: ncols,
            reason: "matrix dimensions must be positive",
        });
    }
    Ok(())
}

fn to_index(i: usize) -> Result<i64> {
    i64::try_from(i).map_err(|_| SparseError::format(format!("index {i} does not fit in i64")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_triplets_keeps_order_and_duplicates() {
        let a = Coo::from_triplets(2, 2, &[(0, 1, 1.0), (0, 1, 2.0), (1, 0, 3.0)]).unwrap();
        assert_eq!(a.nnz(), 3);
        assert_eq!(a.row, vec![0, 0, 1]);
        assert_eq!(a.col, vec![1, 1, 0]);
        assert_eq!(a.data, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn zero_dimension_is_invalid_parameter() {
        let err = Coo::from_parts(0, 3, vec![], vec![], vec![], true).unwrap_err();
        assert!(err.is_invalid_parameter());
        let err = Coo::from_parts(3, 0, vec![], vec![], vec![], true).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn triplets_with_zero_dimension_rejected_before_conversion() {
        // dims are checked before any triple is looked at
        let err = Coo::from_triplets(0, 2, &[(usize::MAX, 0, 1.0)]).unwrap_err();
        assert!(err.is_invalid_parameter());
        let err = Coo::from_triplets(2, 0, &[(0, usize::MAX, 1.0)]).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn out_of_bounds_is_format_error() {
        let err = Coo::from_parts(2, 2, vec![0, 2], vec![0, 0], vec![1.0, 1.0], true).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("out of bounds"));
        let err = Coo::from_parts(2, 2, vec![-1], vec![0], vec![1.0], true).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn length_mismatch_is_format_error() {
        let err = Coo::from_parts(2, 2, vec![0, 1], vec![0], vec![1.0, 2.0], false).unwrap_err();
        assert!(err.is_format());
    }
}

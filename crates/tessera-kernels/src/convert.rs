#![allow(
    clippy::many_single_char_names,
    reason = "Math kernels conventionally use i/j/k/p for indices"
)]
use crate::util::{balanced_ranges, i64_to_usize, split_lengths, usize_to_i64, task_nnz};
use rayon::prelude::*;
use tessera_core::{BlockedCsr, Coo, Csr, Result, SparseError};

/// Build a CSR from declared dimensions and 0-based `(row, col, value)` triples.
///
/// `nnz` is the count announced by the input header; a different number of
/// triples is a format error.
pub fn build_csr(
    nrows: usize,
    ncols: usize,
    nnz: usize,
    triples: &[(usize, usize, f64)],
) -> Result<Csr<f64, i64>> {
    if triples.len() != nnz {
        return Err(SparseError::format(format!(
            "declared {nnz} nonzeros but received {}",
            triples.len()
        )));
    }
    let a = Coo::from_triplets(nrows, ncols, triples)?;
    coo_to_csr(&a)
}

/// Convert COO -> CSR with a two-pass counting sort keyed by row.
///
/// Pass 1 counts entries per row and prefix-sums them into `indptr`; pass 2
/// scatters each triple backwards from its row's end offset. Order within a
/// row is not preserved and duplicates are kept.
pub fn coo_to_csr(a: &Coo<f64, i64>) -> Result<Csr<f64, i64>> {
    let nrows = a.nrows;
    let ncols = a.ncols;
    let nnz = a.data.len();
    if nrows == 0 || ncols == 0 {
        return Err(SparseError::InvalidParameter {
            name: if nrows == 0 { "nrows" } else { "ncols" },
            value: 0,
            reason: "matrix dimensions must be positive",
        });
    }
    if a.row.len() != nnz || a.col.len() != nnz {
        return Err(SparseError::format("row/col/data must have equal length"));
    }

    // Count per row, validating as we go so nothing is built from bad input
    let mut indptr = vec![0i64; nrows + 1];
    for (&i, &j) in a.row.iter().zip(&a.col) {
        let ok_i = usize::try_from(i).is_ok_and(|ii| ii < nrows);
        let ok_j = usize::try_from(j).is_ok_and(|jj| jj < ncols);
        if !ok_i || !ok_j {
            return Err(SparseError::format(format!(
                "entry ({i}, {j}) out of bounds for {nrows}x{ncols}"
            )));
        }
        indptr[i64_to_usize(i) + 1] += 1;
    }
    for r in 0..nrows {
        indptr[r + 1] += indptr[r];
    }

    let mut indices = vec![0i64; nnz];
    let mut data = vec![0.0f64; nnz];
    let mut cursor: Vec<usize> = indptr[1..].iter().map(|&p| i64_to_usize(p)).collect();
    for ((&i, &j), &v) in a.row.iter().zip(&a.col).zip(&a.data) {
        let r = i64_to_usize(i);
        cursor[r] -= 1;
        let dst = cursor[r];
        indices[dst] = j;
        data[dst] = v;
    }

    Ok(Csr::from_parts_unchecked(nrows, ncols, indptr, indices, data))
}

/// Convert CSR -> COO (f64/i64)
#[must_use]
pub fn csr_to_coo(a: &Csr<f64, i64>) -> Coo<f64, i64> {
    let mut row = vec![0i64; a.nnz()];
    let ranges = balanced_ranges(&a.indptr, task_nnz(a.nnz()));
    let lens = ranges
        .iter()
        .map(|r| i64_to_usize(a.indptr[r.end] - a.indptr[r.start]));
    let parts = split_lengths(&mut row, lens);
    ranges
        .into_par_iter()
        .zip(parts)
        .for_each(|(rows, seg)| {
            let base = i64_to_usize(a.indptr[rows.start]);
            for i in rows {
                let p = a.row_range(i);
                seg[p.start - base..p.end - base].fill(usize_to_i64(i));
            }
        });
    Coo::from_parts_unchecked(a.nrows, a.ncols, row, a.indices.clone(), a.data.clone())
}

/// Flatten a blocked matrix back to COO, block by block.
#[must_use]
pub fn blocked_to_coo(b: &BlockedCsr<f64, i64>) -> Coo<f64, i64> {
    Coo::from_parts_unchecked(
        b.nrows,
        b.ncols,
        b.row_indices.clone(),
        b.col_indices.clone(),
        b.data.clone(),
    )
}

#![allow(
    clippy::many_single_char_names,
    reason = "Math kernels conventionally use i/j/k/p to denote indices and pointers"
)]
use crate::util::{
    balanced_ranges, i64_to_usize, split_lengths, SMALL_DIM_LIMIT, SMALL_NNZ_LIMIT,
    task_nnz,
};
use rayon::prelude::*;
use tessera_core::{check_len, Csr, Result};

/// Dot product of row `i` with `x`, unrolled by four.
#[inline]
fn spmv_row(a: &Csr<f64, i64>, x: &[f64], i: usize) -> f64 {
    let (idx, val) = a.row(i);
    let mut idx4 = idx.chunks_exact(4);
    let mut val4 = val.chunks_exact(4);
    let mut acc = 0.0f64;
    for (j, v) in (&mut idx4).zip(&mut val4) {
        acc = v[3].mul_add(
            x[i64_to_usize(j[3])],
            v[2].mul_add(
                x[i64_to_usize(j[2])],
                v[1].mul_add(
                    x[i64_to_usize(j[1])],
                    v[0].mul_add(x[i64_to_usize(j[0])], acc),
                ),
            ),
        );
    }
    for (&j, &v) in idx4.remainder().iter().zip(val4.remainder()) {
        acc = v.mul_add(x[i64_to_usize(j)], acc);
    }
    acc
}

/// y = A @ x
pub fn spmv_csr(a: &Csr<f64, i64>, x: &[f64]) -> Result<Vec<f64>> {
    let mut y = vec![0.0f64; a.nrows];
    spmv_csr_into(a, x, &mut y)?;
    Ok(y)
}

/// y = A @ x, overwriting `y`.
///
/// Rows are independent: each task owns a disjoint chunk of `y`, balanced by
/// nonzero count, so no synchronization is needed.
pub fn spmv_csr_into(a: &Csr<f64, i64>, x: &[f64], y: &mut [f64]) -> Result<()> {
    check_len("x", a.ncols, x.len())?;
    check_len("y", a.nrows, y.len())?;
    let nrows = a.nrows;
    let nnz = a.nnz();

    // For small problems, avoid rayon overhead and compute sequentially.
    let small = nrows <= SMALL_DIM_LIMIT || nnz <= SMALL_NNZ_LIMIT;
    if small {
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = spmv_row(a, x, i);
        }
        return Ok(());
    }

    let ranges = balanced_ranges(&a.indptr, task_nnz(a.nnz()));
    let chunks = split_lengths(y, ranges.iter().map(|r| r.len()));
    ranges
        .into_par_iter()
        .zip(chunks)
        .for_each(|(rows, yc)| {
            for (i, yi) in rows.zip(yc.iter_mut()) {
                *yi = spmv_row(a, x, i);
            }
        });
    Ok(())
}

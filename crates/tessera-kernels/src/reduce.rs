use rayon::prelude::*;
use tessera_core::{BlockedCsr, Csr};
use wide::f64x4;

const SUM_CHUNK: usize = 4096;

/// Sum of a slice: parallel over chunks, SIMD inside each chunk.
#[must_use]
pub fn sum_f64(values: &[f64]) -> f64 {
    values
        .par_chunks(SUM_CHUNK)
        .map(|chunk| {
            let mut accv = f64x4::from([0.0, 0.0, 0.0, 0.0]);
            let mut it = chunk.chunks_exact(4);
            for c in &mut it {
                accv += f64x4::from([c[0], c[1], c[2], c[3]]);
            }
            let arr = accv.to_array();
            let mut acc = arr[0] + arr[1] + arr[2] + arr[3];
            for &v in it.remainder() {
                acc += v;
            }
            acc
        })
        .sum()
}

/// Sum of all stored values of a CSR matrix.
#[must_use]
pub fn sum_csr(a: &Csr<f64, i64>) -> f64 {
    sum_f64(&a.data)
}

/// Sum of all stored values of a blocked matrix.
#[must_use]
pub fn sum_blocked(b: &BlockedCsr<f64, i64>) -> f64 {
    sum_f64(&b.data)
}

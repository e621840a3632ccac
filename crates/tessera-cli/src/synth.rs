//! Reproducible synthetic matrices for the harness

use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_core::Csr;
use tessera_kernels::build_csr;

/// Random `nrows x ncols` matrix with about `density * ncols` entries per row.
///
/// Every row gets at least one entry. Columns are drawn uniformly, so a row
/// may repeat a column; such entries accumulate like any duplicate.
pub fn random_csr(nrows: usize, ncols: usize, density: f64, seed: u64) -> Result<Csr<f64, i64>> {
    ensure!(
        density > 0.0 && density <= 1.0,
        "density must be in (0, 1], got {density}"
    );
    ensure!(
        nrows > 0 && ncols > 0,
        "matrix dimensions must be positive, got {nrows}x{ncols}"
    );
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let per_row = ((density * ncols as f64).round() as usize).max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut triples = Vec::with_capacity(nrows.saturating_mul(per_row));
    for i in 0..nrows {
        for _ in 0..per_row {
            triples.push((i, rng.random_range(0..ncols), rng.random_range(-1.0..1.0)));
        }
    }
    Ok(build_csr(nrows, ncols, triples.len(), &triples)?)
}

//! Timing and verification for one thread count

use anyhow::{ensure, Context, Result};
use log::info;
use std::fmt;
use std::time::Instant;
use tessera_core::{BlockedCsr, Csr};
use tessera_kernels::{compare, spmv_blocked_into, spmv_csr_into, Strategy, Tolerance, Verdict};

/// Run `f` once and return its output with the elapsed seconds.
pub fn time_once<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let t0 = Instant::now();
    let out = f();
    (out, t0.elapsed().as_secs_f64())
}

/// Mean seconds per call of `f` over `iters` calls.
pub fn time_per_call(
    iters: usize,
    mut f: impl FnMut() -> tessera_core::Result<()>,
) -> Result<f64> {
    ensure!(iters > 0, "iteration count must be positive");
    let t0 = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    #[allow(clippy::cast_precision_loss)]
    Ok(t0.elapsed().as_secs_f64() / iters as f64)
}

/// One line of the benchmark table.
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    pub threads: usize,
    /// Strategy actually used after resolving `Auto`
    pub strategy: Strategy,
    pub naive_secs: f64,
    pub blocked_secs: f64,
    pub verdict: Verdict,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "threads = {:>3} | naive CSR: {:.8} s | blocked ({}): {:.8} s | speedup {:.2}x | ",
            self.threads,
            self.naive_secs,
            self.strategy,
            self.blocked_secs,
            self.naive_secs / self.blocked_secs.max(f64::MIN_POSITIVE),
        )?;
        if self.verdict.within_tolerance {
            write!(f, "results match")
        } else {
            write!(f, "WARNING (max diff = {:e})", self.verdict.max_diff)
        }
    }
}

/// Time both kernel families on a dedicated pool of `threads` workers and
/// diff their outputs.
pub fn run_with_threads(
    threads: usize,
    a: &Csr<f64, i64>,
    b: &BlockedCsr<f64, i64>,
    x: &[f64],
    strategy: Strategy,
    iters: usize,
    tol: Tolerance,
) -> Result<Measurement> {
    ensure!(threads > 0, "thread count must be positive");
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .with_context(|| format!("building a pool of {threads} threads"))?;
    pool.install(|| -> Result<Measurement> {
        let mut y_naive = vec![0.0f64; a.nrows];
        let mut y_blocked = vec![0.0f64; b.nrows];
        let strategy = strategy.resolve(b);

        let naive_secs = time_per_call(iters, || spmv_csr_into(a, x, &mut y_naive))?;
        let blocked_secs =
            time_per_call(iters, || spmv_blocked_into(b, x, &mut y_blocked, strategy))?;
        let verdict = compare(&y_blocked, &y_naive, tol)?;
        info!(
            "threads={threads} strategy={strategy} naive={naive_secs:.3e}s blocked={blocked_secs:.3e}s max_diff={:.3e}",
            verdict.max_diff
        );
        Ok(Measurement {
            threads,
            strategy,
            naive_secs,
            blocked_secs,
            verdict,
        })
    })
}

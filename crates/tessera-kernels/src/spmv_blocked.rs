//! SpMV over the column-blocked layout
//
// Blocks partition the work by column while `y` is owned by row, so a row
// spread over several blocks is written by several tasks. The parallel
// variants resolve that either with atomic adds or with per-thread buffers
// reduced afterwards.

#![allow(
    clippy::many_single_char_names,
    reason = "Math kernels conventionally use i/j/k/p to denote indices and pointers"
)]
use crate::blocked::{block_stats, BlockStats};
use crate::util::{
    add_assign_f64, balanced_ranges, i64_to_usize, task_nnz, AtomicF64, SMALL_NNZ_LIMIT,
    STRIPE_ROWS,
};
use log::trace;
use rayon::prelude::*;
use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::atomic::Ordering;
use tessera_core::{check_len, BlockedCsr, Result};
use thread_local::ThreadLocal;

/// How concurrent writes to a shared output row are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Single thread of control, no synchronization
    Serial,
    /// One atomic fetch-add per nonzero
    Atomic,
    /// Per-thread `nrows` buffers, summed in row stripes afterwards
    PrivateReduce,
    /// Pick one of the above from the matrix shape and thread count
    #[default]
    Auto,
}

impl Strategy {
    /// Resolve `Auto` for `b` on the current rayon pool.
    ///
    /// Tiny problems, single-block layouts and pools of one run serially.
    /// Otherwise the choice is [`Strategy::by_fan_in`], which scans the
    /// layout once; resolve before a loop of products rather than inside it.
    #[must_use]
    pub fn resolve(self, b: &BlockedCsr<f64, i64>) -> Self {
        if self != Self::Auto {
            return self;
        }
        let nthreads = rayon::current_num_threads().max(1);
        if nthreads == 1 || b.nnz() <= SMALL_NNZ_LIMIT || b.nblocks() < 2 {
            return Self::Serial;
        }
        Self::by_fan_in(&block_stats(b), nthreads)
    }

    /// Pick a parallel strategy from row fan-in.
    ///
    /// A row touched by `f` blocks takes `f` concurrent adds, so atomics
    /// contend once the mean fan-in reaches half the worker count; past that
    /// point per-thread buffers are cheaper than the contention.
    #[must_use]
    pub fn by_fan_in(stats: &BlockStats, nthreads: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let half_pool = nthreads.max(1) as f64 / 2.0;
        if stats.mean_fan_in >= half_pool {
            Self::PrivateReduce
        } else {
            Self::Atomic
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Serial => "serial",
            Self::Atomic => "atomic",
            Self::PrivateReduce => "private",
            Self::Auto => "auto",
        };
        f.write_str(s)
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Ok(Self::Serial),
            "atomic" => Ok(Self::Atomic),
            "private" | "private-reduce" | "reduce" => Ok(Self::PrivateReduce),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown strategy `{other}` (expected serial, atomic, private or auto)"
            )),
        }
    }
}

/// y = B @ x; `parallel` selects [`Strategy::Auto`] over [`Strategy::Serial`].
pub fn spmv_blocked(b: &BlockedCsr<f64, i64>, x: &[f64], parallel: bool) -> Result<Vec<f64>> {
    let strategy = if parallel {
        Strategy::Auto
    } else {
        Strategy::Serial
    };
    spmv_blocked_with(b, x, strategy)
}

/// y = B @ x with an explicit accumulation strategy.
pub fn spmv_blocked_with(
    b: &BlockedCsr<f64, i64>,
    x: &[f64],
    strategy: Strategy,
) -> Result<Vec<f64>> {
    let mut y = vec![0.0f64; b.nrows];
    spmv_blocked_into(b, x, &mut y, strategy)?;
    Ok(y)
}

/// y = B @ x, overwriting `y`.
pub fn spmv_blocked_into(
    b: &BlockedCsr<f64, i64>,
    x: &[f64],
    y: &mut [f64],
    strategy: Strategy,
) -> Result<()> {
    check_len("x", b.ncols, x.len())?;
    check_len("y", b.nrows, y.len())?;
    let strategy = strategy.resolve(b);
    trace!("blocked spmv: strategy={strategy}, nblocks={}", b.nblocks());
    match strategy {
        Strategy::Serial | Strategy::Auto => run_serial(b, x, y),
        Strategy::Atomic => run_atomic(b, x, y),
        Strategy::PrivateReduce => run_private_reduce(b, x, y),
    }
    Ok(())
}

#[inline]
fn accumulate_blocks(
    b: &BlockedCsr<f64, i64>,
    x: &[f64],
    blocks: Range<usize>,
    mut add: impl FnMut(usize, f64),
) {
    for blk in blocks {
        let view = b.block(blk);
        for ((&i, &j), &v) in view.rows.iter().zip(view.cols).zip(view.data) {
            add(i64_to_usize(i), v * x[i64_to_usize(j)]);
        }
    }
}

fn run_serial(b: &BlockedCsr<f64, i64>, x: &[f64], y: &mut [f64]) {
    y.fill(0.0);
    accumulate_blocks(b, x, 0..b.nblocks(), |i, v| y[i] += v);
}

fn run_atomic(b: &BlockedCsr<f64, i64>, x: &[f64], y: &mut [f64]) {
    let acc: Vec<AtomicF64> = (0..b.nrows).map(|_| AtomicF64::new(0.0)).collect();
    balanced_ranges(&b.block_ptr, task_nnz(b.nnz()))
        .into_par_iter()
        .for_each(|blocks| {
            accumulate_blocks(b, x, blocks, |i, v| {
                acc[i].fetch_add(v, Ordering::Relaxed);
            });
        });
    // the join above orders every add before these loads
    y.par_iter_mut()
        .zip(acc.into_par_iter())
        .for_each(|(yi, a)| *yi = a.into_inner());
}

fn run_private_reduce(b: &BlockedCsr<f64, i64>, x: &[f64], y: &mut [f64]) {
    let nrows = b.nrows;
    let tls: ThreadLocal<RefCell<Vec<f64>>> = ThreadLocal::new();
    balanced_ranges(&b.block_ptr, task_nnz(b.nnz()))
        .into_par_iter()
        .for_each(|blocks| {
            let cell = tls.get_or(|| RefCell::new(vec![0.0f64; nrows]));
            let mut acc = cell.borrow_mut();
            accumulate_blocks(b, x, blocks, |i, v| acc[i] += v);
        });
    let bufs: Vec<Vec<f64>> = tls.into_iter().map(RefCell::into_inner).collect();
    y.par_chunks_mut(STRIPE_ROWS)
        .enumerate()
        .for_each(|(sid, ys)| {
            let base = sid * STRIPE_ROWS;
            ys.fill(0.0);
            for buf in &bufs {
                add_assign_f64(ys, &buf[base..base + ys.len()]);
            }
        });
}

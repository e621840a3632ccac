//! Utility constants, index conversions and shared accumulators
//
// Thresholds decide when rayon is worth its overhead; `AtomicF64` is the
// atomic-add capability used by the blocked kernel.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use wide::f64x4;

/// Row stripe handled by one task while reducing private buffers
pub const STRIPE_ROWS: usize = 8192;
/// The naive kernel runs sequentially at or below this many rows
pub const SMALL_DIM_LIMIT: usize = 2048;
/// Both kernels run sequentially at or below this many nonzeros; for the
/// blocked kernel this is the `Auto` cutoff to `Serial`
pub const SMALL_NNZ_LIMIT: usize = 32 * 1024;
/// Upper bound on nonzeros per task when splitting rows (naive) or blocks
/// (blocked); see [`task_nnz`]
pub const TASK_NNZ_TARGET: usize = 128 * 1024;

/// Convert i64 to usize, asserting non-negativity.
#[inline]
#[must_use]
pub fn i64_to_usize(x: i64) -> usize {
    debug_assert!(x >= 0);
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    {
        x as usize
    }
}

/// Convert usize to i64, asserting it fits.
#[inline]
#[must_use]
pub fn usize_to_i64(x: usize) -> i64 {
    debug_assert!(i64::try_from(x).is_ok());
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    {
        x as i64
    }
}

/// Split `0..ptr.len()-1` into contiguous ranges of roughly `target` nonzeros.
///
/// `ptr` is a row or block pointer. The ranges cover every slot, including
/// trailing empty ones, so callers can use them to partition an output.
#[must_use]
pub fn balanced_ranges(ptr: &[i64], target: usize) -> Vec<Range<usize>> {
    let n = ptr.len().saturating_sub(1);
    let mut ranges = Vec::new();
    let mut start = 0usize;
    for i in 0..n {
        let acc = i64_to_usize(ptr[i + 1] - ptr[start]);
        if acc >= target {
            ranges.push(start..i + 1);
            start = i + 1;
        }
    }
    if start < n {
        ranges.push(start..n);
    }
    ranges
}

/// Nonzeros per task for `nnz` total on the current rayon pool.
///
/// Aims at eight tasks per worker, capped at [`TASK_NNZ_TARGET`].
#[inline]
#[must_use]
pub fn task_nnz(nnz: usize) -> usize {
    1.max(nnz / (rayon::current_num_threads().max(1) * 8))
        .min(TASK_NNZ_TARGET)
}

/// Cut `buf` into consecutive mutable segments of the given lengths.
///
/// # Panics
///
/// Panics if the lengths add up to more than `buf.len()`.
pub fn split_lengths<T>(buf: &mut [T], lens: impl IntoIterator<Item = usize>) -> Vec<&mut [T]> {
    let mut rest = buf;
    let mut parts = Vec::new();
    for len in lens {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
        parts.push(head);
        rest = tail;
    }
    parts
}

/// `dst[k] += src[k]`, four lanes at a time.
#[inline]
pub fn add_assign_f64(dst: &mut [f64], src: &[f64]) {
    debug_assert_eq!(dst.len(), src.len());
    let mut d4 = dst.chunks_exact_mut(4);
    let mut s4 = src.chunks_exact(4);
    for (d, s) in (&mut d4).zip(&mut s4) {
        let v = f64x4::from([d[0], d[1], d[2], d[3]]) + f64x4::from([s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&v.to_array());
    }
    for (d, s) in d4.into_remainder().iter_mut().zip(s4.remainder()) {
        *d += *s;
    }
}

/// An `f64` cell supporting atomic addition.
///
/// Stored as IEEE-754 bits in an `AtomicU64`; `fetch_add` is a
/// compare-exchange loop.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    #[inline]
    #[must_use]
    pub fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.0.load(order))
    }

    /// Add `v` and return the previous value.
    #[inline]
    pub fn fetch_add(&self, v: f64, order: Ordering) -> f64 {
        let mut cur = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(cur) + v).to_bits();
            match self.0.compare_exchange_weak(cur, next, order, Ordering::Relaxed) {
                Ok(prev) => return f64::from_bits(prev),
                Err(actual) => cur = actual,
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> f64 {
        f64::from_bits(self.0.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn balanced_ranges_cover_everything() {
        // rows with nnz 3, 0, 5, 1, 0, 0
        let ptr = [0i64, 3, 3, 8, 9, 9, 9];
        let r = balanced_ranges(&ptr, 4);
        assert_eq!(r, vec![0..3, 3..6]);
        let r = balanced_ranges(&ptr, 1000);
        assert_eq!(r, vec![0..6]);
        assert!(balanced_ranges(&[0i64], 4).is_empty());
    }

    #[test]
    fn task_nnz_follows_pool_size() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        pool.install(|| {
            assert_eq!(task_nnz(80_000), 2_500);
            assert_eq!(task_nnz(10), 1);
            assert_eq!(task_nnz(0), 1);
            assert_eq!(task_nnz(usize::MAX / 2), TASK_NNZ_TARGET);
        });
    }

    #[test]
    fn split_lengths_partitions() {
        let mut v = vec![0u8; 6];
        let parts = split_lengths(&mut v, [1, 0, 3, 2]);
        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![1, 0, 3, 2]);
    }

    #[test]
    fn add_assign_handles_tail() {
        let mut d = vec![1.0; 7];
        let s: Vec<f64> = (0..7).map(f64::from).collect();
        add_assign_f64(&mut d, &s);
        assert_eq!(d, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn atomic_f64_concurrent_adds() {
        let cell = AtomicF64::new(0.5);
        (0..10_000).into_par_iter().for_each(|_| {
            cell.fetch_add(1.0, Ordering::Relaxed);
        });
        assert_eq!(cell.into_inner(), 10_000.5);
    }
}

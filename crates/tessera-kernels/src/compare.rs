//! Numerical agreement between kernel outputs
//!
//! Different kernels sum a row's terms in different orders, so results may
//! drift by rounding. Drift is reported, never raised as an error.

use rayon::prelude::*;
use tessera_core::{check_len, Result};

/// Tolerance used when comparing two result vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: 0.0,
            atol: 1e-9,
        }
    }
}

/// Outcome of [`compare`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    /// Infinity norm of `a - b`
    pub max_diff: f64,
    pub within_tolerance: bool,
}

/// `max |a[i] - b[i]|`
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> Result<f64> {
    check_len("b", a.len(), b.len())?;
    Ok(a.par_iter()
        .zip(b.par_iter())
        .map(|(x, y)| (x - y).abs())
        .reduce(|| 0.0, f64::max))
}

/// `|a[i] - b[i]| <= atol + rtol * |b[i]|` for every `i`.
pub fn allclose(a: &[f64], b: &[f64], rtol: f64, atol: f64) -> Result<bool> {
    check_len("b", a.len(), b.len())?;
    Ok(a.par_iter()
        .zip(b.par_iter())
        .all(|(x, y)| (x - y).abs() <= rtol.mul_add(y.abs(), atol)))
}

/// Diff `a` against the reference `b`.
pub fn compare(a: &[f64], b: &[f64], tol: Tolerance) -> Result<Verdict> {
    Ok(Verdict {
        max_diff: max_abs_diff(a, b)?,
        within_tolerance: allclose(a, b, tol.rtol, tol.atol)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_match() {
        let v = [1.0, -2.0, 3.5];
        let verdict = compare(&v, &v, Tolerance::default()).unwrap();
        assert_eq!(verdict.max_diff, 0.0);
        assert!(verdict.within_tolerance);
    }

    #[test]
    fn drift_beyond_atol_is_flagged() {
        let a = [1.0, 2.0];
        let b = [1.0, 2.0 + 1e-6];
        let verdict = compare(&a, &b, Tolerance::default()).unwrap();
        assert!((verdict.max_diff - 1e-6).abs() < 1e-12);
        assert!(!verdict.within_tolerance);
        // a relative tolerance absorbs it
        assert!(allclose(&a, &b, 1e-5, 0.0).unwrap());
    }

    #[test]
    fn length_mismatch() {
        assert!(max_abs_diff(&[1.0], &[1.0, 2.0]).unwrap_err().is_dimension_mismatch());
        assert!(compare(&[], &[0.0], Tolerance::default()).is_err());
    }

    #[test]
    fn empty_vectors_agree() {
        assert_eq!(max_abs_diff(&[], &[]).unwrap(), 0.0);
        assert!(allclose(&[], &[], 0.0, 0.0).unwrap());
    }
}

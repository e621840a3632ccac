//! Sparse matrix-vector kernels for tessera (pure Rust, rayon-parallel)
//!
//! Rayon sizes its global pool from the core count; set `RAYON_NUM_THREADS`
//! or install a `rayon::ThreadPool` to change the worker count.

pub mod blocked;
pub mod compare;
pub mod config;
pub mod convert;
pub mod reduce;
pub mod spmv;
pub mod spmv_blocked;
pub mod util;

pub use blocked::{block_stats, build_blocked, BlockStats, DEFAULT_BLOCK_WIDTH};
pub use compare::{allclose, compare, max_abs_diff, Tolerance, Verdict};
pub use config::KernelConfig;
pub use convert::{blocked_to_coo, build_csr, coo_to_csr, csr_to_coo};
pub use reduce::{sum_blocked, sum_csr, sum_f64};
pub use spmv::{spmv_csr, spmv_csr_into};
pub use spmv_blocked::{spmv_blocked, spmv_blocked_into, spmv_blocked_with, Strategy};

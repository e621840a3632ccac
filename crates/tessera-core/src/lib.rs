//! Core data structures for tessera (pure Rust)

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod blocked;
pub mod coo;
pub mod csr;
pub mod error;

pub use blocked::{nblocks_for, BlockView, BlockedCsr};
pub use coo::Coo;
pub use csr::Csr;
pub use error::{check_len, Result, SparseError};

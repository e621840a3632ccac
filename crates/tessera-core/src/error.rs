//! Error types shared by every tessera crate.
//!
//! All faults are input-validation faults: they are reported synchronously
//! and nothing is retried or partially constructed.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building sparse matrices or running kernels.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SparseError {
    /// The backing source could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path of the source that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Coordinate input is malformed, truncated or inconsistent.
    #[error("format error{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Format {
        /// 1-based line number, when the input came from text
        line: Option<usize>,
        /// What was wrong
        message: String,
    },

    /// A tunable or a declared dimension is out of range.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        /// Name of the parameter
        name: &'static str,
        /// The rejected value
        value: usize,
        /// Why it was rejected
        reason: &'static str,
    },

    /// A vector argument has the wrong length for the matrix.
    #[error("dimension mismatch for {what}: expected length {expected}, found {found}")]
    DimensionMismatch {
        /// Which operand was wrong (`"x"`, `"y"`, ...)
        what: &'static str,
        /// Required length
        expected: usize,
        /// Actual length
        found: usize,
    },
}

/// A specialized `Result` type for tessera operations.
pub type Result<T> = std::result::Result<T, SparseError>;

impl SparseError {
    /// Build a [`SparseError::Format`] not tied to a source line.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            line: None,
            message: message.into(),
        }
    }

    /// Build a [`SparseError::Format`] for a 1-based input line.
    pub fn format_at(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Returns `true` if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns `true` if this is a format error.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns `true` if this is an invalid-parameter error.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }

    /// Returns `true` if this is a dimension mismatch.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }
}

/// Fail with [`SparseError::DimensionMismatch`] unless `found == expected`.
#[inline]
pub fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(SparseError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}

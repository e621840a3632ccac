//! Matrix Market coordinate reader for tessera
//!
//! Accepts the `coordinate` flavour: an optional `%%MatrixMarket` banner,
//! `%` comment lines, a `M N NNZ` size line and `NNZ` lines of
//! `row col [value]` with 1-based indices. Entries come back 0-based.
//! Any malformed or truncated input is a [`SparseError::Format`]; nothing is
//! returned partially built.

use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tessera_core::{Coo, Csr, Result, SparseError};
use tessera_kernels::coo_to_csr;

#[inline]
#[must_use]
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Entries reserved up front from the size line; larger inputs grow as read.
const MAX_PREALLOC: usize = 1 << 20;

/// Value field declared by the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Real,
    Pattern,
}

/// Symmetry declared by the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
}

#[derive(Debug, Clone, Copy)]
struct Banner {
    field: Field,
    symmetry: Symmetry,
}

impl Default for Banner {
    fn default() -> Self {
        Self {
            field: Field::Real,
            symmetry: Symmetry::General,
        }
    }
}

fn parse_banner(line: &str, lineno: usize) -> Result<Banner> {
    let words: Vec<String> = line
        .split_whitespace()
        .skip(1)
        .map(str::to_ascii_lowercase)
        .collect();
    let word = |k: usize| words.get(k).map_or("", String::as_str);
    if word(0) != "matrix" || word(1) != "coordinate" {
        return Err(SparseError::format_at(
            lineno,
            "only `matrix coordinate` Matrix Market files are supported",
        ));
    }
    let field = match word(2) {
        "real" | "integer" | "double" => Field::Real,
        "pattern" => Field::Pattern,
        other => {
            return Err(SparseError::format_at(
                lineno,
                format!("unsupported field `{other}`"),
            ))
        }
    };
    let symmetry = match word(3) {
        "" | "general" => Symmetry::General,
        "symmetric" => Symmetry::Symmetric,
        "skew-symmetric" => Symmetry::SkewSymmetric,
        other => {
            return Err(SparseError::format_at(
                lineno,
                format!("unsupported symmetry `{other}`"),
            ))
        }
    };
    Ok(Banner { field, symmetry })
}

fn parse_num<T: std::str::FromStr>(tok: Option<&str>, what: &str, lineno: usize) -> Result<T> {
    let tok = tok.ok_or_else(|| SparseError::format_at(lineno, format!("missing {what}")))?;
    tok.parse()
        .map_err(|_| SparseError::format_at(lineno, format!("cannot parse {what} `{tok}`")))
}

/// Convert a 1-based wire index to 0-based, checking it against `dim`.
fn zero_based(idx: usize, dim: usize, what: &str, lineno: usize) -> Result<i64> {
    if idx == 0 || idx > dim {
        return Err(SparseError::format_at(
            lineno,
            format!("{what} index {idx} outside 1..={dim}"),
        ));
    }
    i64::try_from(idx - 1)
        .map_err(|_| SparseError::format_at(lineno, format!("{what} index {idx} too large")))
}

/// Read coordinate triples from any buffered reader.
pub fn read_coo<R: BufRead>(reader: R) -> Result<Coo<f64, i64>> {
    let mut banner = Banner::default();
    let mut size: Option<(usize, usize, usize)> = None;
    let mut row = Vec::new();
    let mut col = Vec::new();
    let mut data = Vec::new();
    let mut seen = 0usize;
    let mut last_line = 0usize;

    for (k, line) in reader.lines().enumerate() {
        let lineno = k + 1;
        last_line = lineno;
        let line = line.map_err(|source| SparseError::Io {
            path: PathBuf::from("<input>"),
            source,
        })?;
        let trimmed = line.trim();
        if lineno == 1 && trimmed.starts_with("%%MatrixMarket") {
            banner = parse_banner(trimmed, lineno)?;
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        let mut toks = trimmed.split_whitespace();

        let Some((nrows, ncols, nnz)) = size else {
            let m: i64 = parse_num(toks.next(), "row count", lineno)?;
            let n: i64 = parse_num(toks.next(), "column count", lineno)?;
            let z: i64 = parse_num(toks.next(), "nonzero count", lineno)?;
            if toks.next().is_some() {
                return Err(SparseError::format_at(lineno, "size line must be `M N NNZ`"));
            }
            if m <= 0 || n <= 0 || z < 0 {
                return Err(SparseError::format_at(
                    lineno,
                    format!("declared dimensions must be positive, got {m} x {n} with {z} nonzeros"),
                ));
            }
            let dims = (
                usize::try_from(m).map_err(|_| SparseError::format_at(lineno, "row count too large"))?,
                usize::try_from(n).map_err(|_| SparseError::format_at(lineno, "column count too large"))?,
                usize::try_from(z).map_err(|_| SparseError::format_at(lineno, "nonzero count too large"))?,
            );
            // the header is untrusted until the body confirms it
            let declared = if banner.symmetry == Symmetry::General {
                dims.2
            } else {
                dims.2.saturating_mul(2)
            };
            let cap = declared.min(MAX_PREALLOC);
            row.reserve(cap);
            col.reserve(cap);
            data.reserve(cap);
            size = Some(dims);
            continue;
        };

        if seen == nnz {
            return Err(SparseError::format_at(
                lineno,
                format!("more than the declared {nnz} entries"),
            ));
        }
        let i: usize = parse_num(toks.next(), "row index", lineno)?;
        let j: usize = parse_num(toks.next(), "column index", lineno)?;
        let v: f64 = match banner.field {
            Field::Real => parse_num(toks.next(), "value", lineno)?,
            Field::Pattern => 1.0,
        };
        if toks.next().is_some() {
            return Err(SparseError::format_at(lineno, "trailing fields after entry"));
        }
        let i = zero_based(i, nrows, "row", lineno)?;
        let j = zero_based(j, ncols, "column", lineno)?;
        row.push(i);
        col.push(j);
        data.push(v);
        if i != j {
            match banner.symmetry {
                Symmetry::General => {}
                Symmetry::Symmetric => {
                    row.push(j);
                    col.push(i);
                    data.push(v);
                }
                Symmetry::SkewSymmetric => {
                    row.push(j);
                    col.push(i);
                    data.push(-v);
                }
            }
        }
        seen += 1;
    }

    let Some((nrows, ncols, nnz)) = size else {
        return Err(SparseError::format_at(last_line.max(1), "missing size line `M N NNZ`"));
    };
    if seen != nnz {
        return Err(SparseError::format_at(
            last_line,
            format!("truncated data: declared {nnz} entries, found {seen}"),
        ));
    }
    Coo::from_parts(nrows, ncols, row, col, data, false)
}

/// Open `path` and read it with [`read_coo`].
pub fn read_coo_file(path: impl AsRef<Path>) -> Result<Coo<f64, i64>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SparseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_coo(BufReader::new(file))
}

/// Load a Matrix Market file straight into CSR.
pub fn load_csr(path: impl AsRef<Path>) -> Result<Csr<f64, i64>> {
    let path = path.as_ref();
    let coo = read_coo_file(path)?;
    let a = coo_to_csr(&coo)?;
    info!(
        "loaded {}: {}x{}, nnz={}",
        path.display(),
        a.nrows,
        a.ncols,
        a.nnz()
    );
    Ok(a)
}

//! `tessera`: compare naive CSR and cache-blocked SpMV on one matrix.
//!
//! Usage:
//!     tessera --matrix mc2depi.mtx --cb 4096 --threads 1,2,4,8,16
//!     tessera --random 200000x200000 --density 1e-4 --strategy private
//!
//! Set `RUST_LOG=debug` for builder and kernel diagnostics.

mod bench;
mod synth;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use tessera_kernels::{
    block_stats, build_blocked, KernelConfig, Strategy, Tolerance, DEFAULT_BLOCK_WIDTH,
};

/// CLI arguments for the SpMV benchmark
#[derive(Parser, Debug)]
#[command(name = "tessera", version)]
#[command(about = "Benchmark naive vs cache-blocked sparse matrix-vector products")]
struct Args {
    /// Matrix Market coordinate file to load
    #[arg(short, long, conflicts_with = "random")]
    matrix: Option<PathBuf>,

    /// Generate a random ROWSxCOLS matrix instead of loading one
    #[arg(long, value_parser = parse_shape)]
    random: Option<(usize, usize)>,

    /// Fraction of columns populated per row for --random
    #[arg(long, default_value_t = 1e-3)]
    density: f64,

    /// Seed for --random
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Block width in columns
    #[arg(long, default_value_t = DEFAULT_BLOCK_WIDTH)]
    cb: usize,

    /// Kernel calls timed per measurement
    #[arg(short, long, default_value_t = 50)]
    iters: usize,

    /// Thread counts to sweep (comma-separated)
    #[arg(short, long, value_delimiter = ',', default_values_t = [1usize, 2, 4, 8, 16])]
    threads: Vec<usize>,

    /// Accumulation strategy for the blocked kernel: auto, serial, atomic or private
    #[arg(short, long, default_value_t = Strategy::Auto)]
    strategy: Strategy,

    /// Relative tolerance when comparing results
    #[arg(long, default_value_t = 0.0)]
    rtol: f64,

    /// Absolute tolerance when comparing results
    #[arg(long, default_value_t = 1e-9)]
    atol: f64,
}

/// Parse `ROWSxCOLS`.
fn parse_shape(s: &str) -> Result<(usize, usize), String> {
    let (m, n) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected ROWSxCOLS, got `{s}`"))?;
    let m = m.trim().parse().map_err(|e| format!("bad row count `{m}`: {e}"))?;
    let n = n.trim().parse().map_err(|e| format!("bad column count `{n}`: {e}"))?;
    Ok((m, n))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let cfg = KernelConfig::default()
        .with_block_width(args.cb)
        .with_strategy(args.strategy);
    cfg.validate()?;
    let tol = Tolerance {
        rtol: args.rtol,
        atol: args.atol,
    };

    let a = match (&args.matrix, args.random) {
        (Some(path), _) => {
            println!("Loading matrix: {}", path.display());
            tessera_io::load_csr(path).with_context(|| format!("loading {}", path.display()))?
        }
        (None, Some((m, n))) => {
            println!("Generating random matrix: {m} x {n}, density {}", args.density);
            synth::random_csr(m, n, args.density, args.seed)?
        }
        (None, None) => bail!("pass --matrix <file.mtx> or --random ROWSxCOLS"),
    };
    println!(
        "Matrix size: {} x {}, NNZ = {}",
        a.nrows,
        a.ncols,
        a.nnz()
    );

    let x = vec![1.0f64; a.ncols];
    let (b, build_secs) = bench::time_once(|| build_blocked(&a, cfg.block_width));
    let b = b.context("building the blocked layout")?;
    let stats = block_stats(&b);
    println!(
        "Blocked build (one-time): {build_secs:.8} s | cb = {}, blocks = {} ({} empty), mean fan-in = {:.2}, max fan-in = {}",
        cfg.block_width, stats.nblocks, stats.empty_blocks, stats.mean_fan_in, stats.max_fan_in
    );
    info!("largest block holds {} nonzeros", stats.max_block_nnz);

    println!("\n--- PARALLEL SPMV BENCHMARK ---");
    let mut mismatches = 0usize;
    for &threads in &args.threads {
        let m = bench::run_with_threads(threads, &a, &b, &x, cfg.strategy, args.iters, tol)?;
        if !m.verdict.within_tolerance {
            mismatches += 1;
        }
        println!("{m}");
        let saved = m.naive_secs - m.blocked_secs;
        if saved > 0.0 {
            info!(
                "build cost amortized after ~{:.0} calls at {threads} threads",
                build_secs / saved
            );
        }
    }
    if mismatches > 0 {
        log::warn!("{mismatches} thread count(s) exceeded the tolerance");
    }
    Ok(())
}

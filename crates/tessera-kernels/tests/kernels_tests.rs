use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera_core::{Coo, Csr};
use tessera_kernels::*;

const EPS: f64 = 1e-9;

const PARALLEL: [Strategy; 3] = [Strategy::Atomic, Strategy::PrivateReduce, Strategy::Auto];

fn scenario_csr() -> Csr<f64, i64> {
    // A = [[2,0,1],[0,3,0],[4,0,5]]
    build_csr(
        3,
        3,
        5,
        &[(0, 0, 2.0), (0, 2, 1.0), (1, 1, 3.0), (2, 0, 4.0), (2, 2, 5.0)],
    )
    .unwrap()
}

fn random_csr(nrows: usize, ncols: usize, nnz: usize, seed: u64) -> Csr<f64, i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let triples: Vec<(usize, usize, f64)> = (0..nnz)
        .map(|_| {
            (
                rng.random_range(0..nrows),
                rng.random_range(0..ncols),
                rng.random_range(-1.0..1.0),
            )
        })
        .collect();
    build_csr(nrows, ncols, nnz, &triples).unwrap()
}

fn random_vec(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(-1.0..1.0)).collect()
}

fn assert_close(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_abs_diff_eq!(*x, *y, epsilon = EPS);
    }
}

#[test]
fn test_concrete_scenario_all_kernels() {
    let a = scenario_csr();
    let x = [1.0, 1.0, 1.0];
    let naive = spmv_csr(&a, &x).unwrap();
    assert_close(&naive, &[3.0, 3.0, 9.0]);
    for cb in [1, 2, 3] {
        let b = build_blocked(&a, cb).unwrap();
        assert_close(&spmv_blocked(&b, &x, false).unwrap(), &naive);
        assert_close(&spmv_blocked(&b, &x, true).unwrap(), &naive);
        for s in PARALLEL {
            assert_close(&spmv_blocked_with(&b, &x, s).unwrap(), &naive);
        }
    }
}

#[test]
fn test_csr_build_counts_rows() {
    let a = scenario_csr();
    assert_eq!(a.indptr, vec![0, 2, 3, 5]);
    assert_eq!(a.nnz(), 5);
    let mut a = a;
    a.sort_indices();
    assert_eq!(a.indices, vec![0, 2, 1, 0, 2]);
    assert_eq!(a.data, vec![2.0, 1.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_build_csr_rejects_bad_input() {
    let err = build_csr(2, 2, 3, &[(0, 0, 1.0)]).unwrap_err();
    assert!(err.is_format());
    let err = build_csr(2, 2, 1, &[(2, 0, 1.0)]).unwrap_err();
    assert!(err.is_format());
    let err = build_csr(0, 2, 0, &[]).unwrap_err();
    assert!(err.is_invalid_parameter());
}

#[test]
fn test_coo_to_csr_validates_unchecked_coo() {
    let a = Coo::from_parts_unchecked(2, 2, vec![0, 5], vec![0, 0], vec![1.0, 1.0]);
    assert!(coo_to_csr(&a).unwrap_err().is_format());
}

#[test]
fn test_conservation_through_both_builders() {
    let a = random_csr(500, 700, 6_000, 7);
    let total = sum_csr(&a);
    for cb in [1, 64, 4096] {
        let b = build_blocked(&a, cb).unwrap();
        assert_eq!(b.nnz(), a.nnz());
        assert_abs_diff_eq!(sum_blocked(&b), total, epsilon = 1e-9);
    }
}

#[test]
fn test_blocked_preserves_triples() {
    let a = random_csr(60, 90, 400, 11);
    let mut from_csr: Vec<(i64, i64, u64)> = {
        let c = csr_to_coo(&a);
        (0..c.nnz())
            .map(|k| (c.row[k], c.col[k], c.data[k].to_bits()))
            .collect()
    };
    from_csr.sort_unstable();
    for cb in [1, 7, 90, 1000] {
        let c = blocked_to_coo(&build_blocked(&a, cb).unwrap());
        let mut from_blocked: Vec<(i64, i64, u64)> = (0..c.nnz())
            .map(|k| (c.row[k], c.col[k], c.data[k].to_bits()))
            .collect();
        from_blocked.sort_unstable();
        assert_eq!(from_blocked, from_csr, "cb={cb}");
    }
}

#[test]
fn test_large_matrix_equivalence_parallel_paths() {
    // big enough to leave the sequential fast paths of both kernels
    let a = random_csr(20_000, 30_000, 300_000, 42);
    let x = random_vec(a.ncols, 43);
    let naive = spmv_csr(&a, &x).unwrap();
    for cb in [256, 4096] {
        let b = build_blocked(&a, cb).unwrap();
        assert_close(&spmv_blocked(&b, &x, false).unwrap(), &naive);
        for s in PARALLEL {
            assert_close(&spmv_blocked_with(&b, &x, s).unwrap(), &naive);
        }
    }
}

#[test]
fn test_parallel_runs_are_stable() {
    let a = random_csr(5_000, 5_000, 80_000, 3);
    let x = random_vec(a.ncols, 4);
    let b = build_blocked(&a, 512).unwrap();
    let naive = spmv_csr(&a, &x).unwrap();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    pool.install(|| {
        // blocks really are spread over several tasks
        let tasks = util::balanced_ranges(&b.block_ptr, util::task_nnz(b.nnz()));
        assert!(tasks.len() > 1, "tasks={}", tasks.len());
        for s in PARALLEL {
            let first = spmv_blocked_with(&b, &x, s).unwrap();
            assert_close(&first, &naive);
            for _ in 0..5 {
                assert_close(&spmv_blocked_with(&b, &x, s).unwrap(), &first);
            }
        }
    });
}

#[test]
fn test_zero_matrix() {
    let a = build_csr(4, 6, 0, &[]).unwrap();
    let x = [1.0; 6];
    assert_eq!(spmv_csr(&a, &x).unwrap(), vec![0.0; 4]);
    let b = build_blocked(&a, 2).unwrap();
    assert_eq!(b.block_ptr, vec![0, 0, 0, 0]);
    for s in [Strategy::Serial, Strategy::Atomic, Strategy::PrivateReduce] {
        assert_eq!(spmv_blocked_with(&b, &x, s).unwrap(), vec![0.0; 4]);
    }
}

#[test]
fn test_single_row_and_single_column() {
    let row = build_csr(1, 5, 3, &[(0, 4, 1.0), (0, 0, 2.0), (0, 2, 3.0)]).unwrap();
    let x = [1.0, 2.0, 3.0, 4.0, 5.0];
    let expect = spmv_csr(&row, &x).unwrap();
    assert_close(&expect, &[16.0]);
    for cb in [1, 2, 5] {
        let b = build_blocked(&row, cb).unwrap();
        for s in PARALLEL {
            assert_close(&spmv_blocked_with(&b, &x, s).unwrap(), &expect);
        }
    }

    let col = build_csr(4, 1, 3, &[(0, 0, 1.0), (3, 0, -2.0), (1, 0, 0.5)]).unwrap();
    let expect = [2.0, 1.0, 0.0, -4.0];
    assert_close(&spmv_csr(&col, &[2.0]).unwrap(), &expect);
    let b = build_blocked(&col, 1).unwrap();
    assert_eq!(b.nblocks(), 1);
    for s in PARALLEL {
        assert_close(&spmv_blocked_with(&b, &[2.0], s).unwrap(), &expect);
    }
}

#[test]
fn test_wide_block_is_single_block() {
    let a = scenario_csr();
    let b = build_blocked(&a, 10_000).unwrap();
    assert_eq!(b.nblocks(), 1);
    assert_eq!(b.block_ptr, vec![0, 5]);
}

#[test]
fn test_duplicates_accumulate() {
    let a = build_csr(
        2,
        2,
        4,
        &[(0, 1, 1.5), (0, 1, 2.5), (1, 0, 1.0), (1, 0, 1.0)],
    )
    .unwrap();
    let x = [10.0, 1.0];
    let expect = [4.0, 20.0];
    assert_close(&spmv_csr(&a, &x).unwrap(), &expect);
    for cb in [1, 2] {
        let b = build_blocked(&a, cb).unwrap();
        assert_eq!(b.nnz(), 4);
        assert_close(&spmv_blocked(&b, &x, false).unwrap(), &expect);
        for s in PARALLEL {
            assert_close(&spmv_blocked_with(&b, &x, s).unwrap(), &expect);
        }
    }
}

#[test]
fn test_dimension_mismatch_never_panics() {
    let a = scenario_csr();
    let b = build_blocked(&a, 2).unwrap();
    assert!(spmv_csr(&a, &[1.0; 2]).unwrap_err().is_dimension_mismatch());
    assert!(spmv_csr(&a, &[1.0; 4]).unwrap_err().is_dimension_mismatch());
    let mut short = vec![0.0; 2];
    assert!(spmv_csr_into(&a, &[1.0; 3], &mut short)
        .unwrap_err()
        .is_dimension_mismatch());
    for s in [Strategy::Serial, Strategy::Atomic, Strategy::PrivateReduce, Strategy::Auto] {
        assert!(spmv_blocked_with(&b, &[1.0; 2], s)
            .unwrap_err()
            .is_dimension_mismatch());
        let mut long = vec![0.0; 4];
        assert!(spmv_blocked_into(&b, &[1.0; 3], &mut long, s)
            .unwrap_err()
            .is_dimension_mismatch());
    }
}

#[test]
fn test_stats_and_config_drive_the_kernel() {
    let a = random_csr(300, 300, 2_000, 9);
    let cfg = KernelConfig::default()
        .with_block_width(32)
        .with_strategy(Strategy::PrivateReduce);
    cfg.validate().unwrap();
    let b = build_blocked(&a, cfg.block_width).unwrap();
    let stats = block_stats(&b);
    assert_eq!(stats.nblocks, 10);
    assert!(stats.max_fan_in <= stats.nblocks);
    assert!(stats.mean_fan_in >= 1.0);
    let x = random_vec(300, 10);
    let verdict = compare(
        &spmv_blocked_with(&b, &x, cfg.strategy).unwrap(),
        &spmv_csr(&a, &x).unwrap(),
        Tolerance::default(),
    )
    .unwrap();
    assert!(verdict.within_tolerance, "max diff {}", verdict.max_diff);
}

//! Correctness and invariant tests for logbin
//!
//! These tests verify the binning invariants, merge semantics, and edge cases
//! against direct batch computation. They complement the unit tests in each
//! module by focusing on properties that must always hold.
//!
//! Run with: cargo test --test correctness --features full

// Require all features
#[cfg(not(all(feature = "statistics", feature = "binning")))]
compile_error!(
    "Correctness tests require all features. Run: cargo test --test correctness --features full"
);

use logbin::binning::{combine, BinningTree, LevelAccumulator, PairAccumulator};
use logbin::statistics::{combine_moments, Moments};
use logbin::traits::{MergeError, QueryError, Sketch};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_close(actual: f64, expected: f64, what: &str) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "{}: got {}, expected {}",
        what,
        actual,
        expected
    );
}

/// Means of consecutive non-overlapping blocks of `2^level` values,
/// dropping an incomplete trailing block
fn block_means(raw: &[f64], level: usize) -> Vec<f64> {
    let size = 1usize << level;
    raw.chunks_exact(size)
        .map(|block| block.iter().sum::<f64>() / size as f64)
        .collect()
}

fn ar1_series(n: usize, phi: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = 0.0;
    (0..n)
        .map(|_| {
            let noise: f64 = rng.random::<f64>() - 0.5;
            x = phi * x + noise;
            x
        })
        .collect()
}

// ============================================================================
// Pair Accumulator
// ============================================================================

mod pair_accumulator {
    use super::*;

    #[test]
    fn square_term_uses_pair_local_mean() {
        let pair = combine(3.0, 11.0);
        assert_eq!(pair.promoted, 7.0);
        assert_eq!(pair.square, 32.0);
    }

    #[test]
    fn holds_at_most_one_value() {
        let mut pair = PairAccumulator::new();
        for i in 0..101 {
            pair.push(i as f64);
            assert_eq!(pair.is_pending(), i % 2 == 0);
        }
    }
}

// ============================================================================
// Moment combination
// ============================================================================

mod moments {
    use super::*;

    #[test]
    fn combine_is_associative_up_to_rounding() {
        let data = ar1_series(300, 0.5, 1);
        let (a, rest) = data.split_at(70);
        let (b, c) = rest.split_at(150);

        let ma: Moments<f64> = a.iter().copied().collect();
        let mb: Moments<f64> = b.iter().copied().collect();
        let mc: Moments<f64> = c.iter().copied().collect();

        let mut left = ma.clone();
        left.merge(&mb).unwrap();
        left.merge(&mc).unwrap();

        let mut right = mb.clone();
        right.merge(&mc).unwrap();
        let mut outer = ma.clone();
        outer.merge(&right).unwrap();

        assert_eq!(left.len(), outer.len());
        assert_close(left.mean().unwrap(), outer.mean().unwrap(), "mean");
        assert_close(left.m2(), outer.m2(), "m2");
    }

    #[test]
    fn combine_single_value_batch_is_welford() {
        let mut moments = Moments::from_parts(3, 2.0, 2.0);
        moments.push(6.0);

        let (n, mean, s) = combine_moments(3, 2.0, 2.0, 1, 6.0, 0.0);
        assert_eq!(n, 4);
        assert_close(mean, moments.mean().unwrap(), "mean");
        assert_close(s, moments.m2(), "m2");
    }
}

// ============================================================================
// Binning Tree
// ============================================================================

mod binning_tree {
    use super::*;

    #[test]
    fn level_zero_matches_batch() {
        let raw = ar1_series(1000, 0.8, 42);
        let tree: BinningTree<f64> = raw.iter().copied().collect();
        let batch: Moments<f64> = raw.iter().copied().collect();

        assert_close(tree.mean(0).unwrap(), batch.mean().unwrap(), "mean(0)");
        assert_close(tree.var(0).unwrap(), batch.sample_variance().unwrap(), "var(0)");
    }

    #[test]
    fn levels_match_block_means() {
        let raw = ar1_series(3000, 0.6, 7);
        let tree: BinningTree<f64> = raw.iter().copied().collect();

        for level in tree.levels() {
            let k = level.level();
            let blocks = block_means(&raw, k);
            assert_eq!(level.snapshot().received(), blocks.len() as u64, "level {}", k);

            let absorbed = &blocks[..level.absorbed() as usize];
            let batch: Moments<f64> = absorbed.iter().copied().collect();

            match level.mean() {
                Ok(mean) => assert_close(mean, batch.mean().unwrap(), "block mean"),
                Err(_) => assert!(absorbed.is_empty()),
            }
            match level.var() {
                Ok(var) => assert_close(var, batch.sample_variance().unwrap(), "block var"),
                Err(_) => assert!(level.nelements() < 2),
            }
            match (level.pending(), blocks.get(level.absorbed() as usize)) {
                (Some(pending), Some(&block)) => assert_close(pending, block, "pending block"),
                (None, None) => {}
                other => panic!("pending mismatch at level {}: {:?}", k, other),
            }
        }
    }

    #[test]
    fn pending_never_exceeds_one_and_levels_grow_monotonically() {
        let mut tree = BinningTree::new();
        let mut previous_levels = 0;

        for (i, value) in ar1_series(5000, 0.3, 3).into_iter().enumerate() {
            let deepest_pairs = tree
                .levels()
                .last()
                .map(LevelAccumulator::nelements)
                .unwrap_or(0);
            tree.push(value);

            let levels = tree.levels_count();
            assert!(levels >= previous_levels);
            assert!(levels <= previous_levels + 1, "after push {}", i + 1);
            if previous_levels > 0 && levels > previous_levels {
                // only a completed pair at the previous deepest level opens a new one
                let old_deepest = tree.level(previous_levels - 1).unwrap();
                assert_eq!(old_deepest.nelements(), deepest_pairs + 1);
            }
            previous_levels = levels;

            // the pending flags spell out the binary representation of the count
            let n = (i + 1) as u64;
            for level in tree.levels() {
                assert_eq!(level.is_pending(), (n >> level.level()) & 1 == 1);
            }
        }
    }

    #[test]
    fn insufficient_data_boundary() {
        let mut tree = BinningTree::new();
        assert!(matches!(tree.mean(0), Err(QueryError::LevelNotFound { .. })));

        tree.push(1.0);
        assert!(matches!(tree.mean(0), Err(QueryError::InsufficientData { .. })));

        tree.push(2.0);
        assert_eq!(tree.mean(0), Ok(1.5));
        assert!(matches!(tree.var(0), Err(QueryError::InsufficientData { .. })));

        tree.push(3.0);
        assert!(matches!(tree.var(0), Err(QueryError::InsufficientData { .. })));

        tree.push(4.0);
        assert_close(tree.var(0).unwrap(), 5.0 / 3.0, "var(0)");
    }

    #[test]
    fn out_of_range_level_is_not_found() {
        let tree: BinningTree<f64> = (0..10).map(f64::from).collect();
        assert_eq!(tree.levels_count(), 4);
        assert_eq!(
            tree.var(4),
            Err(QueryError::LevelNotFound { level: 4, levels: 4 })
        );
        assert!(tree.level(4).is_none());
    }

    #[test]
    fn errors_do_not_disturb_state() {
        let mut tree = BinningTree::new();
        let mut reference = BinningTree::new();
        for v in [1.0, 5.0, 2.0] {
            tree.push(v);
            reference.push(v);
            let _ = tree.var(0);
            let _ = tree.mean(9);
        }
        assert_eq!(tree, reference);
    }

    #[test]
    fn queries_are_idempotent() {
        let tree: BinningTree<f64> = ar1_series(777, 0.9, 11).into_iter().collect();
        for level in 0..tree.levels_count() {
            assert_eq!(tree.mean(level), tree.mean(level));
            assert_eq!(tree.var(level), tree.var(level));
            assert_eq!(tree.std_error(level), tree.std_error(level));
        }
    }

    #[test]
    fn correlated_stream_standard_error_grows_with_level() {
        let raw = ar1_series(1 << 16, 0.9, 2024);
        let tree: BinningTree<f64> = raw.into_iter().collect();

        let naive = tree.std_error(0).unwrap();
        let blocked = tree.std_error(8).unwrap();
        assert!(
            blocked > 2.0 * naive,
            "blocked stderr {} should exceed naive {}",
            blocked,
            naive
        );
    }

    #[test]
    fn uncorrelated_stream_standard_error_is_flat() {
        let raw = ar1_series(1 << 16, 0.0, 99);
        let tree: BinningTree<f64> = raw.into_iter().collect();

        let naive = tree.std_error(0).unwrap();
        let blocked = tree.std_error(5).unwrap();
        let ratio = blocked / naive;
        assert!(ratio > 0.8 && ratio < 1.2, "ratio {}", ratio);
    }

    #[test]
    fn works_with_f32() {
        let tree: BinningTree<f32> = [2.0f32, 4.0, 6.0, 8.0].into_iter().collect();
        assert_eq!(tree.mean(0), Ok(5.0));
        assert!((tree.var(0).unwrap() - 20.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn infinite_values_keep_structure_consistent() {
        let values = [
            1.0,
            f64::INFINITY,
            2.0,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            3.0,
            f64::MAX,
            f64::MAX,
            -f64::MAX,
            4.0,
        ];
        let mut tree = BinningTree::<f64>::new();
        for (i, &v) in values.iter().enumerate() {
            tree.push(v);
            let n = i as u64 + 1;
            assert_eq!(tree.len(), n);
            assert_eq!(tree.levels_count(), (64 - n.leading_zeros()) as usize);
            for level in tree.levels() {
                let bit = (n >> level.level()) & 1 == 1;
                assert_eq!(level.is_pending(), bit, "level {} after {} values", level.level(), n);
                assert_eq!(level.nelements(), n >> (level.level() + 1));
            }
        }

        // queries still answer, whatever the value
        for level in 0..tree.levels_count() {
            let _ = tree.mean(level);
            let _ = tree.var(level);
            let _ = tree.std_error(level);
        }
        assert_eq!(tree.summary().len(), tree.levels_count());
        assert!(tree.mean(0).is_ok());
    }
}

// ============================================================================
// Merging
// ============================================================================

mod merge {
    use super::*;

    #[test]
    fn merge_equivalent_to_sequential_push() {
        let raw = ar1_series(96, 0.7, 5);
        // 32 samples span 6 levels and 64 is a multiple of 2^6
        let (head, tail) = raw.split_at(64);

        let mut merged: BinningTree<f64> = head.iter().copied().collect();
        let second: BinningTree<f64> = tail.iter().copied().collect();
        merged.merge(&second).unwrap();

        let sequential: BinningTree<f64> = raw.iter().copied().collect();

        assert_eq!(merged.count(), sequential.count());
        assert_eq!(merged.levels_count(), sequential.levels_count());
        for (a, b) in merged.levels().iter().zip(sequential.levels()) {
            assert_eq!(a.nelements(), b.nelements());
            assert_eq!(a.pending(), b.pending());
            assert_close(a.sum(), b.sum(), "sum");
            assert_close(a.sum_squares(), b.sum_squares(), "sum_squares");
        }
    }

    #[test]
    fn merge_then_continue() {
        let raw = ar1_series(300, 0.2, 8);
        let mut merged: BinningTree<f64> = raw[..128].iter().copied().collect();
        let second: BinningTree<f64> = raw[128..200].iter().copied().collect();
        merged.merge(&second).unwrap();
        merged.extend(raw[200..].iter().copied());

        let sequential: BinningTree<f64> = raw.iter().copied().collect();
        assert_eq!(merged.count(), 300);
        for level in 0..sequential.levels_count() {
            if let Ok(expected) = sequential.var(level) {
                assert_close(merged.var(level).unwrap(), expected, "var");
            }
        }
    }

    #[test]
    fn misaligned_merge_is_rejected() {
        let mut first: BinningTree<f64> = (0..10).map(f64::from).collect();
        let second: BinningTree<f64> = (0..3).map(f64::from).collect();
        let before = first.clone();

        let err = first.merge(&second).unwrap_err();
        assert!(matches!(err, MergeError::IncompatibleConfig { .. }));
        assert_eq!(first, before);
    }

    #[test]
    fn merge_empty_into_empty() {
        let mut a = BinningTree::<f64>::new();
        a.merge(&BinningTree::new()).unwrap();
        assert!(a.is_empty());
    }
}

// ============================================================================
// Snapshots
// ============================================================================

mod snapshots {
    use super::*;

    #[test]
    fn restored_tree_continues_exactly() {
        let raw = ar1_series(500, 0.5, 13);
        let mut original: BinningTree<f64> = raw[..333].iter().copied().collect();
        let mut restored =
            BinningTree::from_snapshots(original.count(), &original.snapshot()).unwrap();

        original.extend(raw[333..].iter().copied());
        restored.extend(raw[333..].iter().copied());
        assert_eq!(restored, original);
    }

    #[test]
    fn tampered_snapshot_is_rejected() {
        let tree: BinningTree<f64> = (0..20).map(f64::from).collect();
        let mut levels = tree.snapshot();
        levels[1].nelements += 1;
        assert!(BinningTree::from_snapshots(tree.count(), &levels).is_err());

        let mut levels = tree.snapshot();
        levels.pop();
        assert!(BinningTree::from_snapshots(tree.count(), &levels).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let tree: BinningTree<f64> = ar1_series(123, 0.4, 21).into_iter().collect();
        let json = serde_json::to_string(&tree).unwrap();
        let back: BinningTree<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_inconsistent_state() {
        let json = r#"{"count":3,"levels":[{"level":0,"nelements":0,"sum":0.0,"sum_squares":0.0,"pending":1.0}]}"#;
        assert!(serde_json::from_str::<BinningTree<f64>>(json).is_err());
    }
}

// ============================================================================
// Properties
// ============================================================================

fn finite_vec(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-1e3f64..1e3, min_len..=max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn every_level_matches_its_block_sequence(raw in finite_vec(1, 300)) {
        let tree: BinningTree<f64> = raw.iter().copied().collect();
        prop_assert_eq!(tree.count(), raw.len() as u64);

        for level in tree.levels() {
            let blocks = block_means(&raw, level.level());
            let absorbed = &blocks[..level.absorbed() as usize];
            let batch: Moments<f64> = absorbed.iter().copied().collect();

            if let Ok(mean) = level.mean() {
                let expected = batch.mean().unwrap();
                prop_assert!((mean - expected).abs() <= 1e-9 * expected.abs().max(1.0));
            }
            if let Ok(var) = level.var() {
                let expected = batch.sample_variance().unwrap();
                prop_assert!((var - expected).abs() <= 1e-8 * expected.abs().max(1.0));
            }
            prop_assert!(level.sum_squares() >= 0.0);
        }
    }

    #[test]
    fn combine_moments_matches_single_pass(left in finite_vec(0, 50), right in finite_vec(0, 50)) {
        let a: Moments<f64> = left.iter().copied().collect();
        let b: Moments<f64> = right.iter().copied().collect();
        let all: Moments<f64> = left.iter().chain(right.iter()).copied().collect();

        let (n, mean, s) = combine_moments(
            a.len(),
            a.mean().unwrap_or(0.0),
            a.m2(),
            b.len(),
            b.mean().unwrap_or(0.0),
            b.m2(),
        );

        prop_assert_eq!(n, all.len());
        if let Some(expected) = all.mean() {
            prop_assert!((mean - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        }
        prop_assert!((s - all.m2()).abs() <= 1e-8 * all.m2().max(1.0));
    }
}

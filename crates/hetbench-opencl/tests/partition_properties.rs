//! Property-based tests for the partition planner.
//!
//! Invariants that must hold across all valid inputs:
//!
//! - Extents always sum to the total and are multiples of the block size.
//! - Ratio endpoints assign everything to one device.
//! - Misaligned totals are rejected deterministically, never truncated.

use hetbench_opencl::{EngineError, Partition};
use proptest::prelude::*;

fn arb_block() -> impl Strategy<Value = usize> {
    prop::sample::select(vec![16usize, 32, 64])
}

proptest! {
    #[test]
    fn extents_sum_and_align(
        blocks in 0usize..=256,
        ratio in 0.0f64..=1.0,
        block in arb_block(),
    ) {
        let total = blocks * block;
        let p = Partition::split(total, ratio, block).unwrap();
        prop_assert_eq!(p.first + p.second, total);
        prop_assert_eq!(p.first % block, 0);
        prop_assert_eq!(p.second % block, 0);
    }

    #[test]
    fn ratio_one_assigns_all_to_first(blocks in 0usize..=256, block in arb_block()) {
        let total = blocks * block;
        prop_assert_eq!(
            Partition::split(total, 1.0, block).unwrap(),
            Partition { first: total, second: 0 }
        );
    }

    #[test]
    fn ratio_zero_assigns_all_to_second(blocks in 0usize..=256, block in arb_block()) {
        let total = blocks * block;
        prop_assert_eq!(
            Partition::split(total, 0.0, block).unwrap(),
            Partition { first: 0, second: total }
        );
    }

    #[test]
    fn misaligned_total_always_rejected(
        blocks in 0usize..=256,
        offset in 1usize..16,
        ratio in 0.0f64..=1.0,
        block in arb_block(),
    ) {
        let total = blocks * block + offset;
        let err = Partition::split(total, ratio, block).unwrap_err();
        prop_assert!(
            matches!(err, EngineError::PartitionAlignment { .. }),
            "expected EngineError::PartitionAlignment, got {:?}",
            err
        );
    }

    #[test]
    fn split_is_a_pure_function(
        blocks in 0usize..=256,
        ratio in 0.0f64..=1.0,
        block in arb_block(),
    ) {
        let total = blocks * block;
        let first = Partition::split(total, ratio, block).unwrap();
        let second = Partition::split(total, ratio, block).unwrap();
        prop_assert_eq!(first, second);
    }
}

//! Pure row-extent partitioning between two devices.

use crate::error::{EngineError, Result};

/// Work-group edge for the 2-D GEMM kernels (16×16 groups).
pub const GEMM_BLOCK: usize = 16;
/// Work-group size for the 1-D Jacobi kernels.
pub const JACOBI_BLOCK: usize = 32;

/// A row extent divided between the first and second device.
///
/// Invariant: `first + second == total` and both extents are multiples of
/// the block size used to build the partition. A zero extent means that
/// device is skipped entirely for the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub first: usize,
    pub second: usize,
}

impl Partition {
    /// Split `total` rows by `ratio`, rounding the first extent down to a
    /// multiple of `block_size`.
    ///
    /// `first = floor(total·ratio / block_size) · block_size`,
    /// `second = total − first`. `ratio` is clamped to `[0, 1]`;
    /// `ratio = 1.0` yields `(total, 0)` and `ratio = 0.0` yields
    /// `(0, total)`. Deterministic for fixed inputs, no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PartitionAlignment`] when a resulting extent
    /// is nonzero but not a multiple of `block_size` (which happens exactly
    /// when `total` itself is misaligned), or when `block_size` is zero.
    /// Misaligned work is rejected, never redistributed.
    pub fn split(total: usize, ratio: f64, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(EngineError::PartitionAlignment { extent: total, block_size });
        }
        let ratio = ratio.clamp(0.0, 1.0);

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let blocks = (total as f64 * ratio / block_size as f64).floor() as usize;
        let first = blocks * block_size;
        let second = total - first;

        for extent in [first, second] {
            if extent != 0 && extent % block_size != 0 {
                return Err(EngineError::PartitionAlignment { extent, block_size });
            }
        }
        Ok(Self { first, second })
    }

    /// Total extent covered by both devices.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.first + self.second
    }

    /// True when only one device receives work.
    #[must_use]
    pub const fn is_single_device(&self) -> bool {
        self.first == 0 || self.second == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_ratio_assigns_everything_to_first() {
        let p = Partition::split(1600, 1.0, GEMM_BLOCK).unwrap();
        assert_eq!(p, Partition { first: 1600, second: 0 });
    }

    #[test]
    fn zero_ratio_assigns_everything_to_second() {
        let p = Partition::split(1600, 0.0, GEMM_BLOCK).unwrap();
        assert_eq!(p, Partition { first: 0, second: 1600 });
    }

    #[test]
    fn half_ratio_splits_evenly_when_aligned() {
        let p = Partition::split(6400, 0.5, JACOBI_BLOCK).unwrap();
        assert_eq!(p, Partition { first: 3200, second: 3200 });
        assert!(!p.is_single_device());
    }

    #[test]
    fn first_extent_rounds_down_to_block() {
        // 6400 · 0.0025 = 16 → exactly one 16-row block.
        let p = Partition::split(6400, 0.0025, GEMM_BLOCK).unwrap();
        assert_eq!(p, Partition { first: 16, second: 6384 });

        // 1600 · 0.0025 = 4 → rounds down to an empty first partition.
        let p = Partition::split(1600, 0.0025, GEMM_BLOCK).unwrap();
        assert_eq!(p, Partition { first: 0, second: 1600 });
    }

    #[test]
    fn misaligned_total_is_rejected_not_truncated() {
        let err = Partition::split(1000, 0.5, JACOBI_BLOCK).unwrap_err();
        match err {
            crate::EngineError::PartitionAlignment { extent, block_size } => {
                assert_ne!(extent % block_size, 0);
                assert_eq!(block_size, JACOBI_BLOCK);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_block_size_is_rejected() {
        assert!(Partition::split(64, 0.5, 0).is_err());
    }

    #[test]
    fn out_of_range_ratio_is_clamped() {
        assert_eq!(Partition::split(64, 2.0, 32).unwrap(), Partition { first: 64, second: 0 });
        assert_eq!(Partition::split(64, -1.0, 32).unwrap(), Partition { first: 0, second: 64 });
    }

    #[test]
    fn split_is_deterministic() {
        for _ in 0..10 {
            assert_eq!(
                Partition::split(4800, 0.37, JACOBI_BLOCK).unwrap(),
                Partition::split(4800, 0.37, JACOBI_BLOCK).unwrap(),
            );
        }
    }
}

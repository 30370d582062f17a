//! Device-reported kernel timing, accumulated across launches and rounds.

use crate::error::{EngineError, Result};
use opencl3::event::Event;

/// Accumulates device-reported kernel durations at nanosecond resolution.
///
/// Each launch contributes its profiling start→end span; sums across both
/// devices and all rounds. Wall-clock time is measured independently by
/// the dispatchers; the gap between the two is the benchmark's output
/// signal (host orchestration + transfer cost).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KernelTimer {
    elapsed_ns: u64,
    launches: u32,
}

impl KernelTimer {
    /// Record one completed launch from its profiling timestamps.
    ///
    /// # Errors
    ///
    /// [`EngineError::ResourceCreation`] if the profiling query fails
    /// (e.g. the queue was not created with profiling enabled).
    pub fn record(&mut self, event: &Event) -> Result<()> {
        let start = event
            .profiling_command_start()
            .map_err(|e| EngineError::cl("profiling_command_start", e))?;
        let end =
            event.profiling_command_end().map_err(|e| EngineError::cl("profiling_command_end", e))?;
        self.accumulate(end.saturating_sub(start));
        Ok(())
    }

    pub(crate) fn accumulate(&mut self, nanoseconds: u64) {
        self.elapsed_ns += nanoseconds;
        self.launches += 1;
    }

    /// Total device time in nanoseconds.
    #[must_use]
    pub const fn nanoseconds(&self) -> u64 {
        self.elapsed_ns
    }

    /// Total device time in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds(&self) -> f64 {
        self.elapsed_ns as f64 / 1e9
    }

    /// Number of launches recorded.
    #[must_use]
    pub const fn launches(&self) -> u32 {
        self.launches
    }
}

/// Timing pair returned by the iterative solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveTiming {
    /// Sum of device-reported kernel times across all rounds and devices.
    pub device_seconds: f64,
    /// Host-measured elapsed time for the whole solve, transfers included.
    pub wall_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_across_launches() {
        let mut timer = KernelTimer::default();
        timer.accumulate(1_500_000);
        timer.accumulate(500_000);
        assert_eq!(timer.nanoseconds(), 2_000_000);
        assert_eq!(timer.launches(), 2);
    }

    #[test]
    fn seconds_conversion() {
        let mut timer = KernelTimer::default();
        timer.accumulate(2_500_000_000);
        assert!((timer.seconds() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn default_is_zero() {
        let timer = KernelTimer::default();
        assert_eq!(timer.nanoseconds(), 0);
        assert_eq!(timer.launches(), 0);
        assert_eq!(timer.seconds(), 0.0);
    }
}

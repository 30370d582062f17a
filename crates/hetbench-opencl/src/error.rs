//! Error taxonomy for the partitioned execution engine.
//!
//! All four variants are configuration/setup failures that abort the whole
//! call; the engine surfaces them as typed errors and never terminates the
//! process itself. Exceeding the solver's iteration cap is *not* an error
//! and is reported through [`crate::jacobi::JacobiRun::converged`] instead.

/// Errors produced while setting up or driving a partitioned dispatch.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An OpenCL resource (context, queue, program, kernel, buffer) could
    /// not be created, or a device-API call (enqueue, wait, profiling
    /// query) failed. `stage` names the failing call.
    #[error("{stage} failed: {reason}")]
    ResourceCreation { stage: &'static str, reason: String },

    /// The kernel source was rejected by the device compiler.
    #[error("kernel '{entry_point}' failed to build: {log}")]
    Compilation { entry_point: String, log: String },

    /// A partition extent is nonzero but not a multiple of the block size.
    /// Misaligned work is rejected outright, never rounded or truncated.
    #[error("extent {extent} is not a multiple of block size {block_size}")]
    PartitionAlignment { extent: usize, block_size: usize },

    /// The solver's input matrix is not weakly diagonally dominant, so
    /// Jacobi convergence is not guaranteed; the solve is not attempted.
    #[error("matrix is not diagonally dominant at row {row}")]
    ConvergencePrecheck { row: usize },
}

impl EngineError {
    /// Map an OpenCL API failure to [`EngineError::ResourceCreation`],
    /// naming the failing call.
    pub(crate) fn cl(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self::ResourceCreation { stage, reason: err.to_string() }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_error_display_names_both_numbers() {
        let e = EngineError::PartitionAlignment { extent: 100, block_size: 32 };
        assert_eq!(e.to_string(), "extent 100 is not a multiple of block size 32");
    }

    #[test]
    fn precheck_error_display_names_row() {
        let e = EngineError::ConvergencePrecheck { row: 7 };
        assert!(e.to_string().contains("row 7"));
    }

    #[test]
    fn cl_helper_carries_stage_and_reason() {
        let e = EngineError::cl("create_context", "CL_OUT_OF_HOST_MEMORY");
        assert_eq!(e.to_string(), "create_context failed: CL_OUT_OF_HOST_MEMORY");
    }
}

//! Top-level error taxonomy surfaced to the host through a `FrameHandle`.

use thiserror::Error;

/// Errors a host can observe from [`crate::scheduler::submit_frame`].
///
/// `TileComputationFailed` and `Cancelled` are recoverable at the frame
/// level (a failed tile is painted as a diagnostic color and the frame
/// continues; a cancelled frame is not a failure at all) and are only
/// ever logged, never bubbled through `await_done()`. The other three
/// variants are frame-fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The viewport's required precision exceeds the configured HPFloat
    /// budget for this frame.
    #[error("required precision exceeds configured maximum: {0}")]
    PrecisionBudgetExhausted(#[from] fractalwonder_core::Error),

    /// The reference orbit could not be built at the required precision.
    #[error("reference orbit computation failed: {0}")]
    ReferenceOrbitFailed(#[from] fractalwonder_compute::Error),

    /// A worker panicked or returned an invalid result for one tile.
    /// Recovered locally: the tile is painted as a diagnostic color and
    /// the frame proceeds.
    #[error("tile ({x}, {y}) {width}x{height} failed: {reason}")]
    TileComputationFailed {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        reason: String,
    },

    /// Not truly an error: the frame was superseded by a newer request
    /// before it completed.
    #[error("frame {frame_id} cancelled")]
    Cancelled { frame_id: u64 },

    /// Rejected at `submit_frame` before any work is scheduled.
    #[error("invalid frame request: {reason}")]
    InvalidRequest { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_computation_failed_message_includes_coordinates() {
        let err = EngineError::TileComputationFailed {
            x: 10,
            y: 20,
            width: 64,
            height: 64,
            reason: "panic".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("10"));
        assert!(message.contains("panic"));
    }

    #[test]
    fn cancelled_message_includes_frame_id() {
        let err = EngineError::Cancelled { frame_id: 7 };
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn invalid_request_message_includes_reason() {
        let err = EngineError::InvalidRequest {
            reason: "zero-sized canvas".to_string(),
        };
        assert!(err.to_string().contains("zero-sized canvas"));
    }

    #[test]
    fn precision_budget_exhausted_wraps_core_error() {
        let core_err = fractalwonder_core::Error::PrecisionBudgetExceeded {
            requested: 8192,
            maximum: 4096,
        };
        let engine_err: EngineError = core_err.into();
        assert!(matches!(
            engine_err,
            EngineError::PrecisionBudgetExhausted(_)
        ));
    }

    #[test]
    fn reference_orbit_failed_wraps_compute_error() {
        let compute_err = fractalwonder_compute::Error::ReferenceOrbitFailed {
            reason: "out of memory".to_string(),
        };
        let engine_err: EngineError = compute_err.into();
        assert!(matches!(engine_err, EngineError::ReferenceOrbitFailed(_)));
    }
}

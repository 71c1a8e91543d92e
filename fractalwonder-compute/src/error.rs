//! Failures that can occur while computing a reference orbit or tile.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The reference orbit escaped before producing a single usable point
    /// (e.g. a reference point chosen outside the configured precision
    /// budget, or zero iterations requested).
    #[error("reference orbit computation failed: {reason}")]
    ReferenceOrbitFailed { reason: String },

    /// A tile could not be rendered, e.g. zero-sized tile dimensions.
    #[error("tile computation failed: {reason}")]
    TileComputationFailed { reason: String },
}

// src/utils/error.rs

use thiserror::Error;

/// The primary error type for the spot compositing engine.
///
/// Most degenerate inputs are recovered locally (clamped configuration,
/// empty geometry, skipped refinements). What remains here are contract
/// violations at the compositor entry and failures reported by
/// collaborators, which callers decide how to handle.
#[derive(Error, Debug)]
pub enum SpotError {
    /// Occurs when buffer dimensions do not match the expected dimensions.
    #[error("Dimension mismatch: expected ({}, {}), but got ({}, {})", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// An invalid argument was provided to a function.
    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    /// A scratch buffer could not be reserved.
    #[error("Failed to allocate {bytes} bytes for a scratch buffer")]
    Allocation { bytes: usize },

    /// The region does not fit inside the working buffer.
    #[error("Region {region:?} lies outside a {width}x{height} buffer")]
    RegionOutOfBounds {
        region: (i32, i32, u32, u32),
        width: usize,
        height: usize,
    },

    /// An external effect failed to produce its buffer.
    #[error("Effect error: {0}")]
    Effect(String),
}

/// A specialized `Result` type for spot operations.
pub type Result<T> = std::result::Result<T, SpotError>;

impl SpotError {
    /// Builds a `DimensionMismatch` from `(width, height)` pairs.
    pub fn mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        SpotError::DimensionMismatch { expected, actual }
    }

    /// True for failures that only cost an optional refinement step.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SpotError::Allocation { .. } | SpotError::Effect(_))
    }
}

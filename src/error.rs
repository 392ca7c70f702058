//! Error taxonomy.
//!
//! Only precondition and integrity failures ever surface as `Err`. Numerical
//! degeneracy, CG non-convergence, and oscillation are local, tolerated
//! conditions — they are logged via `tracing` and folded into the returned
//! `PlacementReport` instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlacerError {
    /// A precondition failed before any work started: empty block list,
    /// empty net list, an invalid (zero-area or inverted) region, or a
    /// non-positive iteration cap in the configuration.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// An integrity invariant was violated mid-run in a way that indicates
    /// miscomputation rather than a tolerable numerical wobble: fixed-block
    /// area exceeding a bin's white space, or triplet-reservation capacity
    /// overflowing by more than 2x the estimate.
    #[error("integrity violation: {0}")]
    Integrity(String),
}

pub type Result<T> = std::result::Result<T, PlacerError>;

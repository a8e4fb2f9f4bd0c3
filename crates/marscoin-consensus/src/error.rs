//! Error types for consensus validation.

use thiserror::Error;

/// Consensus validation errors.
///
/// Chain-shape preconditions (missing tip, chain shorter than a retarget
/// window) are not errors: the retargeting functions fall back to the
/// proof-of-work limit for those, matching the historical chain. An `Err`
/// from this crate means the block index itself is inconsistent and the
/// candidate block must not be validated against it.
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// The ASERT anchor block could not be reached by walking back from a
    /// tip that is at or above the anchor height.
    #[error("ASERT anchor at height {anchor_height} unreachable from tip at height {tip_height}")]
    AnchorNotFound {
        anchor_height: i32,
        tip_height: i32,
    },

    /// The ASERT anchor carries a target that is zero or above the
    /// proof-of-work limit.
    #[error("ASERT anchor target 0x{n_bits:08x} outside (0, pow_limit]")]
    InvalidAnchorTarget { n_bits: u32 },

    /// The tip's deviation from the ideal block schedule exceeds the range
    /// the fixed-point exponent can represent.
    #[error("ASERT schedule deviation {deviation} exceeds exponent range")]
    ExponentOutOfRange { deviation: i64 },

    /// The anchor is above the block it is supposed to schedule.
    #[error("negative ASERT height delta {height_diff}")]
    NegativeHeightDelta { height_diff: i64 },
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;

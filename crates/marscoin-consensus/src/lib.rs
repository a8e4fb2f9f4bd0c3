//! # marscoin-consensus
//!
//! Proof-of-work consensus rules for the Marscoin blockchain.
//!
//! This crate provides:
//! - Compact difficulty target encoding/decoding (Bitcoin-style `nBits`)
//! - The four height-activated retargeting algorithms (legacy interval
//!   retarget, DarkGravityWave v2/v3, ASERT) and their dispatch
//! - Proof-of-work validation against the target
//! - Per-block work for cumulative chain-work accounting
//!
//! ## Mars-time schedule
//!
//! Marscoin retargets on Mars time: one sol is 88,775 seconds and blocks
//! arrive every two Mars minutes (123 seconds) after the second fork. The
//! retargeting algorithm changed three times over the chain's history, and
//! each revision must be reproduced bit-for-bit; see [`difficulty`] for the
//! dispatch rules.
//!
//! The crate holds no chain state. Callers provide a read-only
//! [`chain::ChainView`] over their block index and an immutable
//! [`chain_params::ChainParams`] for the network being validated.

mod arith;
pub mod asert;
pub mod chain;
mod chain_params;
pub mod compact;
pub mod difficulty;
pub mod gravity_wave;
mod pow;

mod error;

#[cfg(test)]
mod pow_test_vectors;

pub use arith::U256;
pub use asert::{calculate_asert, next_asert_work_required, reset_asert_anchor_cache};
pub use chain::{BlockIndex, ChainView, MemoryChain};
pub use chain_params::{ChainParams, ChainParamsConfig, ChainParamsError, POW_LIMIT};
pub use compact::{decode_compact_bits, encode_compact_bits, DecodedTarget};
pub use difficulty::{
    algorithm_for_height, difficulty_adjustment_interval, next_work_required,
    permitted_difficulty_transition, RetargetAlgorithm,
};
pub use error::{ConsensusError, ConsensusResult};
pub use gravity_wave::{dark_gravity_wave2, dark_gravity_wave3};
pub use pow::{block_proof, check_proof_of_work};

/// Constants frozen into deployed consensus.
///
/// These are not chain parameters: changing any of them forks the chain, so
/// they are deliberately not part of [`ChainParams`].
pub mod params {
    /// Seconds in one Mars solar day.
    pub const SOL_SECONDS: i64 = 88_775;

    /// Two Mars minutes; the block spacing after fork two and the ideal
    /// spacing hard-coded into the DarkGravityWave and ASERT algorithms.
    pub const MARS_BLOCK_SPACING_SECS: i64 = 123;

    /// Blocks per sol on the Mars-minute schedule (the post-fork-two
    /// retarget interval).
    pub const BLOCKS_PER_SOL: i64 = SOL_SECONDS / MARS_BLOCK_SPACING_SECS;

    /// Fewest blocks DarkGravityWave v2 averages over.
    pub const DGW2_PAST_BLOCKS_MIN: i64 = 14;

    /// Most blocks DarkGravityWave v2 averages over.
    pub const DGW2_PAST_BLOCKS_MAX: i64 = 140;

    /// Fixed DarkGravityWave v3 window.
    pub const DGW3_PAST_BLOCKS: i64 = 24;

}

//! Difficulty dispatch and the legacy interval retarget.
//!
//! Marscoin changed its retargeting rules three times. Which algorithm
//! governs a block is a pure function of its height, and all four must be
//! reproduced bit-for-bit: the legacy Bitcoin-style interval retarget
//! (itself re-parameterized at two fork heights), DarkGravityWave v2 and v3,
//! and ASERT.

use tracing::debug;

use crate::arith::U256;
use crate::asert::next_asert_work_required;
use crate::chain::{BlockIndex, ChainView};
use crate::chain_params::ChainParams;
use crate::compact::{decode_compact_bits, encode_compact_bits};
use crate::error::ConsensusResult;
use crate::gravity_wave::{dark_gravity_wave2, dark_gravity_wave3};
use crate::params::{MARS_BLOCK_SPACING_SECS, SOL_SECONDS};

/// The retargeting algorithm governing a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetAlgorithm {
    /// Bitcoin-style interval retarget with Mars fork adjustments.
    V1,
    /// DarkGravityWave v2: 14-140 block smart average.
    Dgw2,
    /// DarkGravityWave v3: 24-block moving average.
    Dgw3,
    /// Absolutely Scheduled Exponentially weighted Rising Target.
    Asert,
}

/// Select the algorithm for the block at `height`.
///
/// Non-standard chains never left the legacy algorithm.
pub fn algorithm_for_height(params: &ChainParams, height: i32) -> RetargetAlgorithm {
    if !params.require_standard {
        return RetargetAlgorithm::V1;
    }
    if height >= params.asert_activation_height {
        RetargetAlgorithm::Asert
    } else if height >= params.dgw3_activation_height {
        RetargetAlgorithm::Dgw3
    } else if height >= params.dgw_activation_height {
        RetargetAlgorithm::Dgw2
    } else {
        RetargetAlgorithm::V1
    }
}

/// Legacy retarget parameters in force at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetargetSchedule {
    pub spacing: i64,
    pub timespan: i64,
    pub interval: i64,
}

/// The spacing/timespan/interval triple the legacy algorithm uses at
/// `height`.
///
/// Fork one moved the retarget timespan to one sol without touching the
/// interval; fork two moved spacing to two Mars minutes and recomputed the
/// interval from the sol timespan, giving 721-block retarget periods.
pub(crate) fn retarget_schedule(params: &ChainParams, height: i32) -> RetargetSchedule {
    let mut spacing = params.target_spacing_secs;
    let mut timespan = params.target_timespan_secs;
    let mut interval = params.target_timespan_secs / params.target_spacing_secs;

    if height >= params.fork_one_height {
        timespan = SOL_SECONDS;
    }
    if height >= params.fork_two_height {
        timespan = SOL_SECONDS;
        spacing = MARS_BLOCK_SPACING_SECS;
        interval = timespan / spacing;
    }

    RetargetSchedule {
        spacing,
        timespan,
        interval,
    }
}

/// Number of blocks between legacy retargets at `height`.
pub fn difficulty_adjustment_interval(params: &ChainParams, height: i32) -> i64 {
    retarget_schedule(params, height).interval
}

/// Compute the compact target required of the block following `tip`.
///
/// `header_time` is the candidate block's timestamp; only the testnet
/// minimum-difficulty rule reads it. A missing tip (validating genesis)
/// yields the proof-of-work limit.
pub fn next_work_required<C: ChainView + ?Sized>(
    tip: Option<&BlockIndex>,
    header_time: i64,
    params: &ChainParams,
    chain: &C,
) -> ConsensusResult<u32> {
    let tip = match tip {
        Some(tip) => tip,
        None => return Ok(params.pow_limit_bits()),
    };

    if params.no_retargeting {
        return Ok(tip.n_bits);
    }

    match algorithm_for_height(params, tip.height + 1) {
        RetargetAlgorithm::V1 => next_work_required_v1(tip, header_time, params, chain),
        RetargetAlgorithm::Dgw2 => Ok(dark_gravity_wave2(tip, params, chain)),
        RetargetAlgorithm::Dgw3 => Ok(dark_gravity_wave3(tip, params, chain)),
        RetargetAlgorithm::Asert => next_asert_work_required(tip, params, chain),
    }
}

/// Legacy Bitcoin-style retarget.
///
/// Between interval boundaries the tip's bits carry over (testnet may
/// substitute the minimum difficulty). At a boundary, the target scales by
/// the observed timespan over the scheduled timespan, bounded to a factor
/// of four either way.
pub fn next_work_required_v1<C: ChainView + ?Sized>(
    tip: &BlockIndex,
    header_time: i64,
    params: &ChainParams,
    chain: &C,
) -> ConsensusResult<u32> {
    let pow_limit_bits = params.pow_limit_bits();
    let height = tip.height + 1;
    let schedule = retarget_schedule(params, height);

    // Only change once per interval.
    if i64::from(height) % schedule.interval != 0 {
        if params.allow_min_difficulty {
            // Testnet: a block more than twice the spacing late may be mined
            // at minimum difficulty.
            if header_time > tip.time + schedule.spacing * 2 {
                return Ok(pow_limit_bits);
            }
            // Otherwise report the last non-minimum difficulty on the
            // current interval.
            let mut index = *tip;
            while i64::from(index.height) % schedule.interval != 0
                && index.n_bits == pow_limit_bits
            {
                match chain.get_prev(&index) {
                    Some(prev) => index = prev,
                    None => break,
                }
            }
            return Ok(index.n_bits);
        }
        return Ok(tip.n_bits);
    }

    // Walk the full interval, except on the very first retarget, where the
    // interval spans genesis and is one block short. Going back the full
    // period otherwise prevents difficulty manipulation across the boundary.
    let blocks_to_go_back = if i64::from(height) == schedule.interval {
        schedule.interval - 1
    } else {
        schedule.interval
    };

    let mut first = *tip;
    for _ in 0..blocks_to_go_back {
        match chain.get_prev(&first) {
            Some(prev) => first = prev,
            None => return Ok(pow_limit_bits),
        }
    }

    let actual_timespan =
        (tip.time - first.time).clamp(schedule.timespan / 4, schedule.timespan * 4);

    let old = decode_compact_bits(tip.n_bits).target;
    let mut new = old;
    // The intermediate product can overflow 256 bits by one bit; drop the
    // low bit for the division and restore it after.
    let shifted = new.bits() > 235;
    if shifted {
        new = new >> 1;
    }
    new = new * U256::from(actual_timespan as u64);
    new = new / U256::from(schedule.timespan as u64);
    if shifted {
        new = new << 1;
    }

    if new > params.pow_limit {
        new = params.pow_limit;
    }

    let new_bits = encode_compact_bits(new);
    debug!(
        height,
        actual_timespan,
        target_timespan = schedule.timespan,
        before = format!("0x{:08x}", tip.n_bits),
        after = format!("0x{:08x}", new_bits),
        "legacy retarget"
    );

    Ok(new_bits)
}

/// Check a claimed difficulty transition under the legacy rules.
///
/// At interval boundaries the new target must lie within the four-fold
/// timespan bounds derived from the old one; elsewhere the bits must not
/// change. Chains that allow minimum-difficulty blocks cannot enforce
/// either. Only meaningful while the legacy algorithm governs `height`.
pub fn permitted_difficulty_transition(
    params: &ChainParams,
    height: i32,
    old_bits: u32,
    new_bits: u32,
) -> bool {
    if params.allow_min_difficulty {
        return true;
    }

    let schedule = retarget_schedule(params, height);
    if i64::from(height) % schedule.interval != 0 {
        return old_bits == new_bits;
    }

    let observed = decode_compact_bits(new_bits).target;
    let old = decode_compact_bits(old_bits).target;

    // Headers checked here may predate the proof-of-work check, so the
    // products truncate to 256 bits like the lineage arithmetic instead of
    // panicking.
    let largest_timespan = schedule.timespan * 4;
    let smallest_timespan = schedule.timespan / 4;

    let mut largest = old.overflowing_mul(U256::from(largest_timespan as u64)).0
        / U256::from(schedule.timespan as u64);
    if largest > params.pow_limit {
        largest = params.pow_limit;
    }
    // Compare against what a compact encoding can actually express.
    let maximum = decode_compact_bits(encode_compact_bits(largest)).target;
    if observed > maximum {
        return false;
    }

    let smallest = old.overflowing_mul(U256::from(smallest_timespan as u64)).0
        / U256::from(schedule.timespan as u64);
    let minimum = decode_compact_bits(encode_compact_bits(smallest)).target;
    if observed < minimum {
        return false;
    }

    true
}

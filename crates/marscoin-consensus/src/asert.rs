//! ASERT: absolutely scheduled exponentially weighted rising target.
//!
//! The target for a block is an exponential function of how far the chain
//! tip has drifted from an ideal one-block-per-123-seconds schedule anchored
//! at a fixed historical block:
//!
//! ```text
//! next = anchor_target * 2^((time_diff - 123 * (height_diff + 1)) / half_life)
//! ```
//!
//! evaluated in 16.16 fixed point with a cubic approximation of `2^x` on the
//! fractional part. Every shift and truncation below is consensus-critical.

use parking_lot::Mutex;
use tracing::debug;

use crate::arith::U256;
use crate::chain::{BlockIndex, ChainView};
use crate::chain_params::ChainParams;
use crate::compact::{decode_compact_bits, encode_compact_bits};
use crate::error::{ConsensusError, ConsensusResult};
use crate::params::MARS_BLOCK_SPACING_SECS;

/// Cached ASERT anchor, keyed by the chain view generation it was found
/// under. One writer fills it the first time a tip past the anchor is
/// validated; later lookups on the same block tree reuse it.
static ANCHOR_CACHE: Mutex<Option<(u64, BlockIndex)>> = Mutex::new(None);

/// Drop the cached anchor. Must be called when the block tree is destroyed
/// or rebuilt under an unchanged generation.
pub fn reset_asert_anchor_cache() {
    *ANCHOR_CACHE.lock() = None;
}

/// The cached anchor, if any. Test hook.
pub fn asert_anchor_cache() -> Option<BlockIndex> {
    ANCHOR_CACHE.lock().map(|(_, anchor)| anchor)
}

/// Locate the anchor block by walking back from `tip`.
///
/// The caller guarantees `tip.height >= params.asert_anchor_height`; failing
/// to reach the anchor from there means the block index is corrupt.
fn asert_anchor_block<C: ChainView + ?Sized>(
    tip: &BlockIndex,
    params: &ChainParams,
    chain: &C,
) -> ConsensusResult<BlockIndex> {
    let generation = chain.generation();
    if let Some((cached_generation, anchor)) = *ANCHOR_CACHE.lock() {
        if cached_generation == generation
            && anchor.height == params.asert_anchor_height
            && anchor.height <= tip.height
        {
            return Ok(anchor);
        }
    }

    let not_found = || ConsensusError::AnchorNotFound {
        anchor_height: params.asert_anchor_height,
        tip_height: tip.height,
    };

    let mut anchor = *tip;
    while anchor.height > params.asert_anchor_height {
        anchor = chain.get_prev(&anchor).ok_or_else(not_found)?;
    }
    if anchor.height != params.asert_anchor_height {
        return Err(not_found());
    }

    *ANCHOR_CACHE.lock() = Some((generation, anchor));
    Ok(anchor)
}

/// Compute the ASERT-required compact target for the block following `tip`.
///
/// Tips below the anchor height fall back to the proof-of-work limit; the
/// algorithm only governs heights past its activation, which is above the
/// anchor on every network.
pub fn next_asert_work_required<C: ChainView + ?Sized>(
    tip: &BlockIndex,
    params: &ChainParams,
    chain: &C,
) -> ConsensusResult<u32> {
    if tip.height < params.asert_anchor_height {
        return Ok(params.pow_limit_bits());
    }

    let anchor = asert_anchor_block(tip, params, chain)?;

    // The schedule origin is the timestamp of the anchor's parent (the
    // absolute formulation of ASERT), or the anchor itself if it is genesis.
    let anchor_time = match chain.get_prev(&anchor) {
        Some(parent) => parent.time,
        None => anchor.time,
    };

    let time_diff = tip.time - anchor_time;
    let height_diff = i64::from(tip.height) - i64::from(anchor.height);

    let ref_target = decode_compact_bits(anchor.n_bits);
    if ref_target.negative || ref_target.overflow {
        return Err(ConsensusError::InvalidAnchorTarget {
            n_bits: anchor.n_bits,
        });
    }

    let next_target = calculate_asert(
        ref_target.target,
        MARS_BLOCK_SPACING_SECS,
        time_diff,
        height_diff,
        params.pow_limit,
        params.asert_half_life_secs,
    )?;

    Ok(encode_compact_bits(next_target))
}

/// The ASERT target adaptation. Clamps to `pow_limit`.
///
/// `time_diff` is measured from the anchor parent's timestamp to the tip's;
/// `height_diff` from the anchor to the tip.
pub fn calculate_asert(
    ref_target: U256,
    spacing: i64,
    time_diff: i64,
    height_diff: i64,
    pow_limit: U256,
    half_life: i64,
) -> ConsensusResult<U256> {
    // The anchor target must itself be a valid chain target.
    if ref_target.is_zero() || ref_target > pow_limit {
        return Err(ConsensusError::InvalidAnchorTarget {
            n_bits: encode_compact_bits(ref_target),
        });
    }
    if height_diff < 0 {
        return Err(ConsensusError::NegativeHeightDelta { height_diff });
    }

    // Guard the fixed-point multiply below: the schedule deviation must
    // leave 16 bits of headroom in an i64.
    let numerator = time_diff - spacing * (height_diff + 1);
    if numerator.unsigned_abs() >= 1 << 47 {
        return Err(ConsensusError::ExponentOutOfRange {
            deviation: numerator,
        });
    }

    // 16.16 fixed-point exponent. The division truncates toward zero;
    // deployed consensus depends on exactly that rounding.
    let exponent = (numerator * 65536) / half_life;

    // 2^x = 2 * 2^(x-1): split into whole-power shifts and a fractional
    // part in [0, 65536). The split needs an arithmetic (floor) shift,
    // which Rust guarantees for signed integers.
    let shifts = exponent >> 16;
    let frac = (exponent & 0xffff) as u64;
    debug_assert_eq!(exponent, shifts * 65536 + frac as i64);

    // target * 65536 * 2^(frac/65536), with
    // 2^x ~= 1 + 0.695502049*x + 0.2262698*x^2 + 0.0782318*x^3 on [0, 1).
    // Error versus 2^x is below 0.013%. All terms fit an u64.
    let factor: u64 = 65536
        + ((195_766_423_245_049 * frac
            + 971_821_376 * frac * frac
            + 5127 * frac * frac * frac
            + (1 << 47))
            >> 48);
    // Below 2^253 whenever the pow limit leaves the usual 20 zero bits of
    // headroom; truncates like the lineage arithmetic if a custom limit
    // does not.
    let mut next_target = ref_target.overflowing_mul(U256::from(factor)).0;

    // Unscale by 65536 and apply the whole powers of two.
    let shifts = shifts - 16;
    if shifts <= 0 {
        next_target = next_target >> (-shifts) as usize;
    } else {
        // A left shift that drops high bits would silently truncate the
        // target; detect it by shifting back.
        let shifted = next_target << shifts as usize;
        if (shifted >> shifts as usize) != next_target {
            next_target = pow_limit;
        } else {
            next_target = shifted;
        }
    }

    if next_target.is_zero() {
        // 0 is not a valid target, but 1 is.
        next_target = U256::one();
    } else if next_target > pow_limit {
        next_target = pow_limit;
    }

    debug!(
        time_diff,
        height_diff,
        exponent,
        factor,
        next_bits = format!("0x{:08x}", encode_compact_bits(next_target)),
        "asert retarget"
    );

    Ok(next_target)
}

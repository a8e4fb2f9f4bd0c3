//! DarkGravityWave retargets, versions 2 and 3.
//!
//! Both retarget every block from rolling averages of recent targets and
//! block times. They run on the two-Mars-minute spacing regardless of the
//! configured spacing; that constant is frozen into deployed consensus.
//!
//! Values decoded from chain history are targets of validated blocks, so
//! they never exceed the proof-of-work limit and the averaging arithmetic
//! stays well inside 256 bits.

use tracing::debug;

use crate::arith::U256;
use crate::chain::{BlockIndex, ChainView};
use crate::chain_params::ChainParams;
use crate::compact::{decode_compact_bits, encode_compact_bits};
use crate::params::{
    DGW2_PAST_BLOCKS_MAX, DGW2_PAST_BLOCKS_MIN, DGW3_PAST_BLOCKS, MARS_BLOCK_SPACING_SECS,
};

/// DarkGravityWave v2: smart-average retarget over the last 14 to 140
/// blocks.
///
/// Target and block-time averages are dampened (each sample moves the
/// average by `1/n`) over the first 14 blocks, while a plain mean of block
/// times accumulates over the whole window. The two time averages blend
/// 70/30 into a "smart average" that rescales the dampened target average,
/// bounded to a factor of three either way.
pub fn dark_gravity_wave2<C: ChainView + ?Sized>(
    tip: &BlockIndex,
    params: &ChainParams,
    chain: &C,
) -> u32 {
    if tip.height == 0 || i64::from(tip.height) < DGW2_PAST_BLOCKS_MIN {
        return params.pow_limit_bits();
    }

    let mut count: i64 = 0;
    let mut avg = U256::zero();
    let mut avg_prev = U256::zero();

    let mut time_avg: i64 = 0;
    let mut time_avg_prev: i64 = 0;
    let mut time_count: i64 = 0;
    let mut time_sum2: i64 = 0;
    let mut time_count2: i64 = 0;
    let mut last_time: i64 = 0;

    let mut reading = Some(*tip);
    let mut i: i64 = 1;
    while let Some(block) = reading {
        if block.height <= 0 {
            break;
        }
        if i > DGW2_PAST_BLOCKS_MAX {
            break;
        }
        count += 1;

        if count <= DGW2_PAST_BLOCKS_MIN {
            let target = decode_compact_bits(block.n_bits).target;
            if count == 1 {
                avg = target;
            } else {
                // Dampened running average. The lineage computed
                // (target - avg_prev) / count + avg_prev with signed
                // big numbers; branch to keep the truncated quotient.
                avg = if target >= avg_prev {
                    (target - avg_prev) / U256::from(count as u64) + avg_prev
                } else {
                    avg_prev - (avg_prev - target) / U256::from(count as u64)
                };
            }
            avg_prev = avg;
        }

        if last_time > 0 {
            let diff = last_time - block.time;
            if time_count <= DGW2_PAST_BLOCKS_MIN {
                time_count += 1;
                if time_count == 1 {
                    time_avg = diff;
                } else {
                    time_avg = (diff - time_avg_prev) / time_count + time_avg_prev;
                }
                time_avg_prev = time_avg;
            }
            time_count2 += 1;
            time_sum2 += diff;
        }
        last_time = block.time;

        reading = chain.get_prev(&block);
        i += 1;
    }

    let mut new = avg;
    if time_count != 0 && time_count2 != 0 {
        let mut smart_average =
            time_avg as f64 * 0.7 + (time_sum2 as f64 / time_count2 as f64) * 0.3;
        if smart_average < 1.0 {
            smart_average = 1.0;
        }

        let shift = MARS_BLOCK_SPACING_SECS as f64 / smart_average;
        let mut actual_timespan = (count as f64 * MARS_BLOCK_SPACING_SECS as f64) / shift;
        let target_timespan = count as f64 * MARS_BLOCK_SPACING_SECS as f64;

        if actual_timespan < target_timespan / 3.0 {
            actual_timespan = target_timespan / 3.0;
        }
        if actual_timespan > target_timespan * 3.0 {
            actual_timespan = target_timespan * 3.0;
        }

        let actual = actual_timespan as i64;
        let target_t = target_timespan as i64;

        new = new * U256::from(actual as u64);
        new = new / U256::from(target_t as u64);

        debug!(
            height = tip.height + 1,
            blocks = count,
            smart_average,
            actual_timespan = actual,
            target_timespan = target_t,
            "gravity wave v2 retarget"
        );
    }

    if new > params.pow_limit {
        new = params.pow_limit;
    }

    encode_compact_bits(new)
}

/// DarkGravityWave v3: plain moving-average retarget over the last 24
/// blocks.
pub fn dark_gravity_wave3<C: ChainView + ?Sized>(
    tip: &BlockIndex,
    params: &ChainParams,
    chain: &C,
) -> u32 {
    if tip.height == 0 || i64::from(tip.height) < DGW3_PAST_BLOCKS {
        return params.pow_limit_bits();
    }

    let mut count: i64 = 0;
    let mut avg = U256::zero();
    let mut avg_prev = U256::zero();
    let mut actual_timespan: i64 = 0;
    let mut last_time: i64 = 0;

    let mut reading = Some(*tip);
    let mut i: i64 = 1;
    while let Some(block) = reading {
        if block.height <= 0 {
            break;
        }
        if i > DGW3_PAST_BLOCKS {
            break;
        }
        count += 1;

        if count <= DGW3_PAST_BLOCKS {
            let target = decode_compact_bits(block.n_bits).target;
            if count == 1 {
                avg = target;
            } else {
                avg = (avg_prev * U256::from(count as u64) + target) / U256::from(count as u64 + 1);
            }
            avg_prev = avg;
        }

        if last_time > 0 {
            actual_timespan += last_time - block.time;
        }
        last_time = block.time;

        reading = chain.get_prev(&block);
        i += 1;
    }

    if avg.is_zero() || avg > params.pow_limit {
        return params.pow_limit_bits();
    }

    let target_timespan = count * MARS_BLOCK_SPACING_SECS;
    actual_timespan = actual_timespan.clamp(target_timespan / 3, target_timespan * 3);

    let mut new = avg * U256::from(actual_timespan as u64) / U256::from(target_timespan as u64);
    if new > params.pow_limit {
        new = params.pow_limit;
    }

    debug!(
        height = tip.height + 1,
        blocks = count,
        actual_timespan,
        target_timespan,
        "gravity wave v3 retarget"
    );

    encode_compact_bits(new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MemoryChain;

    fn chain_with_spacing(length: i64, spacing: i64, n_bits: u32) -> MemoryChain {
        let mut chain = MemoryChain::new();
        for h in 0..length {
            chain.push(1_700_000_000 + h * spacing, n_bits);
        }
        chain
    }

    #[test]
    fn dgw2_short_chain_returns_pow_limit() {
        let params = ChainParams::mainnet();
        let chain = chain_with_spacing(10, 123, 0x1b0404cb);
        let tip = chain.tip().unwrap();
        assert_eq!(dark_gravity_wave2(&tip, &params, &chain), 0x1e0fffff);
    }

    #[test]
    fn dgw2_on_schedule_is_stable() {
        let params = ChainParams::mainnet();
        let chain = chain_with_spacing(200, 123, 0x1b0404cb);
        let tip = chain.tip().unwrap();
        assert_eq!(dark_gravity_wave2(&tip, &params, &chain), 0x1b0404cb);
    }

    #[test]
    fn dgw2_fast_blocks_harden_target() {
        let params = ChainParams::mainnet();
        let chain = chain_with_spacing(200, 60, 0x1b0404cb);
        let tip = chain.tip().unwrap();
        // 60s blocks scale the target by 60/123.
        assert_eq!(dark_gravity_wave2(&tip, &params, &chain), 0x1b01f5d9);
    }

    #[test]
    fn dgw2_slow_blocks_ease_target() {
        let params = ChainParams::mainnet();
        let chain = chain_with_spacing(200, 300, 0x1b0404cb);
        let tip = chain.tip().unwrap();
        assert_eq!(dark_gravity_wave2(&tip, &params, &chain), 0x1b09cd40);
    }

    #[test]
    fn dgw2_clamps_to_pow_limit() {
        let params = ChainParams::mainnet();
        // Very slow blocks from an already-easy target drive the result
        // past the limit.
        let chain = chain_with_spacing(200, 100_000, 0x1e0fffff);
        let tip = chain.tip().unwrap();
        assert_eq!(dark_gravity_wave2(&tip, &params, &chain), 0x1e0fffff);
    }

    #[test]
    fn dgw3_short_chain_returns_pow_limit() {
        let params = ChainParams::mainnet();
        let chain = chain_with_spacing(20, 123, 0x1b0404cb);
        let tip = chain.tip().unwrap();
        assert_eq!(dark_gravity_wave3(&tip, &params, &chain), 0x1e0fffff);
    }

    #[test]
    fn dgw3_on_schedule() {
        let params = ChainParams::mainnet();
        let chain = chain_with_spacing(60, 123, 0x1b0404cb);
        let tip = chain.tip().unwrap();
        // 23 observed gaps over a 24-block window: 2829/2952 of the average.
        assert_eq!(dark_gravity_wave3(&tip, &params, &chain), 0x1b03d9ed);
    }

    #[test]
    fn dgw3_clamps_fast_chains() {
        let params = ChainParams::mainnet();
        // Instant blocks: actual timespan clamps to a third.
        let chain = chain_with_spacing(60, 0, 0x1b0404cb);
        let tip = chain.tip().unwrap();
        let bits = dark_gravity_wave3(&tip, &params, &chain);
        let expected = decode_compact_bits(0x1b0404cb).target * U256::from(984u64)
            / U256::from(2952u64);
        assert_eq!(bits, encode_compact_bits(expected));
    }

    #[test]
    fn dgw_mixed_difficulty_window() {
        // Averaging mixes two difficulty levels; exact values pinned by the
        // dampened-average recurrences.
        let params = ChainParams::mainnet();
        let mut chain = MemoryChain::new();
        for h in 0..60 {
            let bits = if h % 2 == 0 { 0x1b0404cb } else { 0x1b020265 };
            chain.push(1_700_000_000 + h * 123, bits);
        }
        let tip = chain.tip().unwrap();

        let v2 = dark_gravity_wave2(&tip, &params, &chain);
        let v3 = dark_gravity_wave3(&tip, &params, &chain);
        let lo = decode_compact_bits(0x1b020265).target;
        let hi = decode_compact_bits(0x1b0404cb).target;
        for bits in [v2, v3] {
            let target = decode_compact_bits(bits).target;
            assert!(target >= lo * U256::from(9u64) / U256::from(10u64));
            assert!(target <= hi);
        }
    }
}

//! Golden consensus vectors.
//!
//! Each vector pins the exact compact bits the retargeting core must
//! produce for a fully specified chain shape. A change to any of these
//! values is a consensus fork.

use crate::arith::U256;
use crate::asert::reset_asert_anchor_cache;
use crate::chain::{BlockIndex, ChainView, MemoryChain};
use crate::chain_params::ChainParams;
use crate::compact::decode_compact_bits;
use crate::difficulty::next_work_required;
use crate::pow::{block_proof, check_proof_of_work};

/// Fork heights at zero put the whole chain on the sol/Mars-minute V1
/// schedule (interval 721).
fn mars_v1_params() -> ChainParams {
    ChainParams {
        fork_one_height: 0,
        fork_two_height: 0,
        ..ChainParams::mainnet()
    }
}

#[test]
fn pre_genesis_requires_pow_limit() {
    let params = ChainParams::mainnet();
    let chain = MemoryChain::new();
    assert_eq!(
        next_work_required(None, 1_388_590_627, &params, &chain).unwrap(),
        0x1e0fffff
    );
}

#[test]
fn v1_first_sol_retarget() {
    // Tip at height 720 closes the first 721-block interval. The walkback
    // spans 720 links to genesis; the observed timespan of 88,683 seconds
    // against the 88,775-second sol eases the target by ~0.10%.
    let params = mars_v1_params();
    let mut chain = MemoryChain::new();
    let t0 = 1_700_000_000;
    for h in 0..720 {
        chain.push(t0 + h * 123, 0x1b0404cb);
    }
    chain.push(t0 + 721 * 123, 0x1b0404cb);
    let tip = chain.tip().unwrap();
    assert_eq!(tip.height, 720);
    assert_eq!(tip.time - t0, 88_683);

    let bits = next_work_required(Some(&tip), tip.time + 123, &params, &chain).unwrap();
    assert_eq!(bits, 0x1b0403ba);
}

#[test]
fn v1_retarget_wide_target_shift_path() {
    // A tip at the pow limit decodes to 236 bits, crossing the 235-bit
    // pre-shift guard; the dropped low bit shows up in the quotient.
    let params = mars_v1_params();
    let mut chain = MemoryChain::new();
    let t0 = 1_700_000_000;
    for h in 0..720 {
        chain.push(t0 + h * 123, 0x1e0fffff);
    }
    chain.push(t0 + 721 * 123, 0x1e0fffff);
    let tip = chain.tip().unwrap();

    let bits = next_work_required(Some(&tip), tip.time + 123, &params, &chain).unwrap();
    assert_eq!(bits, 0x1e0ffbc0);
}

#[test]
fn dgw2_stable_window() {
    let params = ChainParams::mainnet();
    let mut chain = MemoryChain::new();
    for h in 0..=120_500i64 {
        chain.push(1_500_000_000 + h * 123, 0x1b0404cb);
    }
    let tip = chain.tip().unwrap();

    // Height 120,501 is governed by DarkGravityWave v2; an on-schedule
    // window reproduces the tip difficulty exactly.
    let bits = next_work_required(Some(&tip), tip.time + 123, &params, &chain).unwrap();
    assert_eq!(bits, 0x1b0404cb);
}

#[test]
fn dgw3_stable_window() {
    let params = ChainParams::mainnet();
    let mut chain = MemoryChain::new();
    for h in 0..=126_100i64 {
        chain.push(1_500_000_000 + h * 123, 0x1b0404cb);
    }
    let tip = chain.tip().unwrap();

    // 23 observed gaps of 123 seconds over the 24-block window: the target
    // scales by 2829/2952.
    let bits = next_work_required(Some(&tip), tip.time + 123, &params, &chain).unwrap();
    assert_eq!(bits, 0x1b03d9ed);
}

/// Mainnet-shaped ancestry for the ASERT vector: every block below the tip
/// carries the anchor difficulty and the anchor-era timestamp, so the
/// anchor (height 2,999,999) and its parent both read 1,700,000,000.
struct AnchorEraChain;

impl ChainView for AnchorEraChain {
    fn get_prev(&self, block: &BlockIndex) -> Option<BlockIndex> {
        if block.height <= 0 {
            return None;
        }
        Some(BlockIndex {
            height: block.height - 1,
            time: 1_700_000_000,
            n_bits: 0x1b0404cb,
        })
    }
}

#[test]
fn asert_hundred_blocks_past_anchor() {
    // Tip 100 blocks past the anchor, 12,300 seconds after the anchor
    // parent. The schedule deviation is one ideal spacing (the exponent's
    // +1), giving exponent -1119, fractional factor 64417, and a ~1.11%
    // easing the whole 16.16 pipeline must agree on bit for bit.
    let params = ChainParams::mainnet();
    reset_asert_anchor_cache();
    let tip = BlockIndex {
        height: 3_000_099,
        time: 1_700_012_300,
        n_bits: 0x1b0404cb,
    };
    let bits = next_work_required(Some(&tip), tip.time + 123, &params, &AnchorEraChain).unwrap();
    assert_eq!(bits, 0x1b03f8b8);

    // The unencoded target carries more precision than the compact form.
    let full = crate::calculate_asert(
        decode_compact_bits(0x1b0404cb).target,
        123,
        12_300,
        100,
        params.pow_limit,
        params.asert_half_life_secs,
    )
    .unwrap();
    assert_eq!(full, U256::from(0x3_f8b8_9a35u64) << 176);
}

#[test]
fn compact_overflow_rejected_by_pow_check() {
    let params = ChainParams::mainnet();
    assert!(!check_proof_of_work(&U256::zero(), 0x21010000, &params));
}

#[test]
fn block_proof_vector() {
    assert_eq!(block_proof(0x1d00ffff), U256::from(0x0001_0001_0001u64));
}

//! Proof-of-work validity and chain-work accounting.

use crate::arith::U256;
use crate::chain_params::ChainParams;
use crate::compact::decode_compact_bits;

/// Check whether `hash` satisfies the proof-of-work requirement in
/// `n_bits`.
///
/// The hash is the scrypt block hash interpreted as a big-endian 256-bit
/// integer. Fails for encodings that are negative, overflowed, zero, or
/// easier than the proof-of-work limit.
pub fn check_proof_of_work(hash: &U256, n_bits: u32, params: &ChainParams) -> bool {
    let decoded = decode_compact_bits(n_bits);

    if decoded.negative
        || decoded.overflow
        || decoded.target.is_zero()
        || decoded.target > params.pow_limit
    {
        return false;
    }

    *hash <= decoded.target
}

/// The work a block with the given compact target contributes to cumulative
/// chain work: `floor(2^256 / (target + 1))`, or zero for invalid bits.
///
/// 2^256 itself is not representable, but since it is at least `target + 1`
/// the quotient equals `(2^256 - target - 1) / (target + 1) + 1`, which is
/// `!target / (target + 1) + 1` in 256-bit arithmetic.
pub fn block_proof(n_bits: u32) -> U256 {
    let decoded = decode_compact_bits(n_bits);
    if decoded.negative || decoded.overflow || decoded.target.is_zero() {
        return U256::zero();
    }
    (!decoded.target) / (decoded.target + U256::one()) + U256::one()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_params::POW_LIMIT;

    #[test]
    fn hash_at_target_accepted_above_rejected() {
        let params = ChainParams::mainnet();
        let target = decode_compact_bits(0x1b0404cb).target;

        assert!(check_proof_of_work(&target, 0x1b0404cb, &params));
        assert!(check_proof_of_work(&U256::zero(), 0x1b0404cb, &params));
        assert!(!check_proof_of_work(
            &(target + U256::one()),
            0x1b0404cb,
            &params
        ));
    }

    #[test]
    fn rejects_out_of_range_bits() {
        let params = ChainParams::mainnet();
        let zero = U256::zero();

        // Overflowed encoding fails regardless of hash.
        assert!(!check_proof_of_work(&zero, 0x21010000, &params));
        // Negative encoding.
        assert!(!check_proof_of_work(&zero, 0x04923456, &params));
        // Zero target.
        assert!(!check_proof_of_work(&zero, 0x00000000, &params));
        // Easier than the pow limit.
        assert!(!check_proof_of_work(&zero, 0x1f00ffff, &params));
        // The limit itself passes.
        assert!(check_proof_of_work(&zero, 0x1e0fffff, &params));
    }

    #[test]
    fn block_proof_reference_values() {
        // 2^256 / (0xffff * 2^208 + 1).
        let expected = U256::from(0x0001_0001_0001u64);
        assert_eq!(block_proof(0x1d00ffff), expected);

        assert_eq!(block_proof(0x1b0404cb), U256::from(0x3fb3_ab76_4c00u64));
    }

    #[test]
    fn block_proof_invalid_bits_is_zero() {
        assert!(block_proof(0x00000000).is_zero());
        assert!(block_proof(0x21010000).is_zero());
        assert!(block_proof(0x04923456).is_zero());
    }

    #[test]
    fn block_proof_monotonic_in_difficulty() {
        // Lower target, more work.
        assert!(block_proof(0x1b0404cb) > block_proof(0x1d00ffff));
        assert!(block_proof(0x1d00ffff) > block_proof(0x1e0fffff));
        assert!(!block_proof(crate::compact::encode_compact_bits(POW_LIMIT)).is_zero());
    }
}

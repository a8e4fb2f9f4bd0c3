//! Fixed-width 256-bit arithmetic for proof-of-work targets.
//!
//! Targets are unsigned 256-bit integers with the truncating shift and
//! overflow behavior of the lineage's `uint256`: a left shift silently drops
//! high bits. Retargeting arithmetic depends on that truncation being
//! observable (the legacy retarget pre-shifts targets wider than 235 bits,
//! and ASERT detects high-bit loss by shifting back), so an arbitrary
//! precision integer is not a substitute here.

use uint::construct_uint;

construct_uint! {
    /// Unsigned 256-bit integer, four 64-bit words, little-endian word order.
    pub struct U256(4);
}

impl U256 {
    /// Interpret a 32-byte big-endian hash as an integer.
    ///
    /// Block hashes compare against targets in this orientation.
    pub fn from_hash_be(bytes: &[u8; 32]) -> Self {
        Self::from_big_endian(bytes)
    }
}

//! Compact ("nBits") target encoding.
//!
//! A 256-bit target is carried in block headers as a 32-bit
//! mantissa-exponent value: the high byte is the target's size in bytes, the
//! low 23 bits are the most significant bytes of the target, and bit
//! 0x00800000 is a sign bit inherited from the MPI encoding the lineage
//! used. The represented value is `mantissa * 256^(size - 3)`.
//!
//! Decoding never rejects: out-of-range encodings are reported through the
//! `negative` and `overflow` flags and the caller decides (the proof-of-work
//! check treats either flag as invalid).

use crate::arith::U256;

/// A target decoded from compact form, with its validity flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedTarget {
    /// The decoded 256-bit threshold. High bits that do not fit 256 bits are
    /// truncated; `overflow` reports when that loss makes the value invalid.
    pub target: U256,
    /// The sign bit was set on a nonzero mantissa.
    pub negative: bool,
    /// The encoding denotes a value wider than 256 bits.
    pub overflow: bool,
}

/// Decode a compact `nBits` value.
pub fn decode_compact_bits(compact: u32) -> DecodedTarget {
    let size = (compact >> 24) as usize;
    // The sign bit never contributes to the magnitude.
    let word = compact & 0x007f_ffff;

    let target = if size <= 3 {
        U256::from(word >> (8 * (3 - size)))
    } else {
        U256::from(word) << (8 * (size - 3))
    };

    DecodedTarget {
        target,
        negative: word != 0 && (compact & 0x0080_0000) != 0,
        overflow: word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)),
    }
}

/// Encode a target in compact form.
///
/// The encoding is normalized: if the top mantissa bit would collide with
/// the sign bit, the mantissa is shifted down a byte and the exponent bumped.
/// Zero encodes as zero.
pub fn encode_compact_bits(target: U256) -> u32 {
    let mut size = (target.bits() + 7) / 8;
    let mut compact: u64 = if size <= 3 {
        target.low_u64() << (8 * (3 - size))
    } else {
        (target >> (8 * (size - 3))).low_u64()
    };

    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }

    ((size as u32) << 24) | (compact as u32 & 0x007f_ffff)
}

//! Test chain generators.
//!
//! Deterministic chain shapes for retargeting tests: everything derives from
//! a fixed base timestamp so vectors stay reproducible.

use std::sync::atomic::{AtomicU64, Ordering};

use marscoin_consensus::{BlockIndex, ChainView, MemoryChain};

/// Fixed base time for reproducible chains.
pub const BASE_TIME: i64 = 1_700_000_000;

// Distinct generations keep the process-wide ASERT anchor cache from
// bleeding between concurrently running tests.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1 << 32);

/// Timestamp of a block at `height` on an even `spacing` schedule.
pub fn block_timestamp(height: i64, spacing: i64) -> i64 {
    BASE_TIME + height * spacing
}

/// A full in-memory chain of `length` blocks with even spacing and constant
/// difficulty.
pub fn chain_with_spacing(length: i64, spacing: i64, n_bits: u32) -> MemoryChain {
    let mut chain = MemoryChain::new();
    for h in 0..length {
        chain.push(block_timestamp(h, spacing), n_bits);
    }
    chain
}

/// A chain view that stores only a recent tail of blocks and synthesizes an
/// evenly spaced, constant-difficulty history below it.
///
/// Retargeting walks are bounded (at most 721 blocks), so high-height
/// scenarios do not need millions of materialized ancestors.
#[derive(Debug, Clone)]
pub struct SparseChain {
    /// Recent consecutive blocks, oldest first, ending at the tip.
    pub tail: Vec<BlockIndex>,
    /// Spacing of the synthesized history below the tail.
    pub filler_spacing: i64,
    /// Difficulty of the synthesized history.
    pub filler_bits: u32,
    generation: u64,
}

impl SparseChain {
    /// An evenly spaced chain ending at `tip_height`, with the last `len`
    /// blocks materialized.
    pub fn new(tip_height: i32, len: i32, spacing: i64, n_bits: u32) -> Self {
        let first = (tip_height - len + 1).max(0);
        let tail = (first..=tip_height)
            .map(|h| BlockIndex {
                height: h,
                time: block_timestamp(i64::from(h), spacing),
                n_bits,
            })
            .collect();
        Self {
            tail,
            filler_spacing: spacing,
            filler_bits: n_bits,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The tip block.
    pub fn tip(&self) -> BlockIndex {
        *self.tail.last().expect("tail is never empty")
    }

    /// Replace the tip's timestamp.
    pub fn with_tip_time(mut self, time: i64) -> Self {
        self.tail.last_mut().expect("tail is never empty").time = time;
        self
    }
}

impl ChainView for SparseChain {
    fn generation(&self) -> u64 {
        self.generation
    }

    fn get_prev(&self, block: &BlockIndex) -> Option<BlockIndex> {
        if block.height <= 0 {
            return None;
        }
        let height = block.height - 1;
        let first = self.tail[0].height;
        if height >= first {
            self.tail.get((height - first) as usize).copied()
        } else {
            Some(BlockIndex {
                height,
                time: block_timestamp(i64::from(height), self.filler_spacing),
                n_bits: self.filler_bits,
            })
        }
    }
}

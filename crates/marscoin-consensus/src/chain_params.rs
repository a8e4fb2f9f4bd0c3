//! Chain parameters for the Marscoin networks.
//!
//! Consensus parameters that differ per network (mainnet, testnet, regtest)
//! live here; values that are frozen into the retargeting algorithms
//! themselves (the Mars-day constants, the DarkGravityWave windows) live in
//! [`crate::params`] and are deliberately not configurable.
//!
//! Use the named constructors for the public networks, or
//! [`ChainParams::from_config`] for private chains.

use core::str::FromStr;
use std::fmt;

use crate::arith::U256;
use crate::compact::encode_compact_bits;

/// Largest (least difficult) target any Marscoin network accepts.
/// Encodes as compact `0x1e0fffff`.
pub const POW_LIMIT: U256 = U256([
    0xffff_ffff_ffff_ffff,
    0xffff_ffff_ffff_ffff,
    0xffff_ffff_ffff_ffff,
    0x0000_0fff_ffff_ffff,
]);

/// Network-specific consensus parameters.
///
/// Immutable for the lifetime of a retargeting call. All heights are the
/// height of the block being validated (tip height + 1), not the tip.
#[derive(Debug, Clone)]
pub struct ChainParams {
    /// Maximum allowed target; every algorithm clamps to this.
    pub pow_limit: U256,

    /// Pre-fork block spacing in seconds.
    pub target_spacing_secs: i64,

    /// Pre-fork retarget timespan in seconds.
    pub target_timespan_secs: i64,

    /// Testnet rule: allow a minimum-difficulty block when the candidate's
    /// timestamp is more than twice the spacing past the tip.
    pub allow_min_difficulty: bool,

    /// Regtest rule: never retarget, every block inherits the tip's bits.
    pub no_retargeting: bool,

    /// Standardness of the chain. Non-standard chains collapse the
    /// dispatch to the legacy algorithm at every height.
    pub require_standard: bool,

    /// ASERT half-life: schedule deviation that doubles or halves the
    /// target, in seconds.
    pub asert_half_life_secs: i64,

    /// Height of the block anchoring the ASERT schedule.
    pub asert_anchor_height: i32,

    /// First height governed by ASERT.
    pub asert_activation_height: i32,

    /// First height governed by DarkGravityWave v2.
    pub dgw_activation_height: i32,

    /// First height governed by DarkGravityWave v3.
    pub dgw3_activation_height: i32,

    /// First height retargeting over a Mars day (sol) instead of 3.5 Earth
    /// days.
    pub fork_one_height: i32,

    /// First height on the 123-second Mars-minute schedule.
    pub fork_two_height: i32,

    /// Compact bits of the genesis block.
    pub genesis_n_bits: u32,
}

impl ChainParams {
    /// Mainnet parameters.
    pub fn mainnet() -> Self {
        Self {
            pow_limit: POW_LIMIT,
            target_spacing_secs: 150,
            target_timespan_secs: 3 * 24 * 60 * 60 + 12 * 60 * 60, // 3.5 days
            allow_min_difficulty: false,
            no_retargeting: false,
            require_standard: true,
            asert_half_life_secs: 2 * 60 * 60,
            asert_anchor_height: 2_999_999,
            asert_activation_height: 3_000_000,
            dgw_activation_height: 120_000,
            dgw3_activation_height: 126_000,
            fork_one_height: 14_260,
            fork_two_height: 70_000,
            genesis_n_bits: 0x1e0ffff0,
        }
    }

    /// Testnet parameters: same schedule as mainnet, but min-difficulty
    /// blocks are allowed and the ASERT anchor sits right after genesis.
    pub fn testnet() -> Self {
        Self {
            allow_min_difficulty: true,
            asert_anchor_height: 100,
            ..Self::mainnet()
        }
    }

    /// Regtest parameters: difficulty never changes.
    pub fn regtest() -> Self {
        Self {
            allow_min_difficulty: true,
            no_retargeting: true,
            require_standard: false,
            asert_anchor_height: 100,
            ..Self::mainnet()
        }
    }

    /// Build parameters from a configuration with per-field validation.
    pub fn from_config(config: &ChainParamsConfig) -> Result<Self, ChainParamsError> {
        fn require<T: Copy>(
            field: &'static str,
            value: Option<T>,
        ) -> Result<T, ChainParamsError> {
            value.ok_or(ChainParamsError {
                field,
                message: "required field missing".to_string(),
            })
        }

        let pow_limit_hex = config
            .pow_limit_hex
            .as_deref()
            .ok_or(ChainParamsError {
                field: "pow_limit_hex",
                message: "required field missing".to_string(),
            })?;

        // Hex hygiene: trim whitespace and strip an optional 0x prefix.
        let hex = pow_limit_hex.trim();
        let hex = hex
            .strip_prefix("0x")
            .or_else(|| hex.strip_prefix("0X"))
            .unwrap_or(hex);

        let pow_limit = U256::from_str(hex).map_err(|_| ChainParamsError {
            field: "pow_limit_hex",
            message: format!("invalid hex string: '{pow_limit_hex}'"),
        })?;

        if pow_limit.is_zero() {
            return Err(ChainParamsError {
                field: "pow_limit_hex",
                message: "pow limit cannot be zero".to_string(),
            });
        }

        Ok(Self {
            pow_limit,
            target_spacing_secs: require("target_spacing_secs", config.target_spacing_secs)?,
            target_timespan_secs: require("target_timespan_secs", config.target_timespan_secs)?,
            allow_min_difficulty: config.allow_min_difficulty.unwrap_or(false),
            no_retargeting: config.no_retargeting.unwrap_or(false),
            require_standard: config.require_standard.unwrap_or(true),
            asert_half_life_secs: require("asert_half_life_secs", config.asert_half_life_secs)?,
            asert_anchor_height: require("asert_anchor_height", config.asert_anchor_height)?,
            asert_activation_height: require(
                "asert_activation_height",
                config.asert_activation_height,
            )?,
            dgw_activation_height: require("dgw_activation_height", config.dgw_activation_height)?,
            dgw3_activation_height: require(
                "dgw3_activation_height",
                config.dgw3_activation_height,
            )?,
            fork_one_height: require("fork_one_height", config.fork_one_height)?,
            fork_two_height: require("fork_two_height", config.fork_two_height)?,
            genesis_n_bits: require("genesis_n_bits", config.genesis_n_bits)?,
        })
    }

    /// The proof-of-work limit in compact form.
    pub fn pow_limit_bits(&self) -> u32 {
        encode_compact_bits(self.pow_limit)
    }
}

/// Error when constructing [`ChainParams`] from configuration.
#[derive(Debug, Clone)]
pub struct ChainParamsError {
    /// The field that is missing or invalid.
    pub field: &'static str,
    /// Description of the error.
    pub message: String,
}

impl fmt::Display for ChainParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain params error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ChainParamsError {}

/// Configuration for loading [`ChainParams`] for a private network.
///
/// All fields are optional so partial configs can be validated with clear
/// errors; flags default to mainnet behavior.
#[derive(Debug, Clone, Default)]
pub struct ChainParamsConfig {
    /// Proof-of-work limit as a hex string (optional `0x` prefix).
    pub pow_limit_hex: Option<String>,
    /// Pre-fork block spacing in seconds.
    pub target_spacing_secs: Option<i64>,
    /// Pre-fork retarget timespan in seconds.
    pub target_timespan_secs: Option<i64>,
    /// Allow testnet minimum-difficulty blocks.
    pub allow_min_difficulty: Option<bool>,
    /// Disable retargeting entirely.
    pub no_retargeting: Option<bool>,
    /// Standardness of the chain.
    pub require_standard: Option<bool>,
    /// ASERT half-life in seconds.
    pub asert_half_life_secs: Option<i64>,
    /// ASERT anchor height.
    pub asert_anchor_height: Option<i32>,
    /// ASERT activation height.
    pub asert_activation_height: Option<i32>,
    /// DarkGravityWave v2 activation height.
    pub dgw_activation_height: Option<i32>,
    /// DarkGravityWave v3 activation height.
    pub dgw3_activation_height: Option<i32>,
    /// First sol-timespan retarget height.
    pub fork_one_height: Option<i32>,
    /// First Mars-minute spacing height.
    pub fork_two_height: Option<i32>,
    /// Genesis compact bits.
    pub genesis_n_bits: Option<u32>,
}

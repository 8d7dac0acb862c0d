// crates/light-economics/src/config.rs
//
// Emission parameters for a farm.
// Loaded from TOML (see light-cli scenarios) or built in code.

use light_core::error::LightError;
use light_core::serde_amount;
use light_core::types::{Amount, BlockHeight};
use serde::{Deserialize, Serialize};

use crate::rewards::BPS_DENOMINATOR;

/// Emission parameters for the farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionConfig {
    /// Global reward per block before the master/slave split and halving.
    #[serde(deserialize_with = "serde_amount::deserialize")]
    pub reward_per_block: Amount,

    /// No emission before this height.
    #[serde(default)]
    pub start_block: BlockHeight,

    /// Blocks between successive halvings.
    #[serde(default = "default_halving_interval")]
    pub halving_interval: BlockHeight,

    /// Emission stops at `start_block + emission_blocks` when set.
    #[serde(default)]
    pub emission_blocks: Option<BlockHeight>,

    /// Ceiling on the reward token's total supply. Minting is clamped to it.
    #[serde(default, deserialize_with = "serde_amount::deserialize_option")]
    pub max_supply: Option<Amount>,

    /// Share of the global rate routed to slave pools, in basis points.
    #[serde(default = "default_slave_share_bps")]
    pub slave_share_bps: u32,

    /// Share of a slave pool's reward skimmed for area creators, in basis points.
    #[serde(default = "default_creator_fee_bps")]
    pub creator_fee_bps: u32,

    /// Staked members an area needs before its creator earns the skim.
    #[serde(default = "default_min_area_members")]
    pub min_area_members: u32,

    /// Native-currency price of creating an area (the owner creates for free).
    #[serde(default, deserialize_with = "serde_amount::deserialize")]
    pub area_creation_fee: Amount,
}

fn default_halving_interval() -> BlockHeight {
    10_512_000
}

fn default_slave_share_bps() -> u32 {
    2_000
}

fn default_creator_fee_bps() -> u32 {
    500
}

fn default_min_area_members() -> u32 {
    2
}

impl EmissionConfig {
    /// Config with the given rate and schedule, everything else at defaults.
    pub fn new(reward_per_block: Amount, start_block: BlockHeight, halving_interval: BlockHeight) -> Self {
        Self {
            reward_per_block,
            start_block,
            halving_interval,
            ..Self::default()
        }
    }

    pub fn with_emission_blocks(mut self, blocks: BlockHeight) -> Self {
        self.emission_blocks = Some(blocks);
        self
    }

    pub fn with_max_supply(mut self, max_supply: Amount) -> Self {
        self.max_supply = Some(max_supply);
        self
    }

    pub fn with_area_creation_fee(mut self, fee: Amount) -> Self {
        self.area_creation_fee = fee;
        self
    }

    /// First height at which nothing is emitted any more, if bounded.
    pub fn emission_end(&self) -> Option<BlockHeight> {
        self.emission_blocks
            .map(|blocks| self.start_block.saturating_add(blocks))
    }

    /// Reject parameters the engine cannot honour.
    ///
    /// # Errors
    /// Returns `LightError::InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<(), LightError> {
        if self.halving_interval == 0 {
            return Err(LightError::InvalidConfig(
                "halving_interval must be greater than zero".to_string(),
            ));
        }
        for (name, bps) in [
            ("slave_share_bps", self.slave_share_bps),
            ("creator_fee_bps", self.creator_fee_bps),
        ] {
            if bps > BPS_DENOMINATOR {
                return Err(LightError::InvalidConfig(format!(
                    "{} is {} but may not exceed {}",
                    name, bps, BPS_DENOMINATOR
                )));
            }
        }
        if self.start_block.checked_add(self.emission_blocks.unwrap_or(0)).is_none() {
            return Err(LightError::InvalidConfig(
                "start_block + emission_blocks overflows the block height".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            reward_per_block: 0,
            start_block: 0,
            halving_interval: default_halving_interval(),
            emission_blocks: None,
            max_supply: None,
            slave_share_bps: default_slave_share_bps(),
            creator_fee_bps: default_creator_fee_bps(),
            min_area_members: default_min_area_members(),
            area_creation_fee: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let cfg: EmissionConfig = toml::from_str("reward_per_block = 10000").unwrap();
        assert_eq!(cfg.reward_per_block, 10_000);
        assert_eq!(cfg.start_block, 0);
        assert_eq!(cfg.slave_share_bps, 2_000);
        assert_eq!(cfg.creator_fee_bps, 500);
        assert_eq!(cfg.min_area_members, 2);
        assert_eq!(cfg.max_supply, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_full_toml() {
        let cfg: EmissionConfig = toml::from_str(
            r#"
            reward_per_block = "5000000000000000000"
            start_block = 100
            halving_interval = 100
            emission_blocks = 500
            max_supply = "21000000000000000000000000"
            area_creation_fee = 1
            "#,
        )
        .unwrap();
        assert_eq!(cfg.reward_per_block, 5_000_000_000_000_000_000);
        assert_eq!(cfg.emission_end(), Some(600));
        assert_eq!(cfg.max_supply, Some(21_000_000 * 10u128.pow(18)));
        assert_eq!(cfg.area_creation_fee, 1);
    }

    #[test]
    fn test_zero_halving_interval_rejected() {
        let cfg = EmissionConfig::new(100, 0, 0);
        assert!(matches!(cfg.validate(), Err(LightError::InvalidConfig(_))));
    }

    #[test]
    fn test_bps_above_denominator_rejected() {
        let mut cfg = EmissionConfig::new(100, 0, 10);
        cfg.creator_fee_bps = 10_001;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_unbounded_emission_end() {
        let cfg = EmissionConfig::new(100, 5, 10);
        assert_eq!(cfg.emission_end(), None);
    }
}

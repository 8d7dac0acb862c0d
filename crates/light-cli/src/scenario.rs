// crates/light-cli/src/scenario.rs
//
// Scenario files: a farm configuration, funded accounts, initial pools and a
// script of calls at fixed block heights. Loaded from TOML.
//
// Example:
//
//   owner = "dev"
//
//   [farm]
//   reward_per_block = 1250
//   start_block = 700
//   halving_interval = 1000
//
//   [[accounts]]
//   label = "alice"
//   assets = [{ asset = "LP", amount = 1000 }]
//
//   [[pools]]
//   kind = "master"
//   alloc_point = 100
//   asset = "LP"
//
//   [[steps]]
//   block = 710
//   caller = "alice"
//   action = "deposit"
//   pool = 0
//   amount = 10

use std::fs;

use light_core::serde_amount;
use light_core::types::{Amount, AreaId, AssetId, BlockHeight, PoolId};
use light_core::{Address, LightError};
use light_economics::{EmissionConfig, PoolKind};
use serde::Deserialize;
use thiserror::Error;

/// Failures while loading or replaying a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse scenario {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Step {index} at block {block} ({action}) failed: {source}")]
    StepFailed {
        index: usize,
        block: BlockHeight,
        action: &'static str,
        source: LightError,
    },

    #[error("Step {index} at block {block} ({action}) was expected to fail but succeeded")]
    UnexpectedSuccess {
        index: usize,
        block: BlockHeight,
        action: &'static str,
    },

    #[error(transparent)]
    Farm(#[from] LightError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Account holding the admin capability.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Account the farm itself lives at. It also owns the reward token.
    #[serde(default = "default_farm_account")]
    pub farm_account: String,

    pub farm: EmissionConfig,

    #[serde(default)]
    pub accounts: Vec<AccountSpec>,

    /// Pools registered by the owner before the first step.
    #[serde(default)]
    pub pools: Vec<PoolSpec>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Height to advance to after the last step, for the pending-reward report.
    #[serde(default)]
    pub final_block: Option<BlockHeight>,
}

fn default_owner() -> String {
    "dev".to_string()
}

fn default_farm_account() -> String {
    "light-farm".to_string()
}

/// A funded account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSpec {
    pub label: String,
    #[serde(default)]
    pub assets: Vec<Holding>,
    /// Native currency, for paying area creation fees.
    #[serde(default, deserialize_with = "serde_amount::deserialize")]
    pub native: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Holding {
    pub asset: AssetId,
    #[serde(deserialize_with = "serde_amount::deserialize")]
    pub amount: Amount,
    /// Allowance granted to the farm. Unlimited when absent.
    #[serde(default, deserialize_with = "serde_amount::deserialize_option")]
    pub allowance: Option<Amount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolSpec {
    pub kind: PoolKind,
    pub alloc_point: u64,
    pub asset: AssetId,
}

/// One scripted call.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub block: BlockHeight,
    /// Calling account; defaults to the owner.
    #[serde(default)]
    pub caller: Option<String>,
    /// The call must fail; its failure is recorded instead of aborting the replay.
    #[serde(default)]
    pub expect_error: bool,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    AddPool {
        kind: PoolKind,
        alloc_point: u64,
        asset: AssetId,
        #[serde(default)]
        with_update: bool,
    },
    SetPoolAllocation {
        pool: PoolId,
        alloc_point: u64,
        #[serde(default)]
        with_update: bool,
    },
    SetRewardPerBlock {
        #[serde(deserialize_with = "serde_amount::deserialize")]
        reward_per_block: Amount,
    },
    SetAreaCreationFee {
        #[serde(deserialize_with = "serde_amount::deserialize")]
        fee: Amount,
    },
    SetBuyBack {
        #[serde(default)]
        to: Option<String>,
    },
    TransferOwnership {
        to: String,
    },
    UpdatePool {
        pool: PoolId,
    },
    MassUpdatePools,
    Deposit {
        pool: PoolId,
        #[serde(deserialize_with = "serde_amount::deserialize")]
        amount: Amount,
    },
    Withdraw {
        pool: PoolId,
        #[serde(deserialize_with = "serde_amount::deserialize")]
        amount: Amount,
    },
    EmergencyWithdraw {
        pool: PoolId,
    },
    CreateArea {
        pool: PoolId,
        label: String,
        #[serde(default, deserialize_with = "serde_amount::deserialize")]
        payment: Amount,
    },
    SlaveDeposit {
        pool: PoolId,
        area: AreaId,
        #[serde(deserialize_with = "serde_amount::deserialize")]
        amount: Amount,
    },
    SlaveWithdraw {
        pool: PoolId,
        #[serde(deserialize_with = "serde_amount::deserialize")]
        amount: Amount,
    },
    SlaveEmergencyWithdraw {
        pool: PoolId,
    },
    TransferCreateAreaFee {
        to: String,
        #[serde(deserialize_with = "serde_amount::deserialize")]
        amount: Amount,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddPool { .. } => "add_pool",
            Action::SetPoolAllocation { .. } => "set_pool_allocation",
            Action::SetRewardPerBlock { .. } => "set_reward_per_block",
            Action::SetAreaCreationFee { .. } => "set_area_creation_fee",
            Action::SetBuyBack { .. } => "set_buy_back",
            Action::TransferOwnership { .. } => "transfer_ownership",
            Action::UpdatePool { .. } => "update_pool",
            Action::MassUpdatePools => "mass_update_pools",
            Action::Deposit { .. } => "deposit",
            Action::Withdraw { .. } => "withdraw",
            Action::EmergencyWithdraw { .. } => "emergency_withdraw",
            Action::CreateArea { .. } => "create_area",
            Action::SlaveDeposit { .. } => "slave_deposit",
            Action::SlaveWithdraw { .. } => "slave_withdraw",
            Action::SlaveEmergencyWithdraw { .. } => "slave_emergency_withdraw",
            Action::TransferCreateAreaFee { .. } => "transfer_create_area_fee",
        }
    }
}

impl Scenario {
    /// Load a scenario from a TOML file. `~/` expands to the home directory.
    pub fn load(path: &str) -> Result<Self, ScenarioError> {
        let path = expand_tilde(path);
        let contents = read(&path)?;
        Self::parse(&contents).map_err(|source| ScenarioError::Parse { path, source })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

/// Load an `EmissionConfig` from a bare config file or from a scenario's `[farm]` table.
pub fn load_emission_config(path: &str) -> Result<EmissionConfig, ScenarioError> {
    let path = expand_tilde(path);
    let contents = read(&path)?;
    parse_emission_config(&contents).map_err(|source| ScenarioError::Parse { path, source })
}

fn parse_emission_config(contents: &str) -> Result<EmissionConfig, toml::de::Error> {
    let mut table: toml::Table = toml::from_str(contents)?;
    let body = match table.remove("farm") {
        Some(farm) => farm,
        None => toml::Value::Table(table),
    };
    body.try_into()
}

fn read(path: &str) -> Result<String, ScenarioError> {
    fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_string(),
        source,
    })
}

/// Resolve an account reference: `0x`-prefixed hex, or a label hashed into an address.
pub fn resolve(account: &str) -> Result<Address, LightError> {
    if account.starts_with("0x") {
        Address::from_hex(account)
    } else {
        Ok(Address::from_label(account))
    }
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_scenario() {
        let scenario = Scenario::parse("[farm]\nreward_per_block = 100").unwrap();
        assert_eq!(scenario.owner, "dev");
        assert_eq!(scenario.farm_account, "light-farm");
        assert_eq!(scenario.farm.reward_per_block, 100);
        assert!(scenario.steps.is_empty());
        assert!(scenario.final_block.is_none());
    }

    #[test]
    fn test_parse_steps_and_accounts() {
        let scenario = Scenario::parse(
            r#"
            owner = "timelock"

            [farm]
            reward_per_block = "5000"
            start_block = 300

            [[accounts]]
            label = "alice"
            assets = [{ asset = "LP", amount = 1000 }]
            native = 2

            [[pools]]
            kind = "slave"
            alloc_point = 1
            asset = "LP"

            [[steps]]
            block = 305
            action = "create_area"
            pool = 0
            label = "reef"

            [[steps]]
            block = 310
            caller = "alice"
            action = "slave_deposit"
            pool = 0
            area = 0
            amount = "10"

            [[steps]]
            block = 311
            caller = "alice"
            action = "withdraw"
            pool = 0
            amount = 1
            expect_error = true
            "#,
        )
        .unwrap();

        assert_eq!(scenario.owner, "timelock");
        assert_eq!(scenario.accounts[0].assets[0].amount, 1_000);
        assert_eq!(scenario.accounts[0].native, 2);
        assert_eq!(scenario.pools[0].kind, PoolKind::Slave);
        assert_eq!(scenario.steps.len(), 3);
        assert!(matches!(
            scenario.steps[0].action,
            Action::CreateArea { pool: 0, payment: 0, .. }
        ));
        assert!(matches!(
            scenario.steps[1].action,
            Action::SlaveDeposit { pool: 0, area: 0, amount: 10 }
        ));
        assert_eq!(scenario.steps[1].caller.as_deref(), Some("alice"));
        assert!(scenario.steps[2].expect_error);
        assert_eq!(scenario.steps[2].action.name(), "withdraw");
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = Scenario::parse(
            "[farm]\nreward_per_block = 1\n[[steps]]\nblock = 1\naction = \"rug_pull\"",
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_resolve_label_and_hex() {
        let alice = Address::from_label("alice");
        assert_eq!(resolve("alice").unwrap(), alice);
        assert_eq!(resolve(&alice.to_string()).unwrap(), alice);
        assert!(resolve("0x1234").is_err());
    }

    #[test]
    fn test_emission_config_from_either_layout() {
        let bare = parse_emission_config("reward_per_block = 40\nstart_block = 9").unwrap();
        assert_eq!(bare.reward_per_block, 40);
        assert_eq!(bare.start_block, 9);

        let nested =
            parse_emission_config("owner = \"dev\"\n[farm]\nreward_per_block = \"7_000\"").unwrap();
        assert_eq!(nested.reward_per_block, 7_000);
        assert_eq!(nested.slave_share_bps, 2_000);
    }

    #[test]
    fn test_holding_allowance_defaults_to_unlimited() {
        let scenario = Scenario::parse(
            "[farm]\nreward_per_block = 1\n[[accounts]]\nlabel = \"a\"\nassets = [{ asset = \"LP\", amount = 5 }, { asset = \"B\", amount = 5, allowance = 2 }]",
        )
        .unwrap();
        assert_eq!(scenario.accounts[0].assets[0].allowance, None);
        assert_eq!(scenario.accounts[0].assets[1].allowance, Some(2));
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("scenarios/a.toml"), "scenarios/a.toml");
    }
}

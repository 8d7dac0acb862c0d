// crates/light-cli/src/runner.rs
//
// Replays a scenario against an in-memory chain and collects a report.

use std::collections::BTreeMap;

use light_core::types::{Amount, BlockHeight, PoolId};
use light_core::{Address, Host, LightError};
use light_economics::{EmissionController, FarmEvent, Light, MemoryChain, PoolKind};
use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, info};

use crate::scenario::{resolve, Action, Scenario, ScenarioError};

type Farm = EmissionController<MemoryChain>;

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct AccountRow {
    pub account: String,
    pub address: String,
    /// Reward token balance in units.
    pub reward: Amount,
    #[tabled(rename = "reward (LIGHT)")]
    pub reward_light: String,
    pub native: Amount,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PositionRow {
    pub account: String,
    pub pool: PoolId,
    pub area: String,
    pub staked: Amount,
    pub pending: Amount,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PoolRow {
    pub pool: PoolId,
    pub kind: String,
    pub asset: String,
    pub alloc_point: u64,
    pub stakers: usize,
    pub total_staked: Amount,
    pub last_reward_block: BlockHeight,
    pub acc_reward_per_share: Amount,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct AreaRow {
    pub area: usize,
    pub pool: PoolId,
    pub label: String,
    pub creator: String,
    pub staked: Amount,
    pub members: u32,
    /// Skim earned but not yet minted.
    pub owed: Amount,
    pub fee_paid: Amount,
    pub fee_forfeited: Amount,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct StepRow {
    pub step: usize,
    pub block: BlockHeight,
    pub caller: String,
    pub action: String,
    pub outcome: String,
}

/// Final farm state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub final_block: BlockHeight,
    pub reward_supply: Amount,
    /// Account allowed to mint the reward token.
    pub reward_owner: String,
    pub area_fee_balance: Amount,
    pub steps: Vec<StepRow>,
    pub accounts: Vec<AccountRow>,
    pub positions: Vec<PositionRow>,
    pub pools: Vec<PoolRow>,
    pub areas: Vec<AreaRow>,
    pub events: Vec<FarmEvent>,
}

/// Address book for rendering addresses back to scenario labels.
struct Labels(BTreeMap<Address, String>);

impl Labels {
    fn name(&self, address: &Address) -> String {
        self.0
            .get(address)
            .cloned()
            .unwrap_or_else(|| address.short())
    }
}

/// Build the farm, fund the accounts, register the pools and replay every step.
pub fn run(scenario: &Scenario) -> Result<Report, ScenarioError> {
    let farm_address = resolve(&scenario.farm_account)?;
    let owner = resolve(&scenario.owner)?;

    let mut labels = BTreeMap::new();
    labels.insert(farm_address, scenario.farm_account.clone());
    labels.insert(owner, scenario.owner.clone());

    let mut chain = MemoryChain::new(farm_address);
    let mut accounts = vec![owner];
    for spec in &scenario.accounts {
        let address = resolve(&spec.label)?;
        labels.insert(address, spec.label.clone());
        for holding in &spec.assets {
            chain.faucet(&holding.asset, address, holding.amount);
            chain.approve(
                &holding.asset,
                address,
                farm_address,
                holding.allowance.unwrap_or(Amount::MAX),
            );
        }
        chain.fund_native(address, spec.native);
        if !accounts.contains(&address) {
            accounts.push(address);
        }
    }
    let labels = Labels(labels);

    let mut farm = EmissionController::new(chain, farm_address, owner, scenario.farm.clone())?;
    for pool in &scenario.pools {
        farm.add_pool(&owner, pool.kind, pool.alloc_point, pool.asset.clone(), false)?;
    }

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        farm.host_mut().advance_to(step.block)?;
        let caller = match &step.caller {
            Some(account) => resolve(account)?,
            None => owner,
        };
        let action = step.action.name();
        let outcome = match (apply(&mut farm, &caller, &step.action), step.expect_error) {
            (Ok(summary), false) => summary,
            (Err(e), true) => format!("failed as expected: {}", e),
            (Err(source), false) => {
                return Err(ScenarioError::StepFailed {
                    index,
                    block: step.block,
                    action,
                    source,
                })
            }
            (Ok(_), true) => {
                return Err(ScenarioError::UnexpectedSuccess {
                    index,
                    block: step.block,
                    action,
                })
            }
        };
        debug!(index, block = step.block, action, %outcome, "Step replayed");
        steps.push(StepRow {
            step: index,
            block: step.block,
            caller: labels.name(&caller),
            action: action.to_string(),
            outcome,
        });
    }

    if let Some(block) = scenario.final_block {
        farm.host_mut().advance_to(block)?;
    }
    info!(
        steps = steps.len(),
        block = farm.host().block_height(),
        supply = farm.host().reward_total_supply(),
        "Scenario replayed"
    );

    build_report(&mut farm, &labels, &accounts, steps)
}

fn apply(farm: &mut Farm, caller: &Address, action: &Action) -> Result<String, LightError> {
    let summary = match action {
        Action::AddPool {
            kind,
            alloc_point,
            asset,
            with_update,
        } => {
            let pid = farm.add_pool(caller, *kind, *alloc_point, asset.clone(), *with_update)?;
            format!("pool {}", pid)
        }
        Action::SetPoolAllocation {
            pool,
            alloc_point,
            with_update,
        } => {
            farm.set_pool_allocation(caller, *pool, *alloc_point, *with_update)?;
            "ok".to_string()
        }
        Action::SetRewardPerBlock { reward_per_block } => {
            farm.set_reward_per_block(caller, *reward_per_block)?;
            "ok".to_string()
        }
        Action::SetAreaCreationFee { fee } => {
            farm.set_area_creation_fee(caller, *fee)?;
            "ok".to_string()
        }
        Action::SetBuyBack { to } => {
            let recipient = to.as_deref().map(resolve).transpose()?;
            farm.set_buy_back(caller, recipient)?;
            "ok".to_string()
        }
        Action::TransferOwnership { to } => {
            farm.transfer_ownership(caller, resolve(to)?)?;
            "ok".to_string()
        }
        Action::UpdatePool { pool } => {
            farm.update_pool(*pool)?;
            "ok".to_string()
        }
        Action::MassUpdatePools => {
            farm.mass_update_pools()?;
            "ok".to_string()
        }
        Action::Deposit { pool, amount } => {
            format!("harvested {}", farm.deposit(caller, *pool, *amount)?)
        }
        Action::Withdraw { pool, amount } => {
            format!("harvested {}", farm.withdraw(caller, *pool, *amount)?)
        }
        Action::EmergencyWithdraw { pool } => {
            format!("returned {}", farm.emergency_withdraw(caller, *pool)?)
        }
        Action::CreateArea {
            pool,
            label,
            payment,
        } => {
            let area = farm.create_area(caller, *pool, label, *payment)?;
            format!("area {}", area)
        }
        Action::SlaveDeposit { pool, area, amount } => {
            format!("harvested {}", farm.slave_deposit(caller, *pool, *area, *amount)?)
        }
        Action::SlaveWithdraw { pool, amount } => {
            format!("harvested {}", farm.slave_withdraw(caller, *pool, *amount)?)
        }
        Action::SlaveEmergencyWithdraw { pool } => {
            format!("returned {}", farm.slave_emergency_withdraw(caller, *pool)?)
        }
        Action::TransferCreateAreaFee { to, amount } => {
            farm.transfer_create_area_fee(caller, resolve(to)?, *amount)?;
            "ok".to_string()
        }
    };
    Ok(summary)
}

fn build_report(
    farm: &mut Farm,
    labels: &Labels,
    accounts: &[Address],
    steps: Vec<StepRow>,
) -> Result<Report, ScenarioError> {
    let account_rows = accounts
        .iter()
        .map(|address| {
            let reward = farm.host().reward_balance(address);
            AccountRow {
                account: labels.name(address),
                address: address.short(),
                reward,
                reward_light: Light::from_units(reward).to_string(),
                native: farm.host().native_balance(address),
            }
        })
        .collect();

    let mut positions = Vec::new();
    for ((pid, address), position) in farm.ledger().iter() {
        let pending = farm.pending_reward(*pid, address)?;
        if position.amount == 0 && pending == 0 {
            continue;
        }
        positions.push(PositionRow {
            account: labels.name(address),
            pool: *pid,
            area: position
                .area
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
            staked: position.amount,
            pending,
        });
    }
    positions.sort_by(|a, b| (a.pool, &a.account).cmp(&(b.pool, &b.account)));

    let pools = farm
        .pools()
        .iter()
        .map(|(pid, pool)| PoolRow {
            pool: pid,
            kind: pool.kind.to_string(),
            asset: pool.asset.to_string(),
            alloc_point: pool.alloc_point,
            stakers: farm.ledger().staker_count(pid),
            total_staked: pool.total_staked,
            last_reward_block: pool.last_reward_block,
            acc_reward_per_share: pool.acc_reward_per_share,
        })
        .collect();

    let mut areas = Vec::new();
    for (pid, pool) in farm.pools().iter() {
        if pool.kind != PoolKind::Slave {
            continue;
        }
        areas.extend(farm.areas().in_pool(pid).map(|(id, area)| AreaRow {
            area: id,
            pool: pid,
            label: area.label.clone(),
            creator: labels.name(&area.creator),
            staked: area.staked,
            members: area.members,
            owed: area.creator_owed,
            fee_paid: area.creator_fee_paid,
            fee_forfeited: area.creator_fee_forfeited,
        }));
    }

    Ok(Report {
        final_block: farm.host().block_height(),
        reward_supply: farm.host().reward_total_supply(),
        reward_owner: labels.name(&farm.host().reward_owner()),
        area_fee_balance: farm.area_fee_balance(),
        steps,
        accounts: account_rows,
        positions,
        pools,
        areas,
        events: farm.drain_events(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_STAKERS: &str = include_str!("../scenarios/three_stakers.toml");
    const SLAVE_AREA: &str = include_str!("../scenarios/slave_area.toml");

    fn reward_of(report: &Report, account: &str) -> Amount {
        report
            .accounts
            .iter()
            .find(|row| row.account == account)
            .map(|row| row.reward)
            .unwrap_or_default()
    }

    #[test]
    fn test_three_stakers_scenario() {
        let scenario = Scenario::parse(THREE_STAKERS).unwrap();
        let report = run(&scenario).unwrap();
        assert_eq!(reward_of(&report, "alice"), 11_600);
        assert_eq!(reward_of(&report, "bob"), 11_831);
        assert_eq!(reward_of(&report, "carol"), 26_568);
        assert_eq!(report.reward_supply, 50_000);
        assert_eq!(report.reward_owner, "light-farm");
        assert!(report.positions.is_empty());
        assert_eq!(report.pools[0].stakers, 0);
        assert_eq!(report.steps.len(), 8);
        assert!(report.steps[0].outcome.starts_with("harvested"));
    }

    #[test]
    fn test_slave_area_scenario() {
        let scenario = Scenario::parse(SLAVE_AREA).unwrap();
        let report = run(&scenario).unwrap();
        assert_eq!(reward_of(&report, "alice"), 5_383);
        assert_eq!(reward_of(&report, "bob"), 5_880);
        assert_eq!(reward_of(&report, "maker"), 799);
        assert_eq!(report.area_fee_balance, 1);
        assert_eq!(report.areas.len(), 1);
        assert_eq!(report.areas[0].creator, "maker");
        assert_eq!(report.areas[0].fee_forfeited, 200);
        assert_eq!(report.areas[0].owed, 0);
        assert_eq!(report.pools[0].stakers, 3);
        let accounts: Vec<_> = report.positions.iter().map(|p| p.account.as_str()).collect();
        assert_eq!(accounts, vec!["alice", "bob", "carol"]);
        assert!(report
            .steps
            .iter()
            .any(|s| s.outcome.starts_with("failed as expected")));
    }

    #[test]
    fn test_failing_step_aborts_replay() {
        let scenario = Scenario::parse(
            r#"
            [farm]
            reward_per_block = 1000

            [[pools]]
            kind = "master"
            alloc_point = 1
            asset = "LP"

            [[steps]]
            block = 5
            caller = "nobody"
            action = "deposit"
            pool = 0
            amount = 1
            "#,
        )
        .unwrap();
        let err = run(&scenario).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::StepFailed { index: 0, block: 5, action: "deposit", .. }
        ));
    }

    #[test]
    fn test_unexpected_success_is_an_error() {
        let scenario = Scenario::parse(
            r#"
            [farm]
            reward_per_block = 1000

            [[steps]]
            block = 1
            action = "mass_update_pools"
            expect_error = true
            "#,
        )
        .unwrap();
        assert!(matches!(
            run(&scenario),
            Err(ScenarioError::UnexpectedSuccess { index: 0, .. })
        ));
    }
}

// crates/light-economics/src/staking.rs
//
// Stake ledger: per-(pool, user) stake and reward debt.
//
// A position's unclaimed reward is always
//   amount * acc_reward_per_share / ACC_SCALE - reward_debt
// and right after any synchronization `reward_debt` is reset so that this is
// zero. Positions are created on first touch and never removed; a zero amount
// is a valid resting state.

use std::collections::HashMap;

use light_core::error::LightError;
use light_core::identity::Address;
use light_core::types::{Amount, AreaId, PoolId};
use serde::{Deserialize, Serialize};

use crate::pool::accrued;

/// A user's stake in one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPosition {
    /// Currently staked quantity.
    pub amount: Amount,
    /// `amount * acc_reward_per_share / ACC_SCALE` at the last synchronization.
    pub reward_debt: Amount,
    /// Area the stake is bound to. Slave pools only.
    pub area: Option<AreaId>,
}

impl UserPosition {
    /// Reward owed against accumulator value `acc`.
    pub fn pending(&self, acc: Amount) -> Result<Amount, LightError> {
        let earned = accrued(self.amount, acc)?;
        earned.checked_sub(self.reward_debt).ok_or_else(|| {
            LightError::InvalidState(format!(
                "reward debt {} exceeds accrued {}",
                self.reward_debt, earned
            ))
        })
    }

    /// Snapshot the accumulator so that `pending(acc)` is zero.
    pub fn sync_debt(&mut self, acc: Amount) -> Result<(), LightError> {
        self.reward_debt = accrued(self.amount, acc)?;
        Ok(())
    }

    pub fn deposit(&mut self, amount: Amount) -> Result<(), LightError> {
        self.amount = self
            .amount
            .checked_add(amount)
            .ok_or_else(|| LightError::Overflow("position stake exceeds u128".to_string()))?;
        Ok(())
    }

    /// # Errors
    /// Returns `LightError::InsufficientStake` if `amount` exceeds the stake.
    pub fn withdraw(&mut self, amount: Amount) -> Result<(), LightError> {
        if amount > self.amount {
            return Err(LightError::InsufficientStake {
                requested: amount,
                staked: self.amount,
            });
        }
        self.amount -= amount;
        Ok(())
    }
}

/// All positions, keyed by pool and user.
#[derive(Debug, Clone, Default)]
pub struct StakeLedger {
    positions: HashMap<(PoolId, Address), UserPosition>,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of a position; untouched users read as an empty position.
    pub fn get(&self, pid: PoolId, user: &Address) -> UserPosition {
        self.positions
            .get(&(pid, *user))
            .cloned()
            .unwrap_or_default()
    }

    pub fn put(&mut self, pid: PoolId, user: Address, position: UserPosition) {
        self.positions.insert((pid, user), position);
    }

    /// Users with non-zero stake in `pid`.
    pub fn staker_count(&self, pid: PoolId) -> usize {
        self.positions
            .iter()
            .filter(|((p, _), pos)| *p == pid && pos.amount > 0)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(PoolId, Address), &UserPosition)> {
        self.positions.iter()
    }
}

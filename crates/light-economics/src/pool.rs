// crates/light-economics/src/pool.rs
//
// Pool registry: an append-only arena of staking pools.
//
// Each pool carries a lazily advanced accumulator. `acc_reward_per_share` is
// the reward earned per unit of stake since the pool was created, scaled by
// ACC_SCALE. Slave pools carry a second accumulator for the area creators'
// skim. Both only ever grow.
//
// Amount * accumulator must fit in u128: with ACC_SCALE = 10^12, a pool whose
// total stake times per-share reward stays below ~3.4 * 10^26 is safe. Every
// product is checked and surfaces as `LightError::Overflow` otherwise.

use light_core::error::LightError;
use light_core::types::{Amount, AssetId, BlockHeight, PoolId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-point scale of the per-share accumulators.
pub const ACC_SCALE: Amount = 1_000_000_000_000;

/// Which half of the emission a pool draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Plain staking pool.
    Master,
    /// Pool subdivided into creator-owned areas.
    Slave,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Master => f.write_str("master"),
            PoolKind::Slave => f.write_str("slave"),
        }
    }
}

/// A registered staking pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub kind: PoolKind,
    /// Asset accepted by this pool.
    pub asset: AssetId,
    /// Weight within the pool's kind.
    pub alloc_point: u64,
    /// Last height the accumulators were advanced to.
    pub last_reward_block: BlockHeight,
    /// Stakers' reward per unit of stake, scaled by ACC_SCALE.
    pub acc_reward_per_share: Amount,
    /// Creators' skim per unit of stake, scaled by ACC_SCALE. Always zero on master pools.
    pub acc_creator_per_share: Amount,
    /// Sum of every position's stake in this pool.
    pub total_staked: Amount,
}

impl Pool {
    pub fn new(kind: PoolKind, asset: AssetId, alloc_point: u64, last_reward_block: BlockHeight) -> Self {
        Self {
            kind,
            asset,
            alloc_point,
            last_reward_block,
            acc_reward_per_share: 0,
            acc_creator_per_share: 0,
            total_staked: 0,
        }
    }

    /// Distribute `stakers` and `creator` reward across the current stake.
    ///
    /// Does nothing when the pool is empty; the caller must not mint for an
    /// empty pool.
    pub fn credit(&mut self, stakers: Amount, creator: Amount) -> Result<(), LightError> {
        if self.total_staked == 0 {
            return Ok(());
        }
        self.acc_reward_per_share = self
            .acc_reward_per_share
            .checked_add(per_share(stakers, self.total_staked)?)
            .ok_or_else(|| LightError::Overflow("acc_reward_per_share exceeds u128".to_string()))?;
        self.acc_creator_per_share = self
            .acc_creator_per_share
            .checked_add(per_share(creator, self.total_staked)?)
            .ok_or_else(|| LightError::Overflow("acc_creator_per_share exceeds u128".to_string()))?;
        Ok(())
    }

    pub fn add_stake(&mut self, amount: Amount) -> Result<(), LightError> {
        self.total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or_else(|| LightError::Overflow("pool total stake exceeds u128".to_string()))?;
        Ok(())
    }

    pub fn remove_stake(&mut self, amount: Amount) -> Result<(), LightError> {
        self.total_staked = self.total_staked.checked_sub(amount).ok_or_else(|| {
            LightError::InvalidState(format!(
                "pool holds {} staked but {} is being removed",
                self.total_staked, amount
            ))
        })?;
        Ok(())
    }
}

/// `reward * ACC_SCALE / stake`.
fn per_share(reward: Amount, stake: Amount) -> Result<Amount, LightError> {
    let scaled = reward.checked_mul(ACC_SCALE).ok_or_else(|| {
        LightError::Overflow(format!("reward {} * ACC_SCALE exceeds u128", reward))
    })?;
    Ok(scaled / stake)
}

/// `amount * acc / ACC_SCALE`: the share of an accumulator earned by `amount`.
pub fn accrued(amount: Amount, acc: Amount) -> Result<Amount, LightError> {
    let product = amount.checked_mul(acc).ok_or_else(|| {
        LightError::Overflow(format!("stake {} * accumulator {} exceeds u128", amount, acc))
    })?;
    Ok(product / ACC_SCALE)
}

/// Ordered collection of pools with per-kind allocation totals.
///
/// Indices are stable: pools are never removed, only reweighted to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolRegistry {
    pools: Vec<Pool>,
    total_alloc_master: u64,
    total_alloc_slave: u64,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pool and return its id.
    ///
    /// # Errors
    /// Returns `LightError::Overflow` if the kind's total allocation overflows.
    pub fn add(&mut self, pool: Pool) -> Result<PoolId, LightError> {
        let total = self.total_alloc(pool.kind);
        let new_total = total.checked_add(pool.alloc_point).ok_or_else(|| {
            LightError::Overflow(format!("total {} allocation exceeds u64", pool.kind))
        })?;
        self.set_total(pool.kind, new_total);
        self.pools.push(pool);
        Ok(self.pools.len() - 1)
    }

    /// Reweight a pool, keeping its kind's total in step.
    pub fn set_alloc(&mut self, pid: PoolId, alloc_point: u64) -> Result<u64, LightError> {
        let (kind, previous) = {
            let pool = self.get(pid)?;
            (pool.kind, pool.alloc_point)
        };
        let new_total = (self.total_alloc(kind) - previous)
            .checked_add(alloc_point)
            .ok_or_else(|| LightError::Overflow(format!("total {} allocation exceeds u64", kind)))?;
        self.set_total(kind, new_total);
        self.get_mut(pid)?.alloc_point = alloc_point;
        Ok(previous)
    }

    pub fn get(&self, pid: PoolId) -> Result<&Pool, LightError> {
        self.pools
            .get(pid)
            .ok_or_else(|| LightError::InvalidIndex(format!("pool {} (registered: {})", pid, self.pools.len())))
    }

    pub fn get_mut(&mut self, pid: PoolId) -> Result<&mut Pool, LightError> {
        let len = self.pools.len();
        self.pools
            .get_mut(pid)
            .ok_or_else(|| LightError::InvalidIndex(format!("pool {} (registered: {})", pid, len)))
    }

    /// Overwrite a pool with a staged copy.
    pub fn replace(&mut self, pid: PoolId, pool: Pool) -> Result<(), LightError> {
        *self.get_mut(pid)? = pool;
        Ok(())
    }

    pub fn total_alloc(&self, kind: PoolKind) -> u64 {
        match kind {
            PoolKind::Master => self.total_alloc_master,
            PoolKind::Slave => self.total_alloc_slave,
        }
    }

    fn set_total(&mut self, kind: PoolKind, total: u64) {
        match kind {
            PoolKind::Master => self.total_alloc_master = total,
            PoolKind::Slave => self.total_alloc_slave = total,
        }
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolId, &Pool)> {
        self.pools.iter().enumerate()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PoolId, &mut Pool)> {
        self.pools.iter_mut().enumerate()
    }
}

// crates/light-economics/src/rewards.rs
//
// Integer split arithmetic for emission.
//
// A block's global emission is divided in three steps:
//   1. By pool kind: `slave_share_bps` to slave pools, the rest to master pools.
//   2. By pool weight: `alloc_point / total_alloc_point` of the pool's kind.
//   3. Slave pools only: `creator_fee_bps` of the pool's reward is skimmed for
//      area creators, the remainder goes to stakers.
//
// Every step floors. Dust from flooring is never minted.

use light_core::error::LightError;
use light_core::types::Amount;
use serde::{Deserialize, Serialize};

/// Basis-point denominator: 10,000 bps = 100%.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// `floor(amount * bps / 10_000)` without intermediate overflow.
pub fn bps_of(amount: Amount, bps: u32) -> Amount {
    let denom = BPS_DENOMINATOR as Amount;
    let bps = bps as Amount;
    (amount / denom) * bps + (amount % denom) * bps / denom
}

/// A slave pool's reward, divided between stakers and area creators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardSplit {
    /// Credited to stakers through `acc_reward_per_share`.
    pub stakers: Amount,
    /// Credited to area creators through `acc_creator_per_share`.
    pub creator: Amount,
}

/// Skim `fee_bps` of `reward` for creators. Stakers receive the floored
/// remainder share; the creator side absorbs the rounding.
pub fn split_creator_fee(reward: Amount, fee_bps: u32) -> RewardSplit {
    let stakers = bps_of(reward, BPS_DENOMINATOR.saturating_sub(fee_bps));
    RewardSplit {
        stakers,
        creator: reward - stakers,
    }
}

/// `floor(reward * alloc_point / total_alloc_point)`.
///
/// Returns zero when the kind has no allocation at all.
///
/// # Errors
/// Returns `LightError::Overflow` if `reward * alloc_point` exceeds `u128`.
pub fn weighted_share(reward: Amount, alloc_point: u64, total_alloc_point: u64) -> Result<Amount, LightError> {
    if total_alloc_point == 0 || alloc_point == 0 {
        return Ok(0);
    }
    let scaled = reward.checked_mul(alloc_point as Amount).ok_or_else(|| {
        LightError::Overflow(format!(
            "pool reward {} * alloc point {} exceeds u128",
            reward, alloc_point
        ))
    })?;
    Ok(scaled / total_alloc_point as Amount)
}

// crates/light-economics/src/schedule.rs
//
// Block reward schedule with halving.
//
// The global rate is first split between pool kinds, then halved every
// `halving_interval` blocks counted from `start_block`:
//   rate(kind, h) = kind_rate(kind) >> ((h - start_block) / halving_interval)
//
// The boundary block of each halving already pays the lower rate. Nothing is
// emitted before `start_block`, at or after the optional emission end, or once
// the shift truncates the rate to zero.

use light_core::types::{Amount, BlockHeight};
use serde::{Deserialize, Serialize};

use crate::config::EmissionConfig;
use crate::pool::PoolKind;
use crate::rewards::{bps_of, BPS_DENOMINATOR};

/// Halvings after which any `u128` rate has shifted to zero.
const MAX_HALVINGS: u64 = 128;

/// The halving curve. Pure function of height and pool kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSchedule {
    pub reward_per_block: Amount,
    pub start_block: BlockHeight,
    pub halving_interval: BlockHeight,
    pub emission_end: Option<BlockHeight>,
    pub slave_share_bps: u32,
}

impl RewardSchedule {
    pub fn from_config(config: &EmissionConfig) -> Self {
        Self {
            reward_per_block: config.reward_per_block,
            start_block: config.start_block,
            halving_interval: config.halving_interval,
            emission_end: config.emission_end(),
            slave_share_bps: config.slave_share_bps,
        }
    }

    /// Per-block rate of a pool kind before any halving.
    pub fn kind_rate(&self, kind: PoolKind) -> Amount {
        match kind {
            PoolKind::Master => bps_of(
                self.reward_per_block,
                BPS_DENOMINATOR.saturating_sub(self.slave_share_bps),
            ),
            PoolKind::Slave => bps_of(self.reward_per_block, self.slave_share_bps),
        }
    }

    /// Number of halvings applied at `height`, or `None` before `start_block`.
    pub fn halvings_at(&self, height: BlockHeight) -> Option<u64> {
        if height < self.start_block || self.halving_interval == 0 {
            return None;
        }
        Some((height - self.start_block) / self.halving_interval)
    }

    /// Rate paid to all pools of `kind` at `height`.
    pub fn block_reward(&self, height: BlockHeight, kind: PoolKind) -> Amount {
        self.rate_at(self.kind_rate(kind), height)
    }

    /// Total paid to all pools of `kind` over `[from, to)`.
    ///
    /// Sums one closed-form term per halving segment overlapping the range.
    pub fn block_rewards(&self, from: BlockHeight, to: BlockHeight, kind: PoolKind) -> Amount {
        self.integrate(self.kind_rate(kind), from, to)
    }

    /// Global (pre-split) emission over `[start_block, height)`.
    pub fn cumulative_emission(&self, height: BlockHeight) -> Amount {
        self.integrate(self.reward_per_block, self.start_block, height)
    }

    /// `(height, rate)` at the start of every emitting halving segment of
    /// `kind`, stopping at the emission end or the first zero rate.
    pub fn halving_boundaries(&self, kind: PoolKind, limit: usize) -> Vec<(BlockHeight, Amount)> {
        let base = self.kind_rate(kind);
        let mut out = Vec::new();
        for k in 0..MAX_HALVINGS.min(limit as u64) {
            let Some(height) = k
                .checked_mul(self.halving_interval)
                .and_then(|offset| self.start_block.checked_add(offset))
            else {
                break;
            };
            if self.emission_end.is_some_and(|end| height >= end) {
                break;
            }
            let rate = base >> k;
            if rate == 0 {
                break;
            }
            out.push((height, rate));
        }
        out
    }

    fn rate_at(&self, base: Amount, height: BlockHeight) -> Amount {
        if self.emission_end.is_some_and(|end| height >= end) {
            return 0;
        }
        match self.halvings_at(height) {
            Some(k) if k < MAX_HALVINGS => base >> k,
            _ => 0,
        }
    }

    fn integrate(&self, base: Amount, from: BlockHeight, to: BlockHeight) -> Amount {
        let lo = from.max(self.start_block);
        let hi = match self.emission_end {
            Some(end) => to.min(end),
            None => to,
        };
        if hi <= lo || self.halving_interval == 0 {
            return 0;
        }

        let mut total: Amount = 0;
        let mut current = lo;
        while current < hi {
            let k = (current - self.start_block) / self.halving_interval;
            if k >= MAX_HALVINGS {
                break;
            }
            let rate = base >> k;
            if rate == 0 {
                break;
            }
            let next_halving = (k + 1)
                .checked_mul(self.halving_interval)
                .and_then(|offset| self.start_block.checked_add(offset))
                .unwrap_or(BlockHeight::MAX);
            let segment_end = hi.min(next_halving);
            let blocks = (segment_end - current) as Amount;
            total = total.saturating_add(rate.saturating_mul(blocks));
            current = segment_end;
        }
        total
    }
}

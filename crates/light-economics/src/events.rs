// crates/light-economics/src/events.rs
//
// Events emitted by the emission controller for off-chain indexing.
//
// The controller buffers events as calls commit; callers drain them with
// `EmissionController::drain_events`. A failed call emits nothing.

use light_core::identity::Address;
use light_core::types::{Amount, AreaId, AssetId, BlockHeight, PoolId};
use serde::{Deserialize, Serialize};

use crate::pool::PoolKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FarmEvent {
    PoolAdded {
        pool: PoolId,
        kind: PoolKind,
        asset: AssetId,
        alloc_point: u64,
        /// Height from which the pool accrues.
        last_reward_block: BlockHeight,
    },
    PoolAllocationSet {
        pool: PoolId,
        previous: u64,
        alloc_point: u64,
    },
    RewardRateSet {
        previous: Amount,
        reward_per_block: Amount,
        block: BlockHeight,
    },
    AreaCreationFeeSet {
        previous: Amount,
        fee: Amount,
    },
    /// Stake added (possibly zero, i.e. a harvest).
    Deposit {
        user: Address,
        pool: PoolId,
        /// Area the stake is bound to, for slave pools.
        area: Option<AreaId>,
        amount: Amount,
        /// Reward paid out by this call.
        harvested: Amount,
    },
    Withdraw {
        user: Address,
        pool: PoolId,
        area: Option<AreaId>,
        amount: Amount,
        harvested: Amount,
    },
    /// Stake returned with pending reward forfeited.
    EmergencyWithdraw {
        user: Address,
        pool: PoolId,
        area: Option<AreaId>,
        amount: Amount,
    },
    AreaCreated {
        area: AreaId,
        pool: PoolId,
        creator: Address,
        label: String,
        fee_paid: Amount,
    },
    CreatorFeePaid {
        area: AreaId,
        creator: Address,
        amount: Amount,
    },
    /// Creator skim dropped: too few members, or no supply headroom left.
    CreatorFeeForfeited {
        area: AreaId,
        amount: Amount,
    },
    AreaFeesSwept {
        to: Address,
        amount: Amount,
    },
    BuyBackSet {
        recipient: Option<Address>,
    },
    OwnershipTransferred {
        previous: Address,
        owner: Address,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = FarmEvent::Deposit {
            user: Address::from_label("alice"),
            pool: 0,
            area: None,
            amount: 10,
            harvested: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "deposit");
        assert_eq!(json["amount"], 10);
        assert!(json["area"].is_null());
    }
}

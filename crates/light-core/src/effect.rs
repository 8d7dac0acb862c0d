// crates/light-core/src/effect.rs
//
// Instructions the farm hands to its host chain.
//
// The engine never touches balances itself. Each entry point stages an ordered
// list of effects and submits the whole list through `Host::execute`, which
// applies all of them or none.

use serde::{Deserialize, Serialize};

use crate::identity::Address;
use crate::types::{Amount, AssetId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Mint fresh reward token. Fails unless `minter` owns the reward token.
    MintReward {
        minter: Address,
        to: Address,
        amount: Amount,
    },
    /// Move reward token already held by `from`.
    TransferReward {
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// Pull staked asset from `from` using the allowance granted to `spender`.
    TransferAssetFrom {
        asset: AssetId,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// Push staked asset held by `from`.
    TransferAsset {
        asset: AssetId,
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// Move native currency (area creation fees).
    TransferNative {
        from: Address,
        to: Address,
        amount: Amount,
    },
}

impl Effect {
    /// Amount carried by the effect, whatever its kind.
    pub fn amount(&self) -> Amount {
        match self {
            Effect::MintReward { amount, .. }
            | Effect::TransferReward { amount, .. }
            | Effect::TransferAssetFrom { amount, .. }
            | Effect::TransferAsset { amount, .. }
            | Effect::TransferNative { amount, .. } => *amount,
        }
    }

    /// Whether the effect mints new reward token.
    pub fn is_mint(&self) -> bool {
        matches!(self, Effect::MintReward { .. })
    }
}

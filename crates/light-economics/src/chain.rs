// crates/light-economics/src/chain.rs
//
// In-memory host chain.
//
// Holds the reward token ledger (balances, supply, minting owner), staked
// asset balances with allowances, and native balances. `execute` applies an
// effect batch to a scratch copy and swaps it in only if every effect
// succeeded, so a failing transfer rolls back the mints staged before it.

use std::collections::HashMap;

use light_core::effect::Effect;
use light_core::error::LightError;
use light_core::identity::Address;
use light_core::traits::Host;
use light_core::types::{Amount, AssetId, BlockHeight};
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct MemoryChain {
    height: BlockHeight,
    reward_owner: Address,
    reward_supply: Amount,
    reward_balances: HashMap<Address, Amount>,
    asset_balances: HashMap<(AssetId, Address), Amount>,
    /// (asset, holder, spender) -> remaining allowance.
    allowances: HashMap<(AssetId, Address, Address), Amount>,
    native_balances: HashMap<Address, Amount>,
}

impl MemoryChain {
    /// Fresh chain at height 0 whose reward token is owned by `reward_owner`.
    pub fn new(reward_owner: Address) -> Self {
        Self {
            reward_owner,
            ..Self::default()
        }
    }

    /// Move the clock forward to `height`.
    ///
    /// # Errors
    /// Returns `LightError::InvalidState` if `height` is below the current height.
    pub fn advance_to(&mut self, height: BlockHeight) -> Result<(), LightError> {
        if height < self.height {
            return Err(LightError::InvalidState(format!(
                "block height cannot go back from {} to {}",
                self.height, height
            )));
        }
        self.height = height;
        Ok(())
    }

    /// Mine `blocks` empty blocks.
    pub fn mine(&mut self, blocks: BlockHeight) {
        self.height = self.height.saturating_add(blocks);
    }

    /// Credit staked asset out of thin air (test and simulation setup).
    pub fn faucet(&mut self, asset: &AssetId, to: Address, amount: Amount) {
        let balance = self.asset_balances.entry((asset.clone(), to)).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn fund_native(&mut self, to: Address, amount: Amount) {
        let balance = self.native_balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Set `spender`'s allowance over `holder`'s asset. `Amount::MAX` never decreases.
    pub fn approve(&mut self, asset: &AssetId, holder: Address, spender: Address, amount: Amount) {
        self.allowances.insert((asset.clone(), holder, spender), amount);
    }

    /// Hand minting rights to another account.
    ///
    /// # Errors
    /// Returns `LightError::Unauthorized` unless `caller` owns the reward token.
    pub fn transfer_reward_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), LightError> {
        if *caller != self.reward_owner {
            return Err(LightError::Unauthorized(format!(
                "{} does not own the reward token",
                caller
            )));
        }
        self.reward_owner = new_owner;
        Ok(())
    }

    pub fn reward_balance(&self, who: &Address) -> Amount {
        self.reward_balances.get(who).copied().unwrap_or(0)
    }

    pub fn asset_balance(&self, asset: &AssetId, who: &Address) -> Amount {
        self.asset_balances
            .get(&(asset.clone(), *who))
            .copied()
            .unwrap_or(0)
    }

    pub fn allowance(&self, asset: &AssetId, holder: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(asset.clone(), *holder, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn native_balance(&self, who: &Address) -> Amount {
        self.native_balances.get(who).copied().unwrap_or(0)
    }

    fn apply(&mut self, effect: &Effect) -> Result<(), LightError> {
        trace!(?effect, "Applying effect");
        match effect {
            Effect::MintReward { minter, to, amount } => {
                if *minter != self.reward_owner {
                    return Err(LightError::ExternalTransfer(format!(
                        "mint: {} is not the reward token owner",
                        minter
                    )));
                }
                self.reward_supply = self
                    .reward_supply
                    .checked_add(*amount)
                    .ok_or_else(|| LightError::ExternalTransfer("mint: total supply overflow".to_string()))?;
                credit(&mut self.reward_balances, *to, *amount, "reward")
            }
            Effect::TransferReward { from, to, amount } => {
                debit(&mut self.reward_balances, *from, *amount, "reward")?;
                credit(&mut self.reward_balances, *to, *amount, "reward")
            }
            Effect::TransferAssetFrom {
                asset,
                spender,
                from,
                to,
                amount,
            } => {
                let key = (asset.clone(), *from, *spender);
                let allowed = self.allowances.get(&key).copied().unwrap_or(0);
                if allowed < *amount {
                    return Err(LightError::ExternalTransfer(format!(
                        "{}: insufficient allowance: {} approved for {} but {} requested",
                        asset, allowed, spender, amount
                    )));
                }
                if allowed != Amount::MAX {
                    self.allowances.insert(key, allowed - amount);
                }
                self.move_asset(asset, *from, *to, *amount)
            }
            Effect::TransferAsset {
                asset,
                from,
                to,
                amount,
            } => self.move_asset(asset, *from, *to, *amount),
            Effect::TransferNative { from, to, amount } => {
                debit(&mut self.native_balances, *from, *amount, "native")?;
                credit(&mut self.native_balances, *to, *amount, "native")
            }
        }
    }

    fn move_asset(&mut self, asset: &AssetId, from: Address, to: Address, amount: Amount) -> Result<(), LightError> {
        let from_key = (asset.clone(), from);
        let balance = self.asset_balances.get(&from_key).copied().unwrap_or(0);
        if balance < amount {
            return Err(LightError::ExternalTransfer(format!(
                "{}: insufficient balance: {} holds {} but {} requested",
                asset, from, balance, amount
            )));
        }
        self.asset_balances.insert(from_key, balance - amount);
        let to_balance = self.asset_balances.entry((asset.clone(), to)).or_default();
        *to_balance = to_balance
            .checked_add(amount)
            .ok_or_else(|| LightError::ExternalTransfer(format!("{}: balance overflow", asset)))?;
        Ok(())
    }
}

fn debit(ledger: &mut HashMap<Address, Amount>, who: Address, amount: Amount, what: &str) -> Result<(), LightError> {
    let balance = ledger.get(&who).copied().unwrap_or(0);
    if balance < amount {
        return Err(LightError::ExternalTransfer(format!(
            "{}: insufficient balance: {} holds {} but {} requested",
            what, who, balance, amount
        )));
    }
    ledger.insert(who, balance - amount);
    Ok(())
}

fn credit(ledger: &mut HashMap<Address, Amount>, who: Address, amount: Amount, what: &str) -> Result<(), LightError> {
    let balance = ledger.entry(who).or_default();
    *balance = balance
        .checked_add(amount)
        .ok_or_else(|| LightError::ExternalTransfer(format!("{}: balance overflow", what)))?;
    Ok(())
}

impl Host for MemoryChain {
    fn block_height(&self) -> BlockHeight {
        self.height
    }

    fn reward_total_supply(&self) -> Amount {
        self.reward_supply
    }

    fn reward_owner(&self) -> Address {
        self.reward_owner
    }

    fn execute(&mut self, effects: &[Effect]) -> Result<(), LightError> {
        let mut scratch = self.clone();
        for effect in effects {
            scratch.apply(effect)?;
        }
        *self = scratch;
        Ok(())
    }
}

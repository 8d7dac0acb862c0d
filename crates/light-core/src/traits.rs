// crates/light-core/src/traits.rs

use crate::effect::Effect;
use crate::error::LightError;
use crate::identity::Address;
use crate::types::{Amount, BlockHeight};

/// The chain the farm runs on: its clock, the reward token's view, and the
/// transactional executor for effects.
///
/// Implemented by light-economics `MemoryChain` (in-memory ledger).
pub trait Host {
    /// Current block height. Never decreases between calls.
    fn block_height(&self) -> BlockHeight;

    /// Total supply of the reward token.
    fn reward_total_supply(&self) -> Amount;

    /// Current owner of the reward token (the only address allowed to mint).
    fn reward_owner(&self) -> Address;

    /// Apply `effects` in order, all or nothing.
    ///
    /// On `Err` the host state must be exactly as it was before the call.
    fn execute(&mut self, effects: &[Effect]) -> Result<(), LightError>;
}

// crates/light-economics/src/area.rs
//
// Creator-owned areas inside slave pools.
//
// An area's creator earns the pool's creator skim on the stake bound to the
// area, tracked like a position against `acc_creator_per_share`:
//   pending = staked * acc_creator_per_share / ACC_SCALE - creator_debt
// The skim is only paid for spans during which the area had at least
// `min_area_members` staked members; otherwise it is forfeited at settlement.
// Skim judged while a member leaves without settling is parked in
// `creator_owed` until the next settlement pays it.

use light_core::error::LightError;
use light_core::identity::Address;
use light_core::types::{Amount, AreaId, PoolId};
use serde::{Deserialize, Serialize};

use crate::pool::accrued;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub creator: Address,
    pub label: String,
    /// Owning slave pool.
    pub pool: PoolId,
    /// Stake of all positions bound to this area.
    pub staked: Amount,
    /// Positions with non-zero stake bound to this area.
    pub members: u32,
    /// `staked * acc_creator_per_share / ACC_SCALE` at the last settlement.
    pub creator_debt: Amount,
    /// Skim already earned by a qualifying span but not yet minted.
    #[serde(default)]
    pub creator_owed: Amount,
    /// Lifetime skim minted to the creator.
    pub creator_fee_paid: Amount,
    /// Lifetime skim dropped for lack of members or supply headroom.
    pub creator_fee_forfeited: Amount,
}

impl Area {
    pub fn new(creator: Address, label: impl Into<String>, pool: PoolId) -> Self {
        Self {
            creator,
            label: label.into(),
            pool,
            staked: 0,
            members: 0,
            creator_debt: 0,
            creator_owed: 0,
            creator_fee_paid: 0,
            creator_fee_forfeited: 0,
        }
    }

    /// Unsettled skim against creator accumulator `acc`.
    pub fn creator_pending(&self, acc: Amount) -> Result<Amount, LightError> {
        Ok(accrued(self.staked, acc)?.saturating_sub(self.creator_debt))
    }

    pub fn qualifies(&self, min_members: u32) -> bool {
        self.members >= min_members
    }

    /// Reset `creator_debt` so that nothing is pending at `acc`.
    pub fn rebase(&mut self, acc: Amount) -> Result<(), LightError> {
        self.creator_debt = accrued(self.staked, acc)?;
        Ok(())
    }

    /// Add stake from a position. `joining` when the position was empty.
    pub fn join(&mut self, amount: Amount, joining: bool) -> Result<(), LightError> {
        self.staked = self
            .staked
            .checked_add(amount)
            .ok_or_else(|| LightError::Overflow("area stake exceeds u128".to_string()))?;
        if joining {
            self.members += 1;
        }
        Ok(())
    }

    /// Remove stake from a position. `leaving` when the position is now empty.
    pub fn leave(&mut self, amount: Amount, leaving: bool) -> Result<(), LightError> {
        self.staked = self.staked.checked_sub(amount).ok_or_else(|| {
            LightError::InvalidState(format!(
                "area holds {} staked but {} is being removed",
                self.staked, amount
            ))
        })?;
        if leaving {
            self.members = self.members.saturating_sub(1);
        }
        Ok(())
    }

    /// Remove a whole position's stake without minting.
    ///
    /// The unsettled skim is judged against the membership it was earned
    /// under: a qualifying amount moves to `creator_owed`, anything else is
    /// forfeited. Returns the forfeited amount.
    pub fn evict(&mut self, amount: Amount, acc: Amount, min_members: u32) -> Result<Amount, LightError> {
        let pending = self.creator_pending(acc)?;
        let forfeited = if self.qualifies(min_members) {
            self.creator_owed = self
                .creator_owed
                .checked_add(pending)
                .ok_or_else(|| LightError::Overflow("creator owed exceeds u128".to_string()))?;
            0
        } else {
            self.creator_fee_forfeited = self.creator_fee_forfeited.saturating_add(pending);
            pending
        };
        self.leave(amount, true)?;
        self.rebase(acc)?;
        Ok(forfeited)
    }
}

/// Append-only arena of areas across all slave pools.
#[derive(Debug, Clone, Default)]
pub struct AreaRegistry {
    areas: Vec<Area>,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, area: Area) -> AreaId {
        self.areas.push(area);
        self.areas.len() - 1
    }

    pub fn get(&self, id: AreaId) -> Result<&Area, LightError> {
        self.areas
            .get(id)
            .ok_or_else(|| LightError::InvalidIndex(format!("area {} (registered: {})", id, self.areas.len())))
    }

    pub fn replace(&mut self, id: AreaId, area: Area) -> Result<(), LightError> {
        let len = self.areas.len();
        let slot = self
            .areas
            .get_mut(id)
            .ok_or_else(|| LightError::InvalidIndex(format!("area {} (registered: {})", id, len)))?;
        *slot = area;
        Ok(())
    }

    /// Areas of `pid` created by `creator`.
    pub fn by_creator<'a>(
        &'a self,
        pid: PoolId,
        creator: &'a Address,
    ) -> impl Iterator<Item = (AreaId, &'a Area)> + 'a {
        self.iter()
            .filter(move |(_, a)| a.pool == pid && a.creator == *creator)
    }

    /// Areas hosted by slave pool `pid`.
    pub fn in_pool(&self, pid: PoolId) -> impl Iterator<Item = (AreaId, &Area)> {
        self.iter().filter(move |(_, a)| a.pool == pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AreaId, &Area)> {
        self.areas.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ACC_SCALE;

    fn creator() -> Address {
        Address::from_label("creator")
    }

    #[test]
    fn test_membership_counts() {
        let mut area = Area::new(creator(), "north", 0);
        area.join(10, true).unwrap();
        area.join(5, false).unwrap();
        area.join(20, true).unwrap();
        assert_eq!(area.staked, 35);
        assert_eq!(area.members, 2);
        assert!(area.qualifies(2));
        area.leave(15, true).unwrap();
        assert_eq!(area.members, 1);
        assert!(!area.qualifies(2));
        assert!(area.leave(100, false).is_err());
    }

    #[test]
    fn test_creator_pending_and_rebase() {
        let mut area = Area::new(creator(), "north", 0);
        area.join(20, true).unwrap();
        area.rebase(0).unwrap();
        assert_eq!(area.creator_pending(5 * ACC_SCALE).unwrap(), 100);
        area.rebase(5 * ACC_SCALE).unwrap();
        assert_eq!(area.creator_pending(5 * ACC_SCALE).unwrap(), 0);
    }

    #[test]
    fn test_evict_parks_qualifying_skim() {
        let mut area = Area::new(creator(), "north", 0);
        area.join(20, true).unwrap();
        area.join(10, true).unwrap();
        area.rebase(0).unwrap();
        // 30 staked earned 2 per unit with two members
        assert_eq!(area.creator_pending(2 * ACC_SCALE).unwrap(), 60);
        assert_eq!(area.evict(20, 2 * ACC_SCALE, 2).unwrap(), 0);
        assert_eq!(area.staked, 10);
        assert_eq!(area.members, 1);
        assert_eq!(area.creator_owed, 60);
        assert_eq!(area.creator_pending(2 * ACC_SCALE).unwrap(), 0);
        assert_eq!(area.creator_pending(3 * ACC_SCALE).unwrap(), 10);
        assert_eq!(area.creator_fee_forfeited, 0);
    }

    #[test]
    fn test_evict_forfeits_skim_from_lone_member() {
        let mut area = Area::new(creator(), "north", 0);
        area.join(100, true).unwrap();
        area.rebase(ACC_SCALE).unwrap();
        assert_eq!(area.evict(100, 2 * ACC_SCALE, 2).unwrap(), 100);
        assert_eq!(area.creator_owed, 0);
        assert_eq!(area.creator_fee_forfeited, 100);
        assert_eq!(area.members, 0);
        assert_eq!(area.creator_debt, 0);
    }

    #[test]
    fn test_registry_lookup() {
        let mut reg = AreaRegistry::new();
        let other = Address::from_label("other");
        assert_eq!(reg.create(Area::new(creator(), "a", 1)), 0);
        assert_eq!(reg.create(Area::new(other, "b", 1)), 1);
        assert_eq!(reg.create(Area::new(creator(), "c", 2)), 2);
        let c = creator();
        let mine: Vec<AreaId> = reg.by_creator(1, &c).map(|(id, _)| id).collect();
        assert_eq!(mine, vec![0]);
        assert_eq!(reg.in_pool(1).count(), 2);
        assert!(matches!(reg.get(9), Err(LightError::InvalidIndex(_))));
    }
}

// crates/light-economics/src/controller.rs
//
// Emission controller: the farm's entry points.
//
// Every state-changing call runs in three steps:
//   1. Stage: copy the pool, position and area records it touches, advance
//      the pool accumulator to the current height, and collect the external
//      effects (mint, reward transfer, asset transfer) in a `Tx`.
//   2. Execute: hand the effect batch to the host, which applies all or none.
//   3. Commit: only if the host accepted the batch, write the staged records
//      back and publish the staged events.
// A failing collaborator therefore leaves both the host and the farm exactly
// as they were. Entry points take `&mut self`, so no call can re-enter another.
//
// Effects are staged in a fixed order: mints first, then reward payouts, then
// the staked-asset transfer last.

use light_core::effect::Effect;
use light_core::error::LightError;
use light_core::identity::Address;
use light_core::traits::Host;
use light_core::types::{Amount, AreaId, AssetId, BlockHeight, PoolId};
use tracing::{debug, info, warn};

use crate::access::Authority;
use crate::area::{Area, AreaRegistry};
use crate::config::EmissionConfig;
use crate::events::FarmEvent;
use crate::pool::{Pool, PoolKind, PoolRegistry};
use crate::rewards::{split_creator_fee, weighted_share, RewardSplit};
use crate::schedule::RewardSchedule;
use crate::staking::{StakeLedger, UserPosition};
use crate::treasury::FeeVault;

/// Effects and mint headroom staged by one call.
struct Tx {
    height: BlockHeight,
    /// Remaining mintable supply, when a ceiling is configured.
    headroom: Option<Amount>,
    effects: Vec<Effect>,
    events: Vec<FarmEvent>,
}

impl Tx {
    /// How much of `amount` the supply ceiling still allows.
    fn cap(&self, amount: Amount) -> Amount {
        match self.headroom {
            Some(headroom) => amount.min(headroom),
            None => amount,
        }
    }

    /// Stage a mint, clamped to the headroom. Returns the amount staged.
    fn mint(&mut self, minter: Address, to: Address, amount: Amount) -> Amount {
        let minted = self.cap(amount);
        if let Some(headroom) = self.headroom.as_mut() {
            *headroom -= minted;
        }
        if minted > 0 {
            self.effects.push(Effect::MintReward {
                minter,
                to,
                amount: minted,
            });
        }
        minted
    }

    fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    fn emit(&mut self, event: FarmEvent) {
        self.events.push(event);
    }
}

/// The farm: pools, positions, areas and the emission schedule, driven by a host chain.
pub struct EmissionController<H: Host> {
    host: H,
    /// The farm's own account: mints to it, holds stakes and fees.
    address: Address,
    config: EmissionConfig,
    schedule: RewardSchedule,
    authority: Authority,
    pools: PoolRegistry,
    ledger: StakeLedger,
    areas: AreaRegistry,
    vault: FeeVault,
    buy_back: Option<Address>,
    events: Vec<FarmEvent>,
}

impl<H: Host> EmissionController<H> {
    /// Create a farm living at `address`, administered by `owner`.
    ///
    /// The reward token must be owned by `address` for minting to succeed;
    /// that hand-over happens on the host, not here.
    ///
    /// # Errors
    /// Returns `LightError::InvalidConfig` if `config` fails validation.
    pub fn new(host: H, address: Address, owner: Address, config: EmissionConfig) -> Result<Self, LightError> {
        config.validate()?;
        let schedule = RewardSchedule::from_config(&config);
        info!(
            farm = %address,
            owner = %owner,
            reward_per_block = config.reward_per_block,
            start_block = config.start_block,
            halving_interval = config.halving_interval,
            "Emission controller created"
        );
        Ok(Self {
            host,
            address,
            config,
            schedule,
            authority: Authority::new(owner),
            pools: PoolRegistry::new(),
            ledger: StakeLedger::new(),
            areas: AreaRegistry::new(),
            vault: FeeVault::new(),
            buy_back: None,
            events: Vec::new(),
        })
    }

    // ---- Views ----

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, for advancing the clock and funding accounts.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.authority.owner()
    }

    pub fn config(&self) -> &EmissionConfig {
        &self.config
    }

    pub fn schedule(&self) -> &RewardSchedule {
        &self.schedule
    }

    pub fn pools(&self) -> &PoolRegistry {
        &self.pools
    }

    pub fn pool(&self, pid: PoolId) -> Result<&Pool, LightError> {
        self.pools.get(pid)
    }

    pub fn position(&self, pid: PoolId, user: &Address) -> UserPosition {
        self.ledger.get(pid, user)
    }

    pub fn ledger(&self) -> &StakeLedger {
        &self.ledger
    }

    pub fn areas(&self) -> &AreaRegistry {
        &self.areas
    }

    pub fn area(&self, id: AreaId) -> Result<&Area, LightError> {
        self.areas.get(id)
    }

    /// Area-creation fees held by the farm and not yet swept.
    pub fn area_fee_balance(&self) -> Amount {
        self.vault.balance()
    }

    pub fn buy_back(&self) -> Option<Address> {
        self.buy_back
    }

    /// Take every event published since the last drain.
    pub fn drain_events(&mut self) -> Vec<FarmEvent> {
        std::mem::take(&mut self.events)
    }

    /// Per-block rate paid to all pools of `pid`'s kind at `height`.
    pub fn get_block_reward(&self, height: BlockHeight, pid: PoolId) -> Result<Amount, LightError> {
        let kind = self.pools.get(pid)?.kind;
        Ok(self.schedule.block_reward(height, kind))
    }

    /// Total paid to all pools of `pid`'s kind over `[from, to)`.
    pub fn get_block_rewards(&self, from: BlockHeight, to: BlockHeight, pid: PoolId) -> Result<Amount, LightError> {
        let kind = self.pools.get(pid)?.kind;
        Ok(self.schedule.block_rewards(from, to, kind))
    }

    /// Reward `user` could harvest from `pid` at the current height.
    ///
    /// Re-derives the accumulator advance without committing it.
    pub fn pending_reward(&self, pid: PoolId, user: &Address) -> Result<Amount, LightError> {
        let mut pool = self.pools.get(pid)?.clone();
        let mut tx = self.begin();
        let total = self.pools.total_alloc(pool.kind);
        self.accrue(pid, &mut pool, total, &mut tx)?;
        self.ledger.get(pid, user).pending(pool.acc_reward_per_share)
    }

    /// Creator skim `creator` would be paid across their areas in slave pool `pid`.
    ///
    /// Includes skim already owed to the creator. Unsettled skim of areas
    /// below the membership threshold is left out, since settling them now
    /// would forfeit it.
    pub fn slave_pending_for_creator(&self, pid: PoolId, creator: &Address) -> Result<Amount, LightError> {
        let mut pool = self.pools.get(pid)?.clone();
        expect_kind(pid, &pool, PoolKind::Slave)?;
        let mut tx = self.begin();
        let total = self.pools.total_alloc(pool.kind);
        self.accrue(pid, &mut pool, total, &mut tx)?;
        let mut total: Amount = 0;
        for (_, area) in self.areas.by_creator(pid, creator) {
            let pending = if area.qualifies(self.config.min_area_members) {
                area.creator_pending(pool.acc_creator_per_share)?
            } else {
                0
            };
            total = total
                .checked_add(area.creator_owed)
                .and_then(|t| t.checked_add(pending))
                .ok_or_else(|| LightError::Overflow("creator pending exceeds u128".to_string()))?;
        }
        Ok(tx.cap(total))
    }

    // ---- Administration (owner only) ----

    /// Register a pool. It accrues from `max(current height, start_block)`.
    ///
    /// With `with_update`, every existing pool is synchronized first so the
    /// new weight does not reprice spans that already elapsed.
    pub fn add_pool(
        &mut self,
        caller: &Address,
        kind: PoolKind,
        alloc_point: u64,
        asset: AssetId,
        with_update: bool,
    ) -> Result<PoolId, LightError> {
        self.authority.ensure(caller, "add a pool")?;
        let mut tx = self.begin();
        let mut pools = self.pools.clone();
        if with_update {
            self.accrue_all(&mut pools, &mut tx)?;
        }
        let last_reward_block = tx.height.max(self.config.start_block);
        let pid = pools.add(Pool::new(kind, asset.clone(), alloc_point, last_reward_block))?;
        tx.emit(FarmEvent::PoolAdded {
            pool: pid,
            kind,
            asset: asset.clone(),
            alloc_point,
            last_reward_block,
        });

        self.submit(tx, |farm| farm.pools = pools)?;
        info!(pool = pid, %kind, %asset, alloc_point, "Pool added");
        Ok(pid)
    }

    /// Reweight a pool within its kind.
    pub fn set_pool_allocation(
        &mut self,
        caller: &Address,
        pid: PoolId,
        alloc_point: u64,
        with_update: bool,
    ) -> Result<(), LightError> {
        self.authority.ensure(caller, "set pool allocation")?;
        self.pools.get(pid)?;
        let mut tx = self.begin();
        let mut pools = self.pools.clone();
        if with_update {
            self.accrue_all(&mut pools, &mut tx)?;
        }
        let previous = pools.set_alloc(pid, alloc_point)?;
        tx.emit(FarmEvent::PoolAllocationSet {
            pool: pid,
            previous,
            alloc_point,
        });

        self.submit(tx, |farm| farm.pools = pools)?;
        info!(pool = pid, previous, alloc_point, "Pool allocation set");
        Ok(())
    }

    /// Change the global rate. All pools are synchronized at the old rate first.
    pub fn set_reward_per_block(&mut self, caller: &Address, reward_per_block: Amount) -> Result<(), LightError> {
        self.authority.ensure(caller, "set reward per block")?;
        let mut tx = self.begin();
        let mut pools = self.pools.clone();
        self.accrue_all(&mut pools, &mut tx)?;
        let previous = self.config.reward_per_block;
        tx.emit(FarmEvent::RewardRateSet {
            previous,
            reward_per_block,
            block: tx.height,
        });

        self.submit(tx, |farm| {
            farm.pools = pools;
            farm.config.reward_per_block = reward_per_block;
            farm.schedule = RewardSchedule::from_config(&farm.config);
        })?;
        info!(previous, reward_per_block, "Reward per block set");
        Ok(())
    }

    pub fn set_area_creation_fee(&mut self, caller: &Address, fee: Amount) -> Result<(), LightError> {
        self.authority.ensure(caller, "set area creation fee")?;
        let previous = self.config.area_creation_fee;
        self.config.area_creation_fee = fee;
        self.events.push(FarmEvent::AreaCreationFeeSet { previous, fee });
        info!(previous, fee, "Area creation fee set");
        Ok(())
    }

    /// Route future area-creation fees straight to `recipient`. `None` (or the
    /// zero address) keeps them in the farm's vault.
    pub fn set_buy_back(&mut self, caller: &Address, recipient: Option<Address>) -> Result<(), LightError> {
        self.authority.ensure(caller, "set the buy-back recipient")?;
        self.buy_back = recipient.filter(|r| !r.is_zero());
        self.events.push(FarmEvent::BuyBackSet {
            recipient: self.buy_back,
        });
        info!(recipient = ?self.buy_back, "Buy-back recipient set");
        Ok(())
    }

    /// Hand the admin capability to another account (e.g. a timelock).
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), LightError> {
        let previous = self.authority.transfer(caller, new_owner)?;
        self.events.push(FarmEvent::OwnershipTransferred {
            previous,
            owner: new_owner,
        });
        Ok(())
    }

    /// Sweep `amount` of collected area-creation fees to `to`.
    pub fn transfer_create_area_fee(&mut self, caller: &Address, to: Address, amount: Amount) -> Result<(), LightError> {
        self.authority.ensure(caller, "sweep area creation fees")?;
        let mut vault = self.vault.clone();
        vault.withdraw(amount)?;
        let mut tx = self.begin();
        if amount > 0 {
            tx.push(Effect::TransferNative {
                from: self.address,
                to,
                amount,
            });
        }
        tx.emit(FarmEvent::AreaFeesSwept { to, amount });

        self.submit(tx, |farm| farm.vault = vault)?;
        info!(to = %to, amount, "Area creation fees swept");
        Ok(())
    }

    // ---- Maintenance (anyone) ----

    /// Advance one pool's accumulator to the current height.
    pub fn update_pool(&mut self, pid: PoolId) -> Result<(), LightError> {
        let mut pool = self.pools.get(pid)?.clone();
        let mut tx = self.begin();
        let total = self.pools.total_alloc(pool.kind);
        self.accrue(pid, &mut pool, total, &mut tx)?;
        self.submit(tx, |farm| farm.pools.replace(pid, pool))?
    }

    /// Advance every pool's accumulator to the current height.
    pub fn mass_update_pools(&mut self) -> Result<(), LightError> {
        let mut tx = self.begin();
        let mut pools = self.pools.clone();
        self.accrue_all(&mut pools, &mut tx)?;
        self.submit(tx, |farm| farm.pools = pools)
    }

    // ---- Master pools ----

    /// Stake `amount` into master pool `pid`, harvesting pending reward.
    ///
    /// A zero `amount` only harvests. Returns the reward paid out.
    pub fn deposit(&mut self, caller: &Address, pid: PoolId, amount: Amount) -> Result<Amount, LightError> {
        let mut pool = self.pools.get(pid)?.clone();
        expect_kind(pid, &pool, PoolKind::Master)?;
        let mut tx = self.begin();
        let total = self.pools.total_alloc(pool.kind);
        self.accrue(pid, &mut pool, total, &mut tx)?;

        let mut position = self.ledger.get(pid, caller);
        let harvested = self.stage_harvest(&position, &pool, caller, &mut tx)?;
        if amount > 0 {
            self.stage_pull(&pool.asset, caller, amount, &mut tx);
            position.deposit(amount)?;
            pool.add_stake(amount)?;
        }
        position.sync_debt(pool.acc_reward_per_share)?;
        tx.emit(FarmEvent::Deposit {
            user: *caller,
            pool: pid,
            area: None,
            amount,
            harvested,
        });

        let user = *caller;
        self.submit(tx, |farm| {
            farm.ledger.put(pid, user, position);
            farm.pools.replace(pid, pool)
        })??;
        debug!(user = %caller, pool = pid, amount, harvested, "Deposit");
        Ok(harvested)
    }

    /// Unstake `amount` from master pool `pid`, harvesting pending reward.
    ///
    /// # Errors
    /// Returns `LightError::InsufficientStake` if `amount` exceeds the stake.
    pub fn withdraw(&mut self, caller: &Address, pid: PoolId, amount: Amount) -> Result<Amount, LightError> {
        let mut pool = self.pools.get(pid)?.clone();
        expect_kind(pid, &pool, PoolKind::Master)?;
        let mut position = self.ledger.get(pid, caller);
        check_stake(&position, amount)?;
        let mut tx = self.begin();
        let total = self.pools.total_alloc(pool.kind);
        self.accrue(pid, &mut pool, total, &mut tx)?;

        let harvested = self.stage_harvest(&position, &pool, caller, &mut tx)?;
        if amount > 0 {
            position.withdraw(amount)?;
            pool.remove_stake(amount)?;
            self.stage_push(&pool.asset, caller, amount, &mut tx);
        }
        position.sync_debt(pool.acc_reward_per_share)?;
        tx.emit(FarmEvent::Withdraw {
            user: *caller,
            pool: pid,
            area: None,
            amount,
            harvested,
        });

        let user = *caller;
        self.submit(tx, |farm| {
            farm.ledger.put(pid, user, position);
            farm.pools.replace(pid, pool)
        })??;
        debug!(user = %caller, pool = pid, amount, harvested, "Withdraw");
        Ok(harvested)
    }

    /// Return the caller's whole stake in master pool `pid`, forfeiting
    /// pending reward. Never touches the accumulator or mints.
    pub fn emergency_withdraw(&mut self, caller: &Address, pid: PoolId) -> Result<Amount, LightError> {
        let mut pool = self.pools.get(pid)?.clone();
        expect_kind(pid, &pool, PoolKind::Master)?;
        let mut position = self.ledger.get(pid, caller);
        let amount = position.amount;
        let mut tx = self.begin();
        if amount > 0 {
            pool.remove_stake(amount)?;
            self.stage_push(&pool.asset, caller, amount, &mut tx);
        }
        position.amount = 0;
        position.reward_debt = 0;
        tx.emit(FarmEvent::EmergencyWithdraw {
            user: *caller,
            pool: pid,
            area: None,
            amount,
        });

        let user = *caller;
        self.submit(tx, |farm| {
            farm.ledger.put(pid, user, position);
            farm.pools.replace(pid, pool)
        })??;
        warn!(user = %caller, pool = pid, amount, "Emergency withdraw, pending reward forfeited");
        Ok(amount)
    }

    // ---- Slave pools and areas ----

    /// Create an area in slave pool `pid`, owned by the caller.
    ///
    /// Anyone but the owner must attach `payment >= area_creation_fee` in
    /// native currency. The payment goes to the buy-back recipient when one is
    /// set, otherwise into the farm's fee vault.
    ///
    /// # Errors
    /// Returns `LightError::InsufficientFee` if the payment is too small.
    pub fn create_area(
        &mut self,
        caller: &Address,
        pid: PoolId,
        label: &str,
        payment: Amount,
    ) -> Result<AreaId, LightError> {
        let pool = self.pools.get(pid)?;
        expect_kind(pid, pool, PoolKind::Slave)?;
        let required = self.config.area_creation_fee;
        if !self.authority.is_owner(caller) && payment < required {
            return Err(LightError::InsufficientFee {
                required,
                paid: payment,
            });
        }
        let mut tx = self.begin();
        if payment > 0 {
            tx.push(Effect::TransferNative {
                from: *caller,
                to: self.buy_back.unwrap_or(self.address),
                amount: payment,
            });
        }
        let area = self.areas.len();
        tx.emit(FarmEvent::AreaCreated {
            area,
            pool: pid,
            creator: *caller,
            label: label.to_string(),
            fee_paid: payment,
        });

        let creator = *caller;
        let passed_through = self.buy_back.is_some();
        self.submit(tx, |farm| {
            if !passed_through {
                farm.vault.deposit(payment);
            }
            farm.areas.create(Area::new(creator, label, pid))
        })?;
        info!(area, pool = pid, creator = %caller, label, payment, "Area created");
        Ok(area)
    }

    /// Stake `amount` into slave pool `pid` under area `area_id`.
    ///
    /// Settles the area creator's skim, harvests the caller's reward, then
    /// stakes. A position holding stake stays bound to its area; once fully
    /// withdrawn it may join another.
    ///
    /// # Errors
    /// Returns `LightError::AreaMismatch` when the position holds stake in a
    /// different area, and `LightError::InvalidIndex` when the area belongs to
    /// another pool.
    pub fn slave_deposit(
        &mut self,
        caller: &Address,
        pid: PoolId,
        area_id: AreaId,
        amount: Amount,
    ) -> Result<Amount, LightError> {
        let mut pool = self.pools.get(pid)?.clone();
        expect_kind(pid, &pool, PoolKind::Slave)?;
        let mut area = self.areas.get(area_id)?.clone();
        if area.pool != pid {
            return Err(LightError::InvalidIndex(format!(
                "area {} belongs to pool {}, not pool {}",
                area_id, area.pool, pid
            )));
        }
        let mut position = self.ledger.get(pid, caller);
        if let Some(bound) = position.area {
            if bound != area_id && position.amount > 0 {
                return Err(LightError::AreaMismatch {
                    bound,
                    requested: area_id,
                });
            }
        }

        let mut tx = self.begin();
        let total = self.pools.total_alloc(pool.kind);
        self.accrue(pid, &mut pool, total, &mut tx)?;
        self.settle_creator(area_id, &mut area, &pool, &mut tx)?;
        let harvested = self.stage_harvest(&position, &pool, caller, &mut tx)?;
        if amount > 0 {
            self.stage_pull(&pool.asset, caller, amount, &mut tx);
            area.join(amount, position.amount == 0)?;
            position.deposit(amount)?;
            pool.add_stake(amount)?;
        }
        position.area = Some(area_id);
        position.sync_debt(pool.acc_reward_per_share)?;
        area.rebase(pool.acc_creator_per_share)?;
        tx.emit(FarmEvent::Deposit {
            user: *caller,
            pool: pid,
            area: Some(area_id),
            amount,
            harvested,
        });

        let user = *caller;
        self.submit(tx, |farm| {
            farm.ledger.put(pid, user, position);
            farm.areas.replace(area_id, area)?;
            farm.pools.replace(pid, pool)
        })??;
        debug!(user = %caller, pool = pid, area = area_id, amount, harvested, "Slave deposit");
        Ok(harvested)
    }

    /// Unstake `amount` from slave pool `pid`. The area is the one the
    /// position is bound to.
    pub fn slave_withdraw(&mut self, caller: &Address, pid: PoolId, amount: Amount) -> Result<Amount, LightError> {
        let mut pool = self.pools.get(pid)?.clone();
        expect_kind(pid, &pool, PoolKind::Slave)?;
        let mut position = self.ledger.get(pid, caller);
        check_stake(&position, amount)?;
        let mut staged_area = match position.area {
            Some(id) => Some((id, self.areas.get(id)?.clone())),
            None => None,
        };

        let mut tx = self.begin();
        let total = self.pools.total_alloc(pool.kind);
        self.accrue(pid, &mut pool, total, &mut tx)?;
        if let Some((id, area)) = staged_area.as_mut() {
            self.settle_creator(*id, area, &pool, &mut tx)?;
        }
        let harvested = self.stage_harvest(&position, &pool, caller, &mut tx)?;
        if amount > 0 {
            position.withdraw(amount)?;
            pool.remove_stake(amount)?;
            if let Some((_, area)) = staged_area.as_mut() {
                area.leave(amount, position.amount == 0)?;
            }
            self.stage_push(&pool.asset, caller, amount, &mut tx);
        }
        if let Some((_, area)) = staged_area.as_mut() {
            area.rebase(pool.acc_creator_per_share)?;
        }
        position.sync_debt(pool.acc_reward_per_share)?;
        let area_id = position.area;
        tx.emit(FarmEvent::Withdraw {
            user: *caller,
            pool: pid,
            area: area_id,
            amount,
            harvested,
        });

        let user = *caller;
        self.submit(tx, |farm| {
            farm.ledger.put(pid, user, position);
            if let Some((id, area)) = staged_area {
                farm.areas.replace(id, area)?;
            }
            farm.pools.replace(pid, pool)
        })??;
        debug!(user = %caller, pool = pid, area = ?area_id, amount, harvested, "Slave withdraw");
        Ok(harvested)
    }

    /// Return the caller's whole stake in slave pool `pid`, forfeiting
    /// pending reward. Skim the area creator earned with enough members stays
    /// owed and is paid at the area's next settlement.
    pub fn slave_emergency_withdraw(&mut self, caller: &Address, pid: PoolId) -> Result<Amount, LightError> {
        let mut pool = self.pools.get(pid)?.clone();
        expect_kind(pid, &pool, PoolKind::Slave)?;
        let mut position = self.ledger.get(pid, caller);
        let amount = position.amount;
        let mut tx = self.begin();
        let mut staged_area = None;
        if amount > 0 {
            pool.remove_stake(amount)?;
            if let Some(id) = position.area {
                let mut area = self.areas.get(id)?.clone();
                let forfeited = area.evict(amount, pool.acc_creator_per_share, self.config.min_area_members)?;
                if forfeited > 0 {
                    warn!(area = id, members = area.members, forfeited, "Creator fee forfeited");
                    tx.emit(FarmEvent::CreatorFeeForfeited {
                        area: id,
                        amount: forfeited,
                    });
                }
                staged_area = Some((id, area));
            }
            self.stage_push(&pool.asset, caller, amount, &mut tx);
        }
        position.amount = 0;
        position.reward_debt = 0;
        let area_id = position.area;
        tx.emit(FarmEvent::EmergencyWithdraw {
            user: *caller,
            pool: pid,
            area: area_id,
            amount,
        });

        let user = *caller;
        self.submit(tx, |farm| {
            farm.ledger.put(pid, user, position);
            if let Some((id, area)) = staged_area {
                farm.areas.replace(id, area)?;
            }
            farm.pools.replace(pid, pool)
        })??;
        warn!(user = %caller, pool = pid, area = ?area_id, amount, "Slave emergency withdraw, pending reward forfeited");
        Ok(amount)
    }

    // ---- Internals ----

    fn begin(&self) -> Tx {
        let headroom = self
            .config
            .max_supply
            .map(|max| max.saturating_sub(self.host.reward_total_supply()));
        Tx {
            height: self.host.block_height(),
            headroom,
            effects: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Execute the staged effects, then run `commit` and publish the events.
    fn submit<T>(&mut self, tx: Tx, commit: impl FnOnce(&mut Self) -> T) -> Result<T, LightError> {
        if !tx.effects.is_empty() {
            self.host.execute(&tx.effects)?;
        }
        let out = commit(self);
        self.events.extend(tx.events);
        Ok(out)
    }

    /// Advance `pool` to `tx.height` and stage the mint backing its stakers' share.
    ///
    /// An empty or unweighted pool just moves `last_reward_block`; nothing is
    /// saved up for later stakers.
    fn accrue(&self, pid: PoolId, pool: &mut Pool, total_alloc: u64, tx: &mut Tx) -> Result<(), LightError> {
        if tx.height <= pool.last_reward_block {
            return Ok(());
        }
        if pool.total_staked == 0 || pool.alloc_point == 0 {
            pool.last_reward_block = tx.height;
            return Ok(());
        }

        let from = pool.last_reward_block;
        let span = self.schedule.block_rewards(from, tx.height, pool.kind);
        let eligible = weighted_share(span, pool.alloc_point, total_alloc)?;
        let reward = tx.cap(eligible);
        if reward < eligible {
            warn!(pool = pid, eligible, reward, "Supply ceiling reached, emission clamped");
        }
        let split = match pool.kind {
            PoolKind::Master => RewardSplit {
                stakers: reward,
                creator: 0,
            },
            PoolKind::Slave => split_creator_fee(reward, self.config.creator_fee_bps),
        };
        let minted = tx.mint(self.address, self.address, split.stakers);
        pool.credit(minted, split.creator)?;
        pool.last_reward_block = tx.height;
        debug!(pool = pid, from, to = tx.height, stakers = minted, creator = split.creator, "Pool accrued");
        Ok(())
    }

    fn accrue_all(&self, pools: &mut PoolRegistry, tx: &mut Tx) -> Result<(), LightError> {
        let master_total = pools.total_alloc(PoolKind::Master);
        let slave_total = pools.total_alloc(PoolKind::Slave);
        for (pid, pool) in pools.iter_mut() {
            let total = match pool.kind {
                PoolKind::Master => master_total,
                PoolKind::Slave => slave_total,
            };
            self.accrue(pid, pool, total, tx)?;
        }
        Ok(())
    }

    /// Pay out the area creator's owed and unsettled skim and rebase.
    ///
    /// Unsettled skim from a span without enough members is forfeited, as is
    /// anything the supply ceiling cuts off.
    fn settle_creator(&self, area_id: AreaId, area: &mut Area, pool: &Pool, tx: &mut Tx) -> Result<(), LightError> {
        let pending = area.creator_pending(pool.acc_creator_per_share)?;
        let (earned, mut forfeited) = if area.qualifies(self.config.min_area_members) {
            (pending, 0)
        } else {
            (0, pending)
        };
        let due = area
            .creator_owed
            .checked_add(earned)
            .ok_or_else(|| LightError::Overflow("creator skim exceeds u128".to_string()))?;
        if due > 0 {
            let paid = tx.mint(self.address, area.creator, due);
            forfeited += due - paid;
            area.creator_owed = 0;
            if paid > 0 {
                area.creator_fee_paid = area.creator_fee_paid.saturating_add(paid);
                tx.emit(FarmEvent::CreatorFeePaid {
                    area: area_id,
                    creator: area.creator,
                    amount: paid,
                });
            }
        }
        if forfeited > 0 {
            area.creator_fee_forfeited = area.creator_fee_forfeited.saturating_add(forfeited);
            warn!(area = area_id, members = area.members, forfeited, "Creator fee forfeited");
            tx.emit(FarmEvent::CreatorFeeForfeited {
                area: area_id,
                amount: forfeited,
            });
        }
        area.rebase(pool.acc_creator_per_share)
    }

    /// Stage the payout of `position`'s pending reward from the farm's balance.
    fn stage_harvest(&self, position: &UserPosition, pool: &Pool, to: &Address, tx: &mut Tx) -> Result<Amount, LightError> {
        let pending = position.pending(pool.acc_reward_per_share)?;
        if pending > 0 {
            tx.push(Effect::TransferReward {
                from: self.address,
                to: *to,
                amount: pending,
            });
        }
        Ok(pending)
    }

    fn stage_pull(&self, asset: &AssetId, from: &Address, amount: Amount, tx: &mut Tx) {
        tx.push(Effect::TransferAssetFrom {
            asset: asset.clone(),
            spender: self.address,
            from: *from,
            to: self.address,
            amount,
        });
    }

    fn stage_push(&self, asset: &AssetId, to: &Address, amount: Amount, tx: &mut Tx) {
        tx.push(Effect::TransferAsset {
            asset: asset.clone(),
            from: self.address,
            to: *to,
            amount,
        });
    }
}

fn expect_kind(pid: PoolId, pool: &Pool, kind: PoolKind) -> Result<(), LightError> {
    if pool.kind != kind {
        return Err(LightError::PoolKindMismatch(format!(
            "pool {} is a {} pool, this call needs a {} pool",
            pid, pool.kind, kind
        )));
    }
    Ok(())
}

fn check_stake(position: &UserPosition, amount: Amount) -> Result<(), LightError> {
    if amount > position.amount {
        return Err(LightError::InsufficientStake {
            requested: amount,
            staked: position.amount,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MemoryChain;

    fn farm_addr() -> Address {
        Address::from_label("farm")
    }

    fn dev() -> Address {
        Address::from_label("dev")
    }

    fn lp() -> AssetId {
        AssetId::from("LP")
    }

    fn farm(config: EmissionConfig) -> EmissionController<MemoryChain> {
        let mut chain = MemoryChain::new(farm_addr());
        chain.faucet(&lp(), dev(), 100);
        chain.approve(&lp(), dev(), farm_addr(), Amount::MAX);
        EmissionController::new(chain, farm_addr(), dev(), config).unwrap()
    }

    #[test]
    fn test_tx_mint_consumes_headroom() {
        let mut tx = Tx {
            height: 0,
            headroom: Some(100),
            effects: Vec::new(),
            events: Vec::new(),
        };
        assert_eq!(tx.cap(150), 100);
        assert_eq!(tx.mint(farm_addr(), farm_addr(), 60), 60);
        assert_eq!(tx.mint(farm_addr(), dev(), 60), 40);
        assert_eq!(tx.mint(farm_addr(), dev(), 60), 0);
        assert_eq!(tx.effects.len(), 2);
        assert_eq!(tx.headroom, Some(0));
    }

    #[test]
    fn test_tx_without_ceiling_is_unbounded() {
        let mut tx = Tx {
            height: 0,
            headroom: None,
            effects: Vec::new(),
            events: Vec::new(),
        };
        assert_eq!(tx.mint(farm_addr(), farm_addr(), Amount::MAX), Amount::MAX);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let chain = MemoryChain::new(farm_addr());
        let result = EmissionController::new(chain, farm_addr(), dev(), EmissionConfig::new(1, 0, 0));
        assert!(matches!(result, Err(LightError::InvalidConfig(_))));
    }

    #[test]
    fn test_pool_added_before_start_accrues_from_start() {
        let mut farm = farm(EmissionConfig::new(1_000, 50, 100));
        let early = farm.add_pool(&dev(), PoolKind::Master, 1, lp(), false).unwrap();
        farm.host_mut().advance_to(70).unwrap();
        let late = farm.add_pool(&dev(), PoolKind::Master, 1, lp(), false).unwrap();
        assert_eq!(farm.pool(early).unwrap().last_reward_block, 50);
        assert_eq!(farm.pool(late).unwrap().last_reward_block, 70);
    }

    #[test]
    fn test_update_pool_is_idempotent_within_a_block() {
        let mut farm = farm(EmissionConfig::new(1_000, 0, 100));
        let pid = farm.add_pool(&dev(), PoolKind::Master, 1, lp(), false).unwrap();
        farm.host_mut().advance_to(5).unwrap();
        farm.deposit(&dev(), pid, 10).unwrap();

        farm.host_mut().advance_to(9).unwrap();
        farm.update_pool(pid).unwrap();
        let once = farm.pool(pid).unwrap().clone();
        let supply = farm.host().reward_total_supply();
        farm.update_pool(pid).unwrap();
        farm.mass_update_pools().unwrap();
        assert_eq!(farm.pool(pid).unwrap(), &once);
        assert_eq!(farm.host().reward_total_supply(), supply);
        assert_eq!(supply, 3_200);
        assert_eq!(once.last_reward_block, 9);
    }

    #[test]
    fn test_events_published_in_order() {
        let mut farm = farm(EmissionConfig::new(1_000, 0, 100));
        let pid = farm.add_pool(&dev(), PoolKind::Master, 3, lp(), false).unwrap();
        farm.host_mut().advance_to(1).unwrap();
        farm.deposit(&dev(), pid, 10).unwrap();
        farm.withdraw(&dev(), pid, 4).unwrap();

        let events = farm.drain_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], FarmEvent::PoolAdded { pool: 0, alloc_point: 3, .. }));
        assert!(matches!(events[1], FarmEvent::Deposit { amount: 10, harvested: 0, .. }));
        assert!(matches!(events[2], FarmEvent::Withdraw { amount: 4, .. }));
        assert!(farm.drain_events().is_empty());
    }
}

// crates/light-economics/tests/slave_areas.rs
//
// Slave pools, creator areas, the creator skim and area-creation fees.
//
// Slave pools draw 20% of the global rate; 5% of a slave pool's reward is
// skimmed for the creator of the area a stake is bound to, and only paid for
// spans during which the area had at least two staked members.

use light_core::{Address, Amount, AssetId, Host, LightError};
use light_economics::{EmissionConfig, EmissionController, FarmEvent, MemoryChain, PoolKind};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Farm = EmissionController<MemoryChain>;

fn farm_addr() -> Address {
    Address::from_label("light-farm")
}

fn dev() -> Address {
    Address::from_label("dev")
}

fn alice() -> Address {
    Address::from_label("alice")
}

fn bob() -> Address {
    Address::from_label("bob")
}

fn carol() -> Address {
    Address::from_label("carol")
}

fn lp() -> AssetId {
    AssetId::from("LP")
}

/// Farm with one slave pool and one owner-created area. Slave rate is 1000
/// per block: 950 to stakers, 50 to the area creator.
fn slave_farm(start_block: u64) -> (Farm, usize, usize) {
    let mut chain = MemoryChain::new(farm_addr());
    for who in [alice(), bob(), carol()] {
        chain.faucet(&lp(), who, 1_000);
        chain.approve(&lp(), who, farm_addr(), Amount::MAX);
        chain.fund_native(who, 10);
    }
    let config = EmissionConfig::new(5_000, start_block, 100_000).with_area_creation_fee(1);
    let mut farm = EmissionController::new(chain, farm_addr(), dev(), config).unwrap();
    let pid = farm.add_pool(&dev(), PoolKind::Slave, 1, lp(), false).unwrap();
    let area = farm.create_area(&dev(), pid, "reef", 0).unwrap();
    (farm, pid, area)
}

fn at(farm: &mut Farm, height: u64) {
    farm.host_mut().advance_to(height).unwrap();
}

fn reward(farm: &Farm, who: &Address) -> Amount {
    farm.host().reward_balance(who)
}

// ---------------------------------------------------------------------------
// Creator skim
// ---------------------------------------------------------------------------

#[test]
fn test_stakers_and_creator_split_slave_reward() {
    let (mut farm, pid, area) = slave_farm(300);

    at(&mut farm, 310);
    farm.slave_deposit(&alice(), pid, area, 10).unwrap();
    at(&mut farm, 314);
    farm.slave_deposit(&bob(), pid, area, 20).unwrap();
    at(&mut farm, 318);
    farm.slave_deposit(&carol(), pid, area, 30).unwrap();
    at(&mut farm, 320);
    farm.slave_deposit(&alice(), pid, area, 10).unwrap();

    assert_eq!(reward(&farm, &alice()), 5_383);
    // [310, 314) had a single member: that skim was forfeited.
    assert_eq!(reward(&farm, &dev()), 299);
    assert_eq!(farm.area(area).unwrap().creator_fee_forfeited, 200);
    assert_eq!(farm.host().reward_total_supply(), 9_799);
    assert_eq!(reward(&farm, &farm_addr()), 4_117);

    at(&mut farm, 330);
    farm.slave_withdraw(&bob(), pid, 5).unwrap();
    assert_eq!(reward(&farm, &bob()), 5_880);
    assert_eq!(reward(&farm, &dev()), 799);

    let state = farm.area(area).unwrap();
    assert_eq!(state.staked, 65);
    assert_eq!(state.members, 3);
    assert_eq!(state.creator_fee_paid, 799);

    at(&mut farm, 340);
    farm.slave_withdraw(&alice(), pid, 20).unwrap();
    at(&mut farm, 350);
    farm.slave_withdraw(&bob(), pid, 15).unwrap();
    assert_eq!(reward(&farm, &dev()), 1_799);
    assert_eq!(farm.area(area).unwrap().members, 1);

    // [350, 360) carol staked alone: that skim is forfeited.
    at(&mut farm, 360);
    farm.slave_withdraw(&carol(), pid, 30).unwrap();

    assert_eq!(reward(&farm, &alice()), 11_021);
    assert_eq!(reward(&farm, &bob()), 11_239);
    assert_eq!(reward(&farm, &carol()), 25_240);
    assert_eq!(reward(&farm, &dev()), 1_799);

    let state = farm.area(area).unwrap();
    assert_eq!(state.staked, 0);
    assert_eq!(state.members, 0);
    assert_eq!(state.creator_fee_paid, 1_799);
    assert_eq!(state.creator_fee_forfeited, 700);
    assert_eq!(farm.pool(pid).unwrap().total_staked, 0);
}

#[test]
fn test_creator_view_matches_payout() {
    let (mut farm, pid, area) = slave_farm(300);

    at(&mut farm, 369);
    farm.slave_deposit(&alice(), pid, area, 10).unwrap();
    assert_eq!(farm.slave_pending_for_creator(pid, &dev()).unwrap(), 0);

    at(&mut farm, 370);
    farm.slave_deposit(&bob(), pid, area, 10).unwrap();

    at(&mut farm, 379);
    assert_eq!(farm.slave_pending_for_creator(pid, &dev()).unwrap(), 450);
    assert_eq!(farm.slave_pending_for_creator(pid, &alice()).unwrap(), 0);

    at(&mut farm, 380);
    farm.slave_withdraw(&bob(), pid, 10).unwrap();
    assert_eq!(reward(&farm, &dev()), 500);
    assert_eq!(farm.area(area).unwrap().members, 1);

    // Alone again: the view reports nothing and the span is forfeited.
    at(&mut farm, 390);
    assert_eq!(farm.slave_pending_for_creator(pid, &dev()).unwrap(), 0);
    farm.slave_deposit(&alice(), pid, area, 0).unwrap();
    assert_eq!(reward(&farm, &dev()), 500);
    assert!(farm
        .drain_events()
        .iter()
        .any(|e| matches!(e, FarmEvent::CreatorFeeForfeited { amount: 500, .. })));
}

#[test]
fn test_creator_view_requires_slave_pool() {
    let (mut farm, _, _) = slave_farm(0);
    let master = farm.add_pool(&dev(), PoolKind::Master, 1, lp(), false).unwrap();
    assert!(matches!(
        farm.slave_pending_for_creator(master, &dev()),
        Err(LightError::PoolKindMismatch(_))
    ));
}

// ---------------------------------------------------------------------------
// Area binding
// ---------------------------------------------------------------------------

#[test]
fn test_cross_area_deposit_rejected_until_withdrawn() {
    let (mut farm, pid, north) = slave_farm(0);
    let south = farm.create_area(&bob(), pid, "south", 1).unwrap();

    at(&mut farm, 10);
    farm.slave_deposit(&alice(), pid, north, 10).unwrap();
    assert_eq!(
        farm.slave_deposit(&alice(), pid, south, 5),
        Err(LightError::AreaMismatch { bound: north, requested: south })
    );

    at(&mut farm, 20);
    farm.slave_withdraw(&alice(), pid, 10).unwrap();
    assert_eq!(farm.area(north).unwrap().members, 0);

    farm.slave_deposit(&alice(), pid, south, 5).unwrap();
    assert_eq!(farm.position(pid, &alice()).area, Some(south));
    assert_eq!(farm.area(south).unwrap().staked, 5);
    assert_eq!(farm.area(south).unwrap().members, 1);
}

#[test]
fn test_area_must_belong_to_pool() {
    let (mut farm, _, area) = slave_farm(0);
    let other = farm.add_pool(&dev(), PoolKind::Slave, 1, lp(), false).unwrap();
    assert!(matches!(
        farm.slave_deposit(&alice(), other, area, 1),
        Err(LightError::InvalidIndex(_))
    ));
    assert!(matches!(
        farm.slave_deposit(&alice(), other, 42, 1),
        Err(LightError::InvalidIndex(_))
    ));
}

#[test]
fn test_slave_emergency_withdraw_keeps_creator_skim() {
    let (mut farm, pid, area) = slave_farm(0);
    at(&mut farm, 10);
    farm.slave_deposit(&alice(), pid, area, 100).unwrap();
    farm.slave_deposit(&bob(), pid, area, 150).unwrap();

    at(&mut farm, 20);
    farm.slave_deposit(&carol(), pid, area, 150).unwrap();
    // [10, 20): 10 blocks of 50 skim with two members, paid at carol's deposit.
    assert_eq!(reward(&farm, &dev()), 500);

    at(&mut farm, 30);
    farm.mass_update_pools().unwrap();
    assert_eq!(farm.slave_pending_for_creator(pid, &dev()).unwrap(), 500);

    assert_eq!(farm.slave_emergency_withdraw(&bob(), pid).unwrap(), 150);
    assert_eq!(farm.host().asset_balance(&lp(), &bob()), 1_000);
    assert_eq!(farm.position(pid, &bob()).amount, 0);
    let state = farm.area(area).unwrap();
    assert_eq!(state.staked, 250);
    assert_eq!(state.members, 2);
    assert_eq!(farm.slave_pending_for_creator(pid, &dev()).unwrap(), 500);

    at(&mut farm, 40);
    farm.slave_withdraw(&alice(), pid, 0).unwrap();
    assert_eq!(reward(&farm, &dev()), 1_500);
}

#[test]
fn test_emergency_exit_to_lone_member_keeps_earned_skim() {
    let (mut farm, pid, area) = slave_farm(0);
    at(&mut farm, 10);
    farm.slave_deposit(&alice(), pid, area, 100).unwrap();
    farm.slave_deposit(&bob(), pid, area, 100).unwrap();

    at(&mut farm, 20);
    farm.mass_update_pools().unwrap();
    assert_eq!(farm.slave_pending_for_creator(pid, &dev()).unwrap(), 500);

    farm.slave_emergency_withdraw(&bob(), pid).unwrap();
    let state = farm.area(area).unwrap();
    assert_eq!(state.members, 1);
    assert_eq!(state.creator_owed, 500);
    assert_eq!(farm.slave_pending_for_creator(pid, &dev()).unwrap(), 500);

    farm.slave_withdraw(&alice(), pid, 0).unwrap();
    assert_eq!(reward(&farm, &dev()), 500);
    let state = farm.area(area).unwrap();
    assert_eq!(state.creator_owed, 0);
    assert_eq!(state.creator_fee_paid, 500);
    assert_eq!(state.creator_fee_forfeited, 0);
    assert!(!farm
        .drain_events()
        .iter()
        .any(|e| matches!(e, FarmEvent::CreatorFeeForfeited { .. })));
}

#[test]
fn test_emergency_exit_of_lone_member_forfeits_skim() {
    let (mut farm, pid, area) = slave_farm(0);
    at(&mut farm, 10);
    farm.slave_deposit(&alice(), pid, area, 100).unwrap();

    at(&mut farm, 20);
    farm.mass_update_pools().unwrap();
    assert_eq!(farm.slave_emergency_withdraw(&alice(), pid).unwrap(), 100);

    let state = farm.area(area).unwrap();
    assert_eq!(state.members, 0);
    assert_eq!(state.creator_owed, 0);
    assert_eq!(state.creator_fee_forfeited, 500);
    assert_eq!(farm.slave_pending_for_creator(pid, &dev()).unwrap(), 0);
    assert!(farm
        .drain_events()
        .iter()
        .any(|e| matches!(e, FarmEvent::CreatorFeeForfeited { amount: 500, .. })));
}

// ---------------------------------------------------------------------------
// Area creation fees
// ---------------------------------------------------------------------------

#[test]
fn test_area_creation_fee_collected_and_swept() {
    let (mut farm, pid, _) = slave_farm(0);

    assert_eq!(
        farm.create_area(&alice(), pid, "cheap", 0),
        Err(LightError::InsufficientFee { required: 1, paid: 0 })
    );
    let area = farm.create_area(&alice(), pid, "paid", 1).unwrap();
    assert_eq!(farm.area(area).unwrap().creator, alice());
    assert_eq!(farm.area_fee_balance(), 1);
    assert_eq!(farm.host().native_balance(&farm_addr()), 1);
    assert_eq!(farm.host().native_balance(&alice()), 9);

    assert!(matches!(
        farm.transfer_create_area_fee(&dev(), dev(), 2),
        Err(LightError::InvalidState(_))
    ));
    farm.transfer_create_area_fee(&dev(), dev(), 1).unwrap();
    assert_eq!(farm.area_fee_balance(), 0);
    assert_eq!(farm.host().native_balance(&dev()), 1);
}

#[test]
fn test_buy_back_receives_fees_directly() {
    let buy_back = Address::from_label("buy-back");
    let (mut farm, pid, _) = slave_farm(0);
    farm.set_buy_back(&dev(), Some(buy_back)).unwrap();

    farm.create_area(&carol(), pid, "piped", 3).unwrap();
    assert_eq!(farm.host().native_balance(&buy_back), 3);
    assert_eq!(farm.area_fee_balance(), 0);

    farm.set_buy_back(&dev(), None).unwrap();
    farm.create_area(&carol(), pid, "kept", 1).unwrap();
    assert_eq!(farm.area_fee_balance(), 1);
}

#[test]
fn test_area_creation_payment_failure_creates_nothing() {
    let (mut farm, pid, _) = slave_farm(0);
    let before = farm.areas().len();
    let broke = Address::from_label("broke");
    assert!(matches!(
        farm.create_area(&broke, pid, "nope", 1),
        Err(LightError::ExternalTransfer(_))
    ));
    assert_eq!(farm.areas().len(), before);
    assert_eq!(farm.area_fee_balance(), 0);

    farm.set_area_creation_fee(&dev(), 0).unwrap();
    assert!(farm.create_area(&broke, pid, "free", 0).is_ok());
}

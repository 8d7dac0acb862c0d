// crates/light-economics/src/lib.rs
//
// light-economics: LIGHT emission schedule, staking pools, creator areas,
// area fee vault, and the emission controller that ties them together.
//
// All monetary values are tracked in the smallest reward-token unit.
// 1 LIGHT = 10^18 units.

pub mod access;
pub mod area;
pub mod chain;
pub mod config;
pub mod controller;
pub mod events;
pub mod pool;
pub mod rewards;
pub mod schedule;
pub mod staking;
pub mod token;
pub mod treasury;

// Re-export key types for ergonomic access from downstream crates.
pub use access::Authority;
pub use area::{Area, AreaRegistry};
pub use chain::MemoryChain;
pub use config::EmissionConfig;
pub use controller::EmissionController;
pub use events::FarmEvent;
pub use pool::{Pool, PoolKind, PoolRegistry, ACC_SCALE};
pub use rewards::{bps_of, split_creator_fee, weighted_share, RewardSplit, BPS_DENOMINATOR};
pub use schedule::RewardSchedule;
pub use staking::{StakeLedger, UserPosition};
pub use token::{Light, LIGHT_DECIMALS, UNITS_PER_LIGHT};
pub use treasury::FeeVault;

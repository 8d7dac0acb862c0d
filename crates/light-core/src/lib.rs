// crates/light-core/src/lib.rs
//
// light-core: Core types, collaborator traits, and error taxonomy for the
// Light emission farm.
//
// This is the leaf crate that the rest of the workspace depends on. It defines
// account identifiers, amount aliases, the effect instructions the farm hands
// to its host chain, and the `Host` trait that chain implementations satisfy.

pub mod crypto;
pub mod effect;
pub mod error;
pub mod identity;
pub mod serde_amount;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use light_core::Address;`

// Identity types
pub use identity::Address;

// Scalar aliases and asset identifiers
pub use types::{Amount, AreaId, AssetId, BlockHeight, PoolId};

// Effects handed to the host
pub use effect::Effect;

// Error type
pub use error::LightError;

// Traits
pub use traits::Host;

use thiserror::Error;

use crate::types::{Amount, AreaId};

/// Farm-wide error types.
///
/// Every state-changing operation either completes or fails with one of these
/// and leaves no partial state behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LightError {
    /// Caller lacks the privilege required by an owner-gated call.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Pool or area index outside the registered range.
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// Withdrawal exceeds the caller's recorded stake.
    #[error("Insufficient stake: requested {requested} but only {staked} staked")]
    InsufficientStake { requested: Amount, staked: Amount },

    /// A collaborator call (mint, reward transfer, asset transfer) failed.
    #[error("External transfer failed: {0}")]
    ExternalTransfer(String),

    /// Deposit into an area other than the one the position is bound to.
    #[error("Area mismatch: position is bound to area {bound}, not area {requested}")]
    AreaMismatch { bound: AreaId, requested: AreaId },

    /// Master entry point used on a slave pool or vice versa.
    #[error("Pool kind mismatch: {0}")]
    PoolKindMismatch(String),

    /// Area creation payment below the configured fee.
    #[error("Insufficient fee: required {required} but paid {paid}")]
    InsufficientFee { required: Amount, paid: Amount },

    /// Rejected configuration value.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Fixed-point or balance arithmetic exceeded the integer width.
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid state transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for LightError {
    fn from(e: serde_json::Error) -> Self {
        LightError::Serialization(e.to_string())
    }
}

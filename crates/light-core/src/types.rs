// crates/light-core/src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantity of reward token or staked asset, in the smallest unit.
pub type Amount = u128;

/// Height of the host chain. The only clock the farm observes.
pub type BlockHeight = u64;

/// Index of a pool in the registry. Stable and never reused.
pub type PoolId = usize;

/// Index of an area in the registry. Stable and never reused.
pub type AreaId = usize;

/// Identifier of an external asset accepted by a pool (e.g. an LP token).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id_display() {
        let asset = AssetId::new("LP-LIGHT-BNB");
        assert_eq!(asset.to_string(), "LP-LIGHT-BNB");
        assert_eq!(asset.as_str(), "LP-LIGHT-BNB");
    }

    #[test]
    fn test_asset_id_serializes_as_plain_string() {
        let asset = AssetId::from("LP");
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, "\"LP\"");
        let back: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, asset);
    }
}

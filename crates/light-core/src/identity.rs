// crates/light-core/src/identity.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::crypto::hash_bytes;
use crate::error::LightError;

/// A 20-byte account identifier on the host chain.
///
/// Owners, stakers, area creators and the farm itself are all addressed this
/// way. Rendered as `0x`-prefixed lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address. Used as "unset" for the buy-back recipient.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Derive a deterministic address from a human-readable label.
    ///
    /// Takes the first 20 bytes of `sha256(label)`. Simulations and tests use
    /// this so that `alice` is the same account in every run.
    pub fn from_label(label: &str) -> Self {
        let digest = hash_bytes(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Address(bytes)
    }

    /// Parse an address from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, LightError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(stripped)
            .map_err(|e| LightError::Serialization(format!("Invalid address hex '{}': {}", s, e)))?;
        let bytes: [u8; 20] = raw.try_into().map_err(|_| {
            LightError::Serialization(format!("Address '{}' must be exactly 20 bytes", s))
        })?;
        Ok(Address(bytes))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Short form for tables: `0x1234…abcd`.
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}..{}", &full[..4], &full[36..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

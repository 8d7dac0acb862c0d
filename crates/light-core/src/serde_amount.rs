// crates/light-core/src/serde_amount.rs
//
// Lenient deserializers for `Amount` fields.
//
// TOML integers are 64-bit signed, so large amounts are written as decimal
// strings. Use with `#[serde(deserialize_with = "...")]`.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

use crate::types::Amount;

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(v as Amount)
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u128::try_from(v).map_err(|_| E::custom(format!("amount must be non-negative, got {}", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        parse(v).map_err(E::custom)
    }
}

/// Parse a decimal amount, ignoring `_` digit separators.
pub fn parse(raw: &str) -> Result<Amount, String> {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    cleaned
        .parse::<Amount>()
        .map_err(|e| format!("invalid amount '{}': {}", raw, e))
}

struct Lenient(Amount);

impl<'de> Deserialize<'de> for Lenient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor).map(Lenient)
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    Lenient::deserialize(deserializer).map(|l| l.0)
}

pub fn deserialize_option<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Amount>, D::Error> {
    Option::<Lenient>::deserialize(deserializer).map(|o| o.map(|l| l.0))
}

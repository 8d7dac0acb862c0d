// crates/light-economics/src/token.rs
//
// LIGHT reward-token display type.
//
// The smallest unit is 10^-18 LIGHT. All internal accounting uses integer
// units; `Light` exists for rendering amounts in reports.

use light_core::types::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places of the reward token.
pub const LIGHT_DECIMALS: u32 = 18;

/// Number of units in one LIGHT. 1 LIGHT = 10^18 units.
pub const UNITS_PER_LIGHT: Amount = 1_000_000_000_000_000_000;

/// A LIGHT amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Light {
    /// Amount in units (1 LIGHT = 10^18 units).
    pub units: Amount,
}

impl Light {
    pub fn from_units(units: Amount) -> Self {
        Self { units }
    }

    /// Create an amount from whole LIGHT. Saturates at `Amount::MAX`.
    pub fn from_light(whole: u64) -> Self {
        Self {
            units: (whole as Amount).saturating_mul(UNITS_PER_LIGHT),
        }
    }

    pub fn zero() -> Self {
        Self { units: 0 }
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.units / UNITS_PER_LIGHT;
        let frac = self.units % UNITS_PER_LIGHT;
        if frac == 0 {
            write!(f, "{} LIGHT", whole)
        } else {
            // Up to 18 decimal places, trailing zeros trimmed
            let frac_str = format!("{:018}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{} LIGHT", whole, trimmed)
        }
    }
}

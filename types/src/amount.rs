//! Chain token amounts.
//!
//! Amounts are fixed-point integers in the chain's smallest unit (18 decimals),
//! so balances and thresholds compare exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Number of decimals of the native chain token.
pub const DECIMALS: u32 = 18;

const UNIT: u128 = 10u128.pow(DECIMALS);

/// An amount of native chain token in base units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(base_units: u128) -> Self {
        Self(base_units)
    }

    /// Whole tokens, e.g. `Amount::whole(5)` is `5.0`.
    pub fn whole(tokens: u64) -> Self {
        Self(u128::from(tokens) * UNIT)
    }

    pub fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Display for Amount {
    /// Renders as a decimal token value with trailing zeros trimmed (`0.001`, `5`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNIT;
        let frac = self.0 % UNIT;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{:0width$}", frac, width = DECIMALS as usize);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl From<u128> for Amount {
    fn from(v: u128) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_trims_fraction() {
        assert_eq!(Amount::whole(5).to_string(), "5");
        assert_eq!(Amount::new(1_000_000_000_000_000).to_string(), "0.001");
        assert_eq!(Amount::new(1_500_000_000_000_000_000).to_string(), "1.5");
        assert_eq!(Amount::ZERO.to_string(), "0");
    }

    #[test]
    fn ordering_follows_base_units() {
        assert!(Amount::new(1) > Amount::ZERO);
        assert!(Amount::whole(1) > Amount::new(999_999_999_999_999_999));
    }
}

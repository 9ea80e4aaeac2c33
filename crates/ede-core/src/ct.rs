//! CT: the conserved, non-negative integer unit of accountable value.
//!
//! Amounts are `u128` with checked arithmetic only. They serialize as decimal
//! strings so every encoding (canonical CBOR, JSON) is lossless.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A CT amount.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ct(u128);

impl Ct {
    /// Zero CT.
    pub const ZERO: Self = Self(0);

    /// Create from a raw amount.
    pub const fn new(amount: u128) -> Self {
        Self(amount)
    }

    /// Get the raw amount.
    pub const fn amount(self) -> u128 {
        self.0
    }

    /// Check if this amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition. `None` on overflow.
    pub fn checked_add(self, rhs: Ct) -> Option<Ct> {
        self.0.checked_add(rhs.0).map(Ct)
    }

    /// Checked subtraction. `None` if the result would be negative.
    pub fn checked_sub(self, rhs: Ct) -> Option<Ct> {
        self.0.checked_sub(rhs.0).map(Ct)
    }

    /// Checked sum of a sequence of amounts. `None` on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Ct>
    where
        I: IntoIterator<Item = Ct>,
    {
        amounts
            .into_iter()
            .try_fold(Ct::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

impl fmt::Debug for Ct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ct({})", self.0)
    }
}

impl fmt::Display for Ct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Ct {
    fn from(amount: u64) -> Self {
        Self(u128::from(amount))
    }
}

impl From<u128> for Ct {
    fn from(amount: u128) -> Self {
        Self(amount)
    }
}

impl FromStr for Ct {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>().map(Ct)
    }
}

impl Serialize for Ct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Ct {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

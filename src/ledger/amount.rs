//! Fixed-point ledger amounts.
//!
//! The ledger carries seven decimal places; an `Amount` is a count of stroops
//! (1 unit = 10^7 stroops). The 1e-7 verification tolerance is exactly one
//! stroop, so comparisons stay in integer space.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, Result};

/// Stroops per whole unit.
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

/// A non-negative ledger amount in stroops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    /// Zero stroops.
    pub const ZERO: Amount = Amount(0);

    /// Largest representable amount (trustline limit).
    pub const MAX: Amount = Amount(i64::MAX);

    /// Wrap a raw stroop count.
    pub fn from_stroops(stroops: i64) -> Result<Self> {
        if stroops < 0 {
            return Err(EngineError::Validation(format!(
                "amount must not be negative, got {} stroops",
                stroops
            )));
        }
        Ok(Amount(stroops))
    }

    /// Parse a decimal string such as `"10"`, `"0.5"` or `"10.0000000"`.
    ///
    /// At most seven fractional digits are accepted; the ledger cannot
    /// represent anything finer.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| EngineError::Validation(format!("invalid amount '{}': {}", s, reason));

        let (whole, frac) = match s.split_once('.') {
            Some((_, "")) => return Err(invalid("trailing decimal point")),
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected decimal digits"));
        }
        if frac.len() > 7 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("at most 7 fractional digits"));
        }

        let whole: i64 = whole.parse().map_err(|_| invalid("integer part overflows"))?;
        let mut frac_stroops: i64 = 0;
        if !frac.is_empty() {
            frac_stroops = frac.parse::<i64>().map_err(|_| invalid("bad fraction"))?;
            frac_stroops *= 10i64.pow(7 - frac.len() as u32);
        }

        whole
            .checked_mul(STROOPS_PER_UNIT)
            .and_then(|w| w.checked_add(frac_stroops))
            .map(Amount)
            .ok_or_else(|| invalid("overflows the ledger amount range"))
    }

    /// Raw stroop count.
    pub fn stroops(&self) -> i64 {
        self.0
    }

    /// True for amounts strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Absolute difference in stroops, for tolerance checks.
    pub fn diff_stroops(&self, other: &Amount) -> i64 {
        (self.0 - other.0).abs()
    }

    /// Saturating addition.
    pub fn saturating_add(&self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }
}

impl std::fmt::Display for Amount {
    /// Formats with the ledger's full seven decimal places, e.g. `10.0000000`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:07}", self.0 / STROOPS_PER_UNIT, self.0 % STROOPS_PER_UNIT)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::parse(&s).map_err(serde::de::Error::custom)
    }
}

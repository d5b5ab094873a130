//! Stateful rounding that never loses energy.
//!
//! Estimated hourly values are integers, but the shares they come from are
//! not. The dragger rounds each share half-up and carries the fractional
//! remainder into the next call under the same key, so the running rounded
//! total never strays from the running real total by a whole unit.

use std::collections::BTreeMap;

/// Fixed-point decimal with 12 fractional digits.
///
/// Remainders accumulate over thousands of calls; binary floats would drift,
/// so the remainder arithmetic runs on scaled integers.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Neg,
    derive_more::Sub,
    derive_more::SubAssign,
)]
#[must_use]
pub struct Decimal(i128);

impl Decimal {
    pub const ZERO: Self = Self(0);

    const SCALE: i128 = 1_000_000_000_000;

    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(value: f64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        Self((value * Self::SCALE as f64).round() as i128)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    const fn from_int(value: i64) -> Self {
        Self(value as i128 * Self::SCALE)
    }

    /// Round half away from zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn round_half_up(self) -> i64 {
        let quotient = self.0 / Self::SCALE;
        let remainder = self.0 % Self::SCALE;
        if remainder.abs() * 2 >= Self::SCALE {
            (quotient + self.0.signum()) as i64
        } else {
            quotient as i64
        }
    }

    const fn is_half(self) -> bool {
        self.0.abs() * 2 == Self::SCALE
    }
}

/// Per-key rounding remainders.
#[derive(Debug, Default)]
pub struct Dragger<K: Ord> {
    remainders: BTreeMap<K, Decimal>,
}

impl<K: Ord> Dragger<K> {
    #[must_use]
    pub fn new() -> Self {
        Self { remainders: BTreeMap::new() }
    }

    /// Round `value` plus the key's remainder, keeping the new remainder.
    ///
    /// A zero value against a remainder of exactly one half returns zero and
    /// leaves the remainder alone, otherwise the carry would flip between
    /// +1 and -1 forever on a run of zeros.
    pub fn drag(&mut self, key: K, value: f64) -> i64 {
        let remainder = self.remainders.entry(key).or_default();
        if value == 0.0 && remainder.is_half() {
            return 0;
        }
        let total = *remainder + Decimal::from_f64(value);
        let rounded = total.round_half_up();
        *remainder = total - Decimal::from_int(rounded);
        rounded
    }

    /// Install a remainder carried over from a previous run.
    pub fn seed(&mut self, key: K, carry: Decimal) {
        self.remainders.insert(key, carry);
    }

    /// The remainder currently held for a key.
    pub fn remainder(&self, key: &K) -> Decimal {
        self.remainders.get(key).copied().unwrap_or_default()
    }
}

pub mod energy;
pub mod power;

use std::ops::{Div, Mul};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Dimensioned scalar: energy is `Quantity<1, 1>`, power is `Quantity<1, 0>`.
///
/// The const parameters only exist to keep incompatible magnitudes from being
/// added together by accident. Arithmetic with bare [`f64`] is allowed since
/// scaling factors and ratios are dimensionless.
#[derive(
    Clone,
    Copy,
    Default,
    Deserialize,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Neg,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
)]
#[from(i32, f64, OrderedFloat<f64>)]
#[must_use]
pub struct Quantity<const POWER: isize, const TIME: isize>(pub OrderedFloat<f64>);

impl<const POWER: isize, const TIME: isize> Quantity<POWER, TIME> {
    pub const ZERO: Self = Self(OrderedFloat(0.0));

    pub const fn abs(mut self) -> Self {
        self.0 = OrderedFloat(self.0.0.abs());
        self
    }

    #[must_use]
    pub const fn into_inner(self) -> f64 {
        self.0.0
    }
}

impl<const POWER: isize, const TIME: isize> Mul<f64> for Quantity<POWER, TIME> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl<const POWER: isize, const TIME: isize> Div<f64> for Quantity<POWER, TIME> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl<const POWER: isize, const TIME: isize> Div<Self> for Quantity<POWER, TIME> {
    type Output = OrderedFloat<f64>;

    fn div(self, rhs: Self) -> Self::Output {
        self.0 / rhs.0
    }
}

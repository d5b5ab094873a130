//! Contracted-power validation: the normalized commercial ladder and the
//! per-tariff checks.

use std::{collections::BTreeSet, sync::LazyLock};

use itertools::Itertools;

use crate::quantity::power::Kilowatts;

/// One of the distinct ways a set of contracted powers can be wrong.
///
/// `Tariff::evaluate_powers` raises the first of these, `power_check_errors`
/// collects them all; nothing is ever silently coerced.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PowerError {
    #[error("power should always be higher than 0")]
    NotPositive,

    #[error("expected {expected} power value(s) and got {got}")]
    IncorrectCount { got: usize, expected: usize },

    #[error("maximum power {power} is not between {min} and {max}")]
    IncorrectMaximum { power: Kilowatts, min: Kilowatts, max: Kilowatts },

    #[error("minimum power {power} is not between {min} and {max}")]
    IncorrectMinimum { power: Kilowatts, min: Kilowatts, max: Kilowatts },

    #[error("one or more of the powers is not a normalized value")]
    NotNormalized,

    #[error("powers should go in ascending order across periods")]
    NotAscending,
}

/// Standard circuit-breaker intensity steps, in amperes.
const INTENSITIES: &[f64] = &[
    1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 6.0, 7.0, 7.5, 10.0, 12.5, 15.0, 17.5, 20.0, 22.0,
    25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 63.0, 80.0, 100.0, 125.0, 160.0, 200.0, 250.0, 315.0,
    400.0, 500.0, 630.0,
];

/// Standard supply voltages and their phase count.
const VOLTAGES: &[(f64, u8)] =
    &[(127.0, 1), (220.0, 1), (230.0, 1), (400.0, 1), (220.0, 3), (230.0, 3), (380.0, 3), (400.0, 3)];

/// The ladder of normalized contracted powers, in watts.
static LADDER: LazyLock<BTreeSet<i64>> = LazyLock::new(|| {
    let mut watts = BTreeSet::new();
    for &(voltage, phases) in VOLTAGES {
        let factor = if phases == 3 { 3.0_f64.sqrt() } else { 1.0 };
        for &amperes in INTENSITIES {
            #[allow(clippy::cast_possible_truncation)]
            watts.insert((voltage * factor * amperes).round() as i64);
        }
    }
    watts
});

/// Is this wattage a normalized commercial rating?
#[must_use]
pub fn is_normalized(watts: i64) -> bool {
    LADDER.contains(&watts)
}

#[must_use]
pub fn is_normalized_power(power: Kilowatts) -> bool {
    is_normalized(power.as_watts())
}

/// Normalized ratings within `(min, max]`, ascending, in watts.
pub fn normalized_range(min: i64, max: i64) -> impl Iterator<Item = i64> {
    LADDER.range(min..=max).filter(move |&&watts| watts > min).copied()
}

/// Are the powers non-decreasing across period slots?
#[must_use]
pub fn are_ascending(powers: &[Kilowatts]) -> bool {
    powers.iter().tuple_windows().all(|(left, right)| left <= right)
}

pub mod catalog;
pub mod period;
pub mod power;
pub mod tables;

use std::collections::BTreeSet;

use bon::bon;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    calendar::{DayType, Season, is_weekend, localize, national_holidays},
    prelude::*,
    profile::Balance,
    quantity::power::Kilowatts,
    tariff::period::check_ranges,
};

pub use self::{
    period::{DayTypeLookup, HourRange, Magnitude, PeriodCode, TariffPeriod},
    power::PowerError,
};

/// Connection voltage class.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, derive_more::Display)]
pub enum Voltage {
    #[display("BT")]
    Low,

    #[display("AT")]
    High,
}

/// Which period-lookup rules the tariff follows.
///
/// The two are deliberately separate code paths: the pre-2021 lookup labels an
/// hour by its end (shifted, `(start, end]`, hour 0 read as 24) and derives
/// season and holiday from the previous hour, while the 2020-circular lookup
/// reads the hour directly. They disagree exactly at day boundaries, so
/// neither can impersonate the other.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Resolution {
    Legacy,
    Circular2020,
}

/// Metering-point loss compensation of the 3.1A family.
#[derive(Clone, Copy, Debug)]
pub struct MeteringLosses {
    /// Proportional curve losses.
    pub rate: f64,

    /// Transformer rating, set when measuring on the low-voltage side.
    pub kva: Option<f64>,

    /// Standing-loss hours per period and day.
    pub standing_hours: &'static [(PeriodCode, u32)],
}

impl MeteringLosses {
    fn standing_hours(&self, code: PeriodCode) -> u32 {
        self.standing_hours
            .iter()
            .find(|(candidate, _)| *candidate == code)
            .map_or(0, |(_, hours)| *hours)
    }
}

/// A regulator-defined tariff: its declared periods plus validation policy.
#[derive(Clone, Debug)]
pub struct Tariff {
    code: &'static str,
    coefficient_column: &'static str,
    min_power: Kilowatts,
    max_power: Kilowatts,
    voltage: Voltage,
    resolution: Resolution,
    periods: Vec<TariffPeriod>,
    require_powers_above_min: bool,
    require_normalized_powers: bool,
    require_ascending_powers: bool,
    losses: Option<MeteringLosses>,
}

#[bon]
impl Tariff {
    /// Assemble and validate a tariff.
    ///
    /// For tariffs with fixed seasonal hours the energy periods are grouped by
    /// holiday flag and each (season, flag) group must cover the day exactly
    /// once. Day-type driven tariffs pass `validate_full_coverage = false`
    /// since their geometry tables already guarantee coverage and are checked
    /// at period construction.
    #[builder]
    pub fn new(
        code: &'static str,
        coefficient_column: &'static str,
        #[builder(into)] min_power: Kilowatts,
        #[builder(into)] max_power: Kilowatts,
        #[builder(default = Voltage::Low)] voltage: Voltage,
        #[builder(default = Resolution::Legacy)] resolution: Resolution,
        periods: Vec<TariffPeriod>,
        #[builder(default)] require_powers_above_min: bool,
        #[builder(default = true)] validate_full_coverage: bool,
        #[builder(default = true)] require_normalized_powers: bool,
        #[builder(default)] require_ascending_powers: bool,
        losses: Option<MeteringLosses>,
    ) -> Result<Self> {
        let tariff = Self {
            code,
            coefficient_column,
            min_power,
            max_power,
            voltage,
            resolution,
            periods,
            require_powers_above_min,
            require_normalized_powers,
            require_ascending_powers,
            losses,
        };
        if validate_full_coverage {
            tariff.check_full_coverage()?;
        }
        Ok(tariff)
    }
}

impl Tariff {
    fn check_full_coverage(&self) -> Result {
        for season in [Season::Winter, Season::Summer] {
            for holiday in [false, true] {
                let group: Vec<&TariffPeriod> = self
                    .energy_periods()
                    .filter(|period| period.is_holiday() == holiday)
                    .collect();
                let total: u32 = group
                    .iter()
                    .map(|period| {
                        period.seasonal_hours(season).iter().map(|range| range.len_hours()).sum::<u32>()
                    })
                    .sum();
                if total != 24 && (!holiday || total != 0) {
                    return Err(Error::IncompleteDayCoverage { season, holiday, total });
                }
                let ranges: Vec<HourRange> = group
                    .iter()
                    .flat_map(|period| period.seasonal_hours(season).iter().copied())
                    .collect();
                if !check_ranges(&ranges) {
                    return Err(Error::InvalidHourRanges {
                        label: format!("{season} (holiday periods: {holiday})"),
                        ranges,
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Column of the hourly coefficient records this tariff weights with.
    #[must_use]
    pub fn coefficient_column(&self) -> &'static str {
        self.coefficient_column
    }

    #[must_use]
    pub const fn min_power(&self) -> Kilowatts {
        self.min_power
    }

    #[must_use]
    pub const fn max_power(&self) -> Kilowatts {
        self.max_power
    }

    #[must_use]
    pub const fn voltage(&self) -> Voltage {
        self.voltage
    }

    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[must_use]
    pub fn losses(&self) -> Option<&MeteringLosses> {
        self.losses.as_ref()
    }

    #[must_use]
    pub fn periods(&self) -> &[TariffPeriod] {
        &self.periods
    }

    pub fn energy_periods(&self) -> impl Iterator<Item = &TariffPeriod> {
        self.periods.iter().filter(|period| period.magnitude() == Magnitude::Energy)
    }

    pub fn power_periods(&self) -> impl Iterator<Item = &TariffPeriod> {
        self.periods.iter().filter(|period| period.magnitude() == Magnitude::Power)
    }

    /// Number of declared energy periods.
    #[must_use]
    pub fn number_of_periods(&self) -> usize {
        self.energy_periods().count()
    }

    #[must_use]
    pub fn has_holiday_periods(&self) -> bool {
        self.energy_periods().any(TariffPeriod::is_holiday)
    }

    #[must_use]
    pub fn has_holiday_hours_in_periods(&self) -> bool {
        self.periods.iter().any(|period| !period.holiday_hours().is_empty())
    }

    /// Resolve the active period for a timestamp.
    ///
    /// `holidays` is the externally supplied holiday calendar; the legacy path
    /// ignores it and recomputes the national set for the measurement's year,
    /// exactly like the metering regulation it implements.
    #[must_use]
    pub fn period_at(
        &self,
        at: DateTime<Tz>,
        holidays: &BTreeSet<NaiveDate>,
        magnitude: Magnitude,
    ) -> Option<&TariffPeriod> {
        match self.resolution {
            Resolution::Legacy => self.period_at_legacy(at, magnitude),
            Resolution::Circular2020 => self.period_at_circular(at, holidays, magnitude),
        }
    }

    fn period_at_legacy(&self, at: DateTime<Tz>, magnitude: Magnitude) -> Option<&TariffPeriod> {
        let previous = at - TimeDelta::hours(1);
        let season = Season::at(previous);
        let date = previous.date_naive();
        let holidays = national_holidays(date.year());
        let holiday = is_weekend(date) || holidays.contains(&date);
        // Curves label hours by their end, so hour 0 belongs to the previous day as 24.
        let hour = u8::try_from(at.hour()).ok()?;
        let hour = if hour == 0 { 24 } else { hour };
        self.periods.iter().filter(|period| period.magnitude() == magnitude).find(|period| {
            (period.is_holiday() == holiday || !self.has_holiday_periods())
                && period
                    .seasonal_hours(season)
                    .iter()
                    .any(|range| range.contains_shifted(hour))
        })
    }

    fn period_at_circular(
        &self,
        at: DateTime<Tz>,
        holidays: &BTreeSet<NaiveDate>,
        magnitude: Magnitude,
    ) -> Option<&TariffPeriod> {
        let season = Season::at(at);
        let date = at.date_naive();
        let holiday = is_weekend(date) || holidays.contains(&date);
        let hour = u8::try_from(at.hour()).ok()?;
        for period in self.periods.iter().filter(|period| period.magnitude() == magnitude) {
            let ranges: &[HourRange] = if period.is_holiday() == holiday
                || !self.has_holiday_periods()
            {
                if let Some(lookup) = period.day_type() {
                    let Some(ranges) = day_type_ranges(period, lookup, date, holidays) else {
                        continue;
                    };
                    ranges
                } else {
                    period.seasonal_hours(season)
                }
            } else if magnitude == Magnitude::Power {
                if let Some(lookup) = period.day_type() {
                    let Some(ranges) = day_type_ranges(period, lookup, date, holidays) else {
                        continue;
                    };
                    ranges
                } else if holiday && self.has_holiday_hours_in_periods() {
                    if period.holiday_hours().is_empty() {
                        continue;
                    }
                    period.holiday_hours()
                } else {
                    period.seasonal_hours(season)
                }
            } else {
                continue;
            };
            if ranges.iter().any(|range| range.contains(hour)) {
                return Some(period);
            }
        }
        None
    }

    /// Resolve the period of a metering-curve slot given as a civil day plus
    /// an hour offset.
    ///
    /// The offset counts absolute hours from the day's local midnight, which
    /// makes slot labels unambiguous across DST transitions (a 25-hour day
    /// simply runs up to offset 25). The end of the slot is exclusive, hence
    /// the minute subtracted before resolving.
    #[must_use]
    pub fn period_code_at_offset(&self, day: NaiveDate, hour_offset: i64) -> Option<PeriodCode> {
        let midnight = localize(day.and_time(NaiveTime::MIN));
        let at = midnight + TimeDelta::hours(hour_offset) - TimeDelta::minutes(1);
        self.period_at(at, &BTreeSet::new(), Magnitude::Energy).map(TariffPeriod::code)
    }

    /// Run every power check and collect the violations.
    #[must_use]
    pub fn power_check_errors(&self, powers: &[Kilowatts], allow_zero: bool) -> Vec<PowerError> {
        let expected = self.power_periods().count();
        let (Some(&min), Some(&max)) = (powers.iter().min(), powers.iter().max()) else {
            return vec![PowerError::IncorrectCount { got: 0, expected }];
        };
        let mut errors = Vec::new();
        if min < Kilowatts::ZERO || (!allow_zero && min == Kilowatts::ZERO) {
            errors.push(PowerError::NotPositive);
        }
        if powers.len() != expected {
            errors.push(PowerError::IncorrectCount { got: powers.len(), expected });
        }
        if !self.is_power_in_bounds(max) {
            errors.push(PowerError::IncorrectMaximum {
                power: max,
                min: self.min_power,
                max: self.max_power,
            });
        }
        if self.require_powers_above_min && !self.is_power_in_bounds(min) {
            errors.push(PowerError::IncorrectMinimum {
                power: min,
                min: self.min_power,
                max: self.max_power,
            });
        }
        if self.require_normalized_powers
            && powers
                .iter()
                .filter(|power| !(allow_zero && **power == Kilowatts::ZERO))
                .any(|power| !power::is_normalized_power(*power))
        {
            errors.push(PowerError::NotNormalized);
        }
        if self.require_ascending_powers && !power::are_ascending(powers) {
            errors.push(PowerError::NotAscending);
        }
        errors
    }

    /// Like [`Self::power_check_errors`], failing on the first violation.
    pub fn evaluate_powers(
        &self,
        powers: &[Kilowatts],
        allow_zero: bool,
    ) -> Result<(), PowerError> {
        self.power_check_errors(powers, allow_zero).into_iter().next().map_or(Ok(()), Err)
    }

    fn is_power_in_bounds(&self, power: Kilowatts) -> bool {
        self.min_power < power && power <= self.max_power
    }

    /// Replace an invalid power set with the first normalized rating above the
    /// tariff's minimum. Only the domestic 2.x family supports this.
    pub fn correct_powers(&self, powers: &[Kilowatts]) -> Result<Vec<Kilowatts>> {
        if !self.code.starts_with("2.") {
            return Err(Error::CorrectionUnsupported(self.code.to_string()));
        }
        if self.evaluate_powers(powers, false).is_ok() {
            return Ok(powers.to_vec());
        }
        let watts = power::normalized_range(self.min_power.as_watts(), self.max_power.as_watts())
            .next()
            .ok_or_else(|| Error::CorrectionUnsupported(self.code.to_string()))?;
        #[allow(clippy::cast_precision_loss)]
        let corrected = Kilowatts::from(watts as f64 / 1000.0);
        Ok(vec![corrected; self.power_periods().count()])
    }

    /// Surcharge a per-period balance with the metering-point losses of the
    /// 3.1A LB family: proportional curve losses plus the transformer's
    /// standing losses over the working or non-working days of the window.
    #[must_use]
    pub fn apply_metering_losses(
        &self,
        balance: &Balance,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Balance {
        let Some(losses) = &self.losses else {
            return balance.clone();
        };
        let kva = losses.kva.unwrap_or_default();
        let holidays = national_holidays(start.year());
        let (workdays, non_working) =
            crate::calendar::holidays::count_workdays_and_holidays(start, end, &holidays);
        balance
            .iter()
            .map(|(&code, &energy)| {
                let days = if code > PeriodCode::P3 { non_working } else { workdays };
                let standing =
                    0.01 * f64::from(losses.standing_hours(code)) * f64::from(days) * kva;
                let surcharged = round2(energy.into_inner() * (1.0 + losses.rate)) + round2(standing);
                (code, surcharged.into())
            })
            .collect()
    }
}

fn day_type_ranges(
    period: &TariffPeriod,
    lookup: &DayTypeLookup,
    date: NaiveDate,
    holidays: &BTreeSet<NaiveDate>,
) -> Option<&'static [HourRange]> {
    let day_type = DayType::classify(date, lookup.zone, holidays)?;
    let row = period.code().table_row()?;
    lookup.table.ranges(lookup.zone, day_type, row)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

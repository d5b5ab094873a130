//! The regulator-defined tariff catalog.
//!
//! Each constructor assembles one tariff from a base configuration plus its
//! overrides; families share period sets through plain helper functions
//! instead of inheritance chains.

use crate::{
    calendar::Zone,
    prelude::*,
    tariff::{
        DayTypeLookup, HourRange, Magnitude, MeteringLosses, PeriodCode, Resolution, Tariff,
        TariffPeriod, Voltage,
        tables::{
            PERIODS_2X_CIRCULAR_2020, PERIODS_3X_CIRCULAR_2020, PERIODS_6X_CIRCULAR_2020,
            PeriodTable,
        },
    },
};

impl Tariff {
    /// Look a tariff up by its regulatory code, in the peninsular zone.
    #[must_use]
    pub fn by_code(code: &str) -> Option<Self> {
        Self::by_code_in_zone(code, Zone::Peninsula)
    }

    /// Look a tariff up by its regulatory code. Unknown codes are `None`,
    /// never an error. The zone only matters for the day-type driven
    /// 2021 tariffs.
    #[must_use]
    pub fn by_code_in_zone(code: &str, zone: Zone) -> Option<Self> {
        let tariff = match code {
            "2.0A" => t20a(),
            "2.0DHA" => t20dha(),
            "2.0DHS" => t20dhs(),
            "2.1A" => t21a(),
            "2.1DHA" => t21dha(),
            "2.1DHS" => t21dhs(),
            "3.0A" => t30a(),
            "3.0A C2" => t30a_c2(),
            "3.1A" | "3.1A LB" => t31a(None),
            "3.1A C2" => t31a_c2(None),
            "6.1A" => t61a(),
            "6.1B" => t61b(),
            "6.2" => t62(),
            "6.3" => t63(),
            "6.4" => t64(),
            "RE" => tre(),
            "2.0TD" => t20td(zone),
            "3.0TD" => t30td(zone),
            "6.1TD" => t61td(zone),
            "6.2TD" => t62td(zone),
            "6.3TD" => t63td(zone),
            "6.4TD" => t64td(zone),
            "3.0TDVE" => t30tdve(zone),
            "6.1TDVE" => t61tdve(zone),
            _ => return None,
        };
        Some(tariff.expect("catalog tariff definitions always validate"))
    }
}

fn hrs(ranges: &[(u8, u8)]) -> Vec<HourRange> {
    ranges.iter().map(|&(start, end)| HourRange::new(start, end)).collect()
}

fn energy_full(code: PeriodCode) -> Result<TariffPeriod> {
    TariffPeriod::builder(code, Magnitude::Energy).build()
}

fn energy(code: PeriodCode, winter: &[(u8, u8)], summer: &[(u8, u8)]) -> Result<TariffPeriod> {
    TariffPeriod::builder(code, Magnitude::Energy)
        .winter_hours(hrs(winter))
        .summer_hours(hrs(summer))
        .build()
}

fn energy_holiday(
    code: PeriodCode,
    winter: &[(u8, u8)],
    summer: &[(u8, u8)],
) -> Result<TariffPeriod> {
    TariffPeriod::builder(code, Magnitude::Energy)
        .winter_hours(hrs(winter))
        .summer_hours(hrs(summer))
        .holiday(true)
        .build()
}

fn power_full(code: PeriodCode) -> Result<TariffPeriod> {
    TariffPeriod::builder(code, Magnitude::Power).build()
}

fn day_type_period(
    code: PeriodCode,
    magnitude: Magnitude,
    table: &'static PeriodTable,
    zone: Zone,
) -> Result<TariffPeriod> {
    TariffPeriod::builder(code, magnitude).day_type(DayTypeLookup { table, zone }).build()
}

/// 2.0A: one energy period, domestic supply.
pub fn t20a() -> Result<Tariff> {
    Tariff::builder()
        .code("2.0A")
        .coefficient_column("A")
        .min_power(0)
        .max_power(10)
        .periods(vec![energy_full(PeriodCode::P1)?, power_full(PeriodCode::P1)?])
        .build()
}

fn dha_periods() -> Result<Vec<TariffPeriod>> {
    Ok(vec![
        energy(PeriodCode::P1, &[(12, 22)], &[(13, 23)])?,
        energy(PeriodCode::P2, &[(0, 12), (22, 24)], &[(0, 13), (23, 24)])?,
        power_full(PeriodCode::P1)?,
    ])
}

fn dhs_periods() -> Result<Vec<TariffPeriod>> {
    Ok(vec![
        energy(PeriodCode::P1, &[(13, 23)], &[(13, 23)])?,
        energy(PeriodCode::P2, &[(0, 1), (7, 13), (23, 24)], &[(0, 1), (7, 13), (23, 24)])?,
        energy(PeriodCode::P3, &[(1, 7)], &[(1, 7)])?,
        power_full(PeriodCode::P1)?,
    ])
}

/// 2.0DHA: two-period night discrimination.
pub fn t20dha() -> Result<Tariff> {
    Tariff::builder()
        .code("2.0DHA")
        .coefficient_column("B")
        .min_power(0)
        .max_power(10)
        .periods(dha_periods()?)
        .build()
}

/// 2.0DHS: three-period super-valley discrimination.
pub fn t20dhs() -> Result<Tariff> {
    Tariff::builder()
        .code("2.0DHS")
        .coefficient_column("D")
        .min_power(0)
        .max_power(10)
        .periods(dhs_periods()?)
        .build()
}

/// 2.1A: the 2.0A power band shifted to 10-15 kW.
pub fn t21a() -> Result<Tariff> {
    Tariff::builder()
        .code("2.1A")
        .coefficient_column("A")
        .min_power(10)
        .max_power(15)
        .periods(vec![energy_full(PeriodCode::P1)?, power_full(PeriodCode::P1)?])
        .build()
}

pub fn t21dha() -> Result<Tariff> {
    Tariff::builder()
        .code("2.1DHA")
        .coefficient_column("B")
        .min_power(10)
        .max_power(15)
        .periods(dha_periods()?)
        .build()
}

pub fn t21dhs() -> Result<Tariff> {
    Tariff::builder()
        .code("2.1DHS")
        .coefficient_column("D")
        .min_power(10)
        .max_power(15)
        .periods(dhs_periods()?)
        .build()
}

fn t30a_workday_periods() -> Result<Vec<TariffPeriod>> {
    Ok(vec![
        energy(PeriodCode::P1, &[(18, 22)], &[(11, 15)])?,
        energy(PeriodCode::P2, &[(8, 18), (22, 24)], &[(8, 11), (15, 24)])?,
        energy(PeriodCode::P3, &[(0, 8)], &[(0, 8)])?,
    ])
}

fn t30a_periods() -> Result<Vec<TariffPeriod>> {
    let mut periods = t30a_workday_periods()?;
    periods.push(energy_holiday(PeriodCode::P4, &[(18, 22)], &[(11, 15)])?);
    periods.push(energy_holiday(PeriodCode::P5, &[(8, 18), (22, 24)], &[(8, 11), (15, 24)])?);
    periods.push(energy_holiday(PeriodCode::P6, &[(0, 8)], &[(0, 8)])?);
    periods.extend([
        power_full(PeriodCode::P1)?,
        power_full(PeriodCode::P2)?,
        power_full(PeriodCode::P3)?,
    ]);
    Ok(periods)
}

/// 3.0A: six energy periods, holiday-aware.
pub fn t30a() -> Result<Tariff> {
    Tariff::builder()
        .code("3.0A")
        .coefficient_column("C")
        .min_power(15)
        .max_power(1_000_000)
        .require_powers_above_min(true)
        .periods(t30a_periods()?)
        .build()
}

/// 3.0A without holiday periods (type-2 curve metering).
pub fn t30a_c2() -> Result<Tariff> {
    let mut periods = t30a_workday_periods()?;
    periods.extend([
        power_full(PeriodCode::P1)?,
        power_full(PeriodCode::P2)?,
        power_full(PeriodCode::P3)?,
    ]);
    Tariff::builder()
        .code("3.0A")
        .coefficient_column("C")
        .min_power(15)
        .max_power(1_000_000)
        .require_powers_above_min(true)
        .periods(periods)
        .build()
}

/// A 3.0A with one unique period.
pub fn t30a_single_period() -> Result<Tariff> {
    Tariff::builder()
        .code("3.0A")
        .coefficient_column("C")
        .min_power(15)
        .max_power(1_000_000)
        .require_powers_above_min(true)
        .periods(vec![energy_full(PeriodCode::P1)?, power_full(PeriodCode::P1)?])
        .build()
}

const T31A_STANDING_HOURS: &[(PeriodCode, u32)] = &[
    (PeriodCode::P1, 6),
    (PeriodCode::P2, 10),
    (PeriodCode::P3, 8),
    (PeriodCode::P4, 0),
    (PeriodCode::P5, 6),
    (PeriodCode::P6, 18),
];

fn t31a_workday_periods() -> Result<Vec<TariffPeriod>> {
    Ok(vec![
        energy(PeriodCode::P1, &[(17, 23)], &[(10, 16)])?,
        energy(PeriodCode::P2, &[(8, 17), (23, 24)], &[(8, 10), (16, 24)])?,
        energy(PeriodCode::P3, &[(0, 8)], &[(0, 8)])?,
    ])
}

/// 3.1A: high-voltage supply with curve losses; `kva` switches on the
/// low-voltage-measurement (LB) compensation.
pub fn t31a(kva: Option<f64>) -> Result<Tariff> {
    let mut periods = t31a_workday_periods()?;
    periods.push(energy_holiday(PeriodCode::P5, &[(18, 24)], &[(18, 24)])?);
    periods.push(energy_holiday(PeriodCode::P6, &[(0, 18)], &[(0, 18)])?);
    periods.extend([
        power_full(PeriodCode::P1)?,
        power_full(PeriodCode::P2)?,
        power_full(PeriodCode::P3)?,
    ]);
    Tariff::builder()
        .code("3.1A")
        .coefficient_column("C")
        .min_power(1)
        .max_power(450)
        .voltage(Voltage::High)
        .require_normalized_powers(false)
        .require_ascending_powers(true)
        .periods(periods)
        .losses(MeteringLosses { rate: 0.04, kva, standing_hours: T31A_STANDING_HOURS })
        .build()
}

/// 3.1A without holiday periods.
pub fn t31a_c2(kva: Option<f64>) -> Result<Tariff> {
    const STANDING_HOURS: &[(PeriodCode, u32)] =
        &[(PeriodCode::P1, 6), (PeriodCode::P2, 10), (PeriodCode::P3, 8)];
    let mut periods = t31a_workday_periods()?;
    periods.extend([
        power_full(PeriodCode::P1)?,
        power_full(PeriodCode::P2)?,
        power_full(PeriodCode::P3)?,
    ]);
    Tariff::builder()
        .code("3.1A")
        .coefficient_column("C")
        .min_power(1)
        .max_power(450)
        .voltage(Voltage::High)
        .require_normalized_powers(false)
        .require_ascending_powers(true)
        .periods(periods)
        .losses(MeteringLosses { rate: 0.04, kva, standing_hours: STANDING_HOURS })
        .build()
}

/// A 3.1A with one unique period.
pub fn t31a_single_period() -> Result<Tariff> {
    Tariff::builder()
        .code("3.1A")
        .coefficient_column("C")
        .min_power(1)
        .max_power(450)
        .voltage(Voltage::High)
        .require_normalized_powers(false)
        .require_ascending_powers(true)
        .periods(vec![energy_full(PeriodCode::P1)?, power_full(PeriodCode::P1)?])
        .losses(MeteringLosses { rate: 0.04, kva: None, standing_hours: T31A_STANDING_HOURS })
        .build()
}

fn six_power_periods() -> Result<Vec<TariffPeriod>> {
    [PeriodCode::P1, PeriodCode::P2, PeriodCode::P3, PeriodCode::P4, PeriodCode::P5, PeriodCode::P6]
        .into_iter()
        .map(power_full)
        .collect()
}

fn t6x(code: &'static str) -> Result<Tariff> {
    let mut periods = vec![energy_full(PeriodCode::P1)?];
    periods.extend(six_power_periods()?);
    Tariff::builder()
        .code(code)
        .coefficient_column("C")
        .min_power(450)
        .max_power(1_000_000)
        .voltage(Voltage::High)
        .require_normalized_powers(false)
        .require_ascending_powers(true)
        .periods(periods)
        .build()
}

pub fn t61a() -> Result<Tariff> {
    t6x("6.1A")
}

pub fn t61b() -> Result<Tariff> {
    t6x("6.1B")
}

pub fn t62() -> Result<Tariff> {
    t6x("6.2")
}

pub fn t63() -> Result<Tariff> {
    t6x("6.3")
}

pub fn t64() -> Result<Tariff> {
    t6x("6.4")
}

/// Special-regime generation tariff.
pub fn tre() -> Result<Tariff> {
    Tariff::builder()
        .code("RE")
        .coefficient_column("A")
        .min_power(0)
        .max_power(1_000_000)
        .periods(vec![energy_full(PeriodCode::P0)?, power_full(PeriodCode::P0)?])
        .build()
}

/// 2.0TD: the 2021 domestic tariff, three energy and two power periods driven
/// by the zone day-type tables.
pub fn t20td(zone: Zone) -> Result<Tariff> {
    let periods = vec![
        day_type_period(PeriodCode::P1, Magnitude::Energy, &PERIODS_3X_CIRCULAR_2020, zone)?,
        day_type_period(PeriodCode::P2, Magnitude::Energy, &PERIODS_3X_CIRCULAR_2020, zone)?,
        day_type_period(PeriodCode::P3, Magnitude::Energy, &PERIODS_3X_CIRCULAR_2020, zone)?,
        day_type_period(PeriodCode::P1, Magnitude::Power, &PERIODS_2X_CIRCULAR_2020, zone)?,
        day_type_period(PeriodCode::P2, Magnitude::Power, &PERIODS_2X_CIRCULAR_2020, zone)?,
    ];
    Tariff::builder()
        .code("2.0TD")
        .coefficient_column("2.0TD")
        .min_power(0)
        .max_power(15)
        .resolution(Resolution::Circular2020)
        .validate_full_coverage(false)
        .periods(periods)
        .build()
}

fn six_day_type_periods(zone: Zone) -> Result<Vec<TariffPeriod>> {
    let codes = [
        PeriodCode::P1,
        PeriodCode::P2,
        PeriodCode::P3,
        PeriodCode::P4,
        PeriodCode::P5,
        PeriodCode::P6,
    ];
    let mut periods = Vec::with_capacity(codes.len() * 2);
    for code in codes {
        periods.push(day_type_period(code, Magnitude::Energy, &PERIODS_6X_CIRCULAR_2020, zone)?);
    }
    for code in codes {
        periods.push(day_type_period(code, Magnitude::Power, &PERIODS_6X_CIRCULAR_2020, zone)?);
    }
    Ok(periods)
}

fn six_period_td(
    code: &'static str,
    coefficient_column: &'static str,
    min_power: i32,
    voltage: Voltage,
    zone: Zone,
) -> Result<Tariff> {
    Tariff::builder()
        .code(code)
        .coefficient_column(coefficient_column)
        .min_power(min_power)
        .max_power(100_000)
        .voltage(voltage)
        .resolution(Resolution::Circular2020)
        .validate_full_coverage(false)
        .periods(six_day_type_periods(zone)?)
        .build()
}

/// 3.0TD: six periods on low voltage.
pub fn t30td(zone: Zone) -> Result<Tariff> {
    six_period_td("3.0TD", "3.0TD", 15, Voltage::Low, zone)
}

pub fn t61td(zone: Zone) -> Result<Tariff> {
    six_period_td("6.1TD", "6.1TD", 0, Voltage::High, zone)
}

/// The 6.2/6.3/6.4 levels keep the 6.1TD geometry and coefficient column.
pub fn t62td(zone: Zone) -> Result<Tariff> {
    six_period_td("6.2TD", "6.1TD", 0, Voltage::High, zone)
}

pub fn t63td(zone: Zone) -> Result<Tariff> {
    six_period_td("6.3TD", "6.1TD", 0, Voltage::High, zone)
}

pub fn t64td(zone: Zone) -> Result<Tariff> {
    six_period_td("6.4TD", "6.1TD", 0, Voltage::High, zone)
}

/// Electric-vehicle variants: only the code changes.
pub fn t30tdve(zone: Zone) -> Result<Tariff> {
    six_period_td("3.0TDVE", "3.0TD", 15, Voltage::Low, zone)
}

pub fn t61tdve(zone: Zone) -> Result<Tariff> {
    six_period_td("6.1TDVE", "6.1TD", 0, Voltage::High, zone)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{DateTime, Datelike, NaiveDate, TimeDelta};
    use chrono_tz::Tz;

    use super::*;
    use crate::{
        calendar::{localize, national_holidays},
        quantity::power::Kilowatts,
        tariff::PowerError,
    };

    fn midnight(year: i32, month: u32, day: u32) -> DateTime<Tz> {
        localize(NaiveDate::from_ymd_opt(year, month, day).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    fn kw(values: &[f64]) -> Vec<Kilowatts> {
        values.iter().copied().map(Kilowatts::from).collect()
    }

    #[track_caller]
    fn assert_periods(tariff: &Tariff, day: DateTime<Tz>, expected: &[(i64, PeriodCode)]) {
        let holidays = national_holidays(day.year());
        for &(offset, code) in expected {
            let at = day + TimeDelta::hours(offset);
            let period = tariff.period_at(at, &holidays, Magnitude::Energy).unwrap();
            assert_eq!(period.code(), code, "hour offset {offset} at {at}");
        }
    }

    #[test]
    fn test_registry() {
        for code in [
            "2.0A", "2.0DHA", "2.0DHS", "2.1A", "2.1DHA", "2.1DHS", "3.0A", "3.0A C2", "3.1A",
            "3.1A LB", "3.1A C2", "6.1A", "6.1B", "6.2", "6.3", "6.4", "RE", "2.0TD", "3.0TD",
            "6.1TD", "6.2TD", "6.3TD", "6.4TD", "3.0TDVE", "6.1TDVE",
        ] {
            assert!(Tariff::by_code(code).is_some(), "missing {code}");
        }
        assert!(Tariff::by_code("NO_EXISTS").is_none());
    }

    #[test]
    fn test_registry_in_every_zone() {
        for zone in Zone::ALL {
            for code in ["2.0TD", "3.0TD", "6.1TD", "6.2TD", "6.3TD", "6.4TD"] {
                assert!(Tariff::by_code_in_zone(code, zone).is_some(), "missing {code} in {zone}");
            }
        }
    }

    #[test]
    fn test_coefficient_columns() {
        for (code, column) in [
            ("2.0A", "A"),
            ("2.0DHA", "B"),
            ("2.0DHS", "D"),
            ("2.1A", "A"),
            ("2.1DHA", "B"),
            ("2.1DHS", "D"),
            ("3.0A", "C"),
            ("3.1A", "C"),
            ("3.1A LB", "C"),
            ("2.0TD", "2.0TD"),
            ("3.0TDVE", "3.0TD"),
            ("6.2TD", "6.1TD"),
        ] {
            assert_eq!(Tariff::by_code(code).unwrap().coefficient_column(), column, "{code}");
        }
    }

    #[test]
    fn test_t20dha_weekday_hours() {
        let tariff = t20dha().unwrap();
        let winter = midnight(2014, 11, 12);
        assert_periods(&tariff, winter, &[
            (0, PeriodCode::P2),
            (7, PeriodCode::P2),
            (12, PeriodCode::P2),
            (13, PeriodCode::P1),
            (19, PeriodCode::P1),
            (22, PeriodCode::P1),
            (23, PeriodCode::P2),
            (24, PeriodCode::P2),
        ]);
        let summer = midnight(2014, 7, 16);
        assert_periods(&tariff, summer, &[
            (0, PeriodCode::P2),
            (13, PeriodCode::P2),
            (14, PeriodCode::P1),
            (23, PeriodCode::P1),
            (24, PeriodCode::P2),
        ]);
    }

    #[test]
    fn test_t20dha_holidays_share_workday_hours() {
        // Two-period discrimination has no holiday periods at all.
        let tariff = t20dha().unwrap();
        assert!(!tariff.has_holiday_periods());
        let holiday = midnight(2014, 11, 1);
        assert_periods(&tariff, holiday, &[
            (12, PeriodCode::P2),
            (13, PeriodCode::P1),
            (23, PeriodCode::P2),
        ]);
        let weekend = midnight(2014, 2, 15);
        assert_periods(&tariff, weekend, &[
            (12, PeriodCode::P2),
            (13, PeriodCode::P1),
            (22, PeriodCode::P1),
            (23, PeriodCode::P2),
        ]);
    }

    #[test]
    fn test_t30a_holiday_periods() {
        let tariff = t30a().unwrap();
        let holidays = national_holidays(2015);

        let workday_evening = localize(
            NaiveDate::from_ymd_opt(2015, 12, 24).unwrap().and_hms_opt(19, 0, 0).unwrap(),
        );
        let period = tariff.period_at(workday_evening, &holidays, Magnitude::Energy).unwrap();
        assert_eq!(period.code(), PeriodCode::P1);

        let christmas_evening = localize(
            NaiveDate::from_ymd_opt(2015, 12, 25).unwrap().and_hms_opt(19, 0, 0).unwrap(),
        );
        let period = tariff.period_at(christmas_evening, &holidays, Magnitude::Energy).unwrap();
        assert_eq!(period.code(), PeriodCode::P4);

        let sunday = midnight(2015, 12, 27);
        assert_periods(&tariff, sunday, &[
            (1, PeriodCode::P6),
            (17, PeriodCode::P5),
            (19, PeriodCode::P4),
        ]);
    }

    #[test]
    fn test_t20td_weekday_hours() {
        let tariff = t20td(Zone::Peninsula).unwrap();
        for day in [midnight(2021, 11, 12), midnight(2021, 7, 16)] {
            assert_periods(&tariff, day, &[
                (0, PeriodCode::P3),
                (7, PeriodCode::P3),
                (8, PeriodCode::P2),
                (9, PeriodCode::P2),
                (10, PeriodCode::P1),
                (13, PeriodCode::P1),
                (14, PeriodCode::P2),
                (17, PeriodCode::P2),
                (18, PeriodCode::P1),
                (21, PeriodCode::P1),
                (22, PeriodCode::P2),
                (23, PeriodCode::P2),
            ]);
        }
    }

    #[test]
    fn test_t20td_weekends_and_holidays_are_valley() {
        let tariff = t20td(Zone::Peninsula).unwrap();
        for day in [
            midnight(2021, 12, 18),
            midnight(2021, 6, 20),
            midnight(2022, 1, 6),
            midnight(2021, 8, 15),
        ] {
            for offset in 0..24 {
                assert_periods(&tariff, day, &[(offset, PeriodCode::P3)]);
            }
        }
    }

    #[test]
    fn test_t20td_power_periods() {
        let tariff = t20td(Zone::Peninsula).unwrap();
        let holidays = national_holidays(2021);

        let weekend = midnight(2021, 6, 20);
        for offset in 0..24 {
            let period = tariff
                .period_at(weekend + TimeDelta::hours(offset), &holidays, Magnitude::Power)
                .unwrap();
            assert_eq!(period.code(), PeriodCode::P2);
        }

        let workday = midnight(2021, 11, 12);
        let at_night = tariff.period_at(workday, &holidays, Magnitude::Power).unwrap();
        assert_eq!(at_night.code(), PeriodCode::P2);
        let at_noon = tariff
            .period_at(workday + TimeDelta::hours(12), &holidays, Magnitude::Power)
            .unwrap();
        assert_eq!(at_noon.code(), PeriodCode::P1);
    }

    #[test]
    fn test_t20td_city_zones_shift_the_peak() {
        let peninsula = t20td(Zone::Peninsula).unwrap();
        let ceuta = t20td(Zone::Ceuta).unwrap();
        // 2022-01-19 is a high-demand day in both zones.
        let day = midnight(2022, 1, 19);
        assert_periods(&peninsula, day, &[
            (9, PeriodCode::P2),
            (10, PeriodCode::P1),
            (14, PeriodCode::P2),
            (18, PeriodCode::P1),
            (22, PeriodCode::P2),
        ]);
        assert_periods(&ceuta, day, &[
            (9, PeriodCode::P2),
            (10, PeriodCode::P2),
            (11, PeriodCode::P1),
            (15, PeriodCode::P2),
            (19, PeriodCode::P1),
            (23, PeriodCode::P2),
        ]);
    }

    #[test]
    fn test_t30td_band_rotation() {
        let tariff = t30td(Zone::Peninsula).unwrap();
        // A high-demand day prices the peak in P1.
        assert_periods(&tariff, midnight(2022, 1, 19), &[
            (0, PeriodCode::P6),
            (8, PeriodCode::P2),
            (9, PeriodCode::P1),
            (14, PeriodCode::P2),
            (18, PeriodCode::P1),
            (22, PeriodCode::P2),
        ]);
        // A March day drops one band.
        assert_periods(&tariff, midnight(2022, 3, 15), &[
            (8, PeriodCode::P3),
            (9, PeriodCode::P2),
            (14, PeriodCode::P3),
            (18, PeriodCode::P2),
        ]);
        // A low-demand day prices it in P4.
        assert_periods(&tariff, midnight(2022, 4, 13), &[
            (8, PeriodCode::P5),
            (9, PeriodCode::P4),
            (14, PeriodCode::P5),
            (18, PeriodCode::P4),
            (23, PeriodCode::P5),
        ]);
        // Weekends collapse into P6.
        assert_periods(&tariff, midnight(2022, 4, 16), &[(3, PeriodCode::P6), (12, PeriodCode::P6)]);
    }

    #[test]
    fn test_offset_resolution_across_dst() {
        let tariff = t20td(Zone::Peninsula).unwrap();
        // Both transition days of 2021 are Sundays, every slot is valley.
        let spring = NaiveDate::from_ymd_opt(2021, 3, 28).unwrap();
        for offset in 1..=23 {
            assert_eq!(tariff.period_code_at_offset(spring, offset), Some(PeriodCode::P3));
        }
        let autumn = NaiveDate::from_ymd_opt(2021, 10, 31).unwrap();
        for offset in 1..=25 {
            assert_eq!(tariff.period_code_at_offset(autumn, offset), Some(PeriodCode::P3));
        }

        // On a workday the slot label names the end of the hour.
        let workday = NaiveDate::from_ymd_opt(2021, 11, 12).unwrap();
        assert_eq!(tariff.period_code_at_offset(workday, 1), Some(PeriodCode::P3));
        assert_eq!(tariff.period_code_at_offset(workday, 11), Some(PeriodCode::P1));
        assert_eq!(tariff.period_code_at_offset(workday, 9), Some(PeriodCode::P2));
    }

    #[test]
    fn test_full_year_resolves_exactly_once() {
        let tariffs =
            [t20a().unwrap(), t20dha().unwrap(), t20dhs().unwrap(), t30a().unwrap(), t31a(None).unwrap()];
        let holidays = national_holidays(2015);
        for tariff in &tariffs {
            let mut at = midnight(2015, 1, 1) + TimeDelta::hours(1);
            let end = midnight(2016, 1, 1);
            while at <= end {
                let matches = tariff
                    .energy_periods()
                    .filter(|period| {
                        tariff
                            .period_at(at, &holidays, Magnitude::Energy)
                            .is_some_and(|found| std::ptr::eq(found, *period))
                    })
                    .count();
                assert_eq!(matches, 1, "{} at {at}", tariff.code());
                at += TimeDelta::hours(1);
            }
        }
    }

    #[test]
    fn test_td_full_year_resolves_every_hour() {
        let holidays = national_holidays(2022);
        for zone in Zone::ALL {
            let tariffs = [t20td(zone).unwrap(), t30td(zone).unwrap(), t61td(zone).unwrap()];
            for tariff in &tariffs {
                let mut at = midnight(2022, 1, 1);
                let end = midnight(2022, 12, 31) + TimeDelta::hours(23);
                while at <= end {
                    for magnitude in [Magnitude::Energy, Magnitude::Power] {
                        assert!(
                            tariff.period_at(at, &holidays, magnitude).is_some(),
                            "{} {magnitude} unresolved at {at} in {zone}",
                            tariff.code(),
                        );
                    }
                    at += TimeDelta::hours(1);
                }
            }
        }
    }

    #[test]
    fn test_domestic_power_evaluation() {
        let tariff = t20a().unwrap();
        assert_eq!(
            tariff.evaluate_powers(&kw(&[-10.0]), false),
            Err(PowerError::NotPositive)
        );
        assert_eq!(tariff.evaluate_powers(&kw(&[0.0]), false), Err(PowerError::NotPositive));
        assert_eq!(
            tariff.evaluate_powers(&kw(&[5.55]), false),
            Err(PowerError::NotNormalized)
        );
        assert!(tariff.evaluate_powers(&kw(&[5.5]), false).is_ok());
        assert_eq!(
            tariff.evaluate_powers(&kw(&[5.0, 7.0]), false),
            Err(PowerError::IncorrectCount { got: 2, expected: 1 })
        );
        assert!(matches!(
            tariff.evaluate_powers(&kw(&[100.0]), false),
            Err(PowerError::IncorrectMaximum { .. })
        ));
        assert!(tariff.evaluate_powers(&kw(&[8050.0 / 1000.0]), false).is_ok());
    }

    #[test]
    fn test_t30a_power_evaluation() {
        let tariff = t30a().unwrap();
        assert_eq!(
            tariff.evaluate_powers(&kw(&[-10.0, -5.0, 0.0]), false),
            Err(PowerError::NotPositive)
        );
        assert!(matches!(
            tariff.evaluate_powers(&kw(&[15.0, 15.0, 15.0]), false),
            Err(PowerError::IncorrectMaximum { .. })
        ));
        assert_eq!(
            tariff.evaluate_powers(&kw(&[16.454, 17.1, 16.454]), false),
            Err(PowerError::NotNormalized)
        );
        assert!(matches!(
            tariff.evaluate_powers(&kw(&[14.0, 15.242, 15.242]), false),
            Err(PowerError::IncorrectMinimum { .. })
        ));
        assert!(tariff.evaluate_powers(&kw(&[15.242, 15.242, 16.454]), false).is_ok());
        assert_eq!(
            tariff.evaluate_powers(&kw(&[16.454, 16.454]), false),
            Err(PowerError::IncorrectCount { got: 2, expected: 3 })
        );
    }

    #[test]
    fn test_ascending_power_families() {
        let tariff = t31a(None).unwrap();
        assert!(tariff.evaluate_powers(&kw(&[10.0, 13.0, 16.0]), false).is_ok());
        assert_eq!(
            tariff.evaluate_powers(&kw(&[16.0, 20.0, 16.0]), false),
            Err(PowerError::NotAscending)
        );

        let tariff = t61a().unwrap();
        assert!(tariff
            .evaluate_powers(&kw(&[400.0, 410.0, 420.0, 430.0, 440.0, 451.0]), false)
            .is_ok());
        assert!(tariff
            .evaluate_powers(&kw(&[500.0, 600.0, 700.0, 800.0, 900.0, 1000.0]), false)
            .is_ok());
        assert_eq!(
            tariff.evaluate_powers(&kw(&[500.0, 600.0, 700.0, 700.0, 600.0, 500.0]), false),
            Err(PowerError::NotAscending)
        );
    }

    #[test]
    fn test_td_zero_power_slots() {
        let tariff = t20td(Zone::Peninsula).unwrap();
        assert_eq!(
            tariff.evaluate_powers(&kw(&[-10.0, 5.0]), false),
            Err(PowerError::NotPositive)
        );
        assert_eq!(
            tariff.evaluate_powers(&kw(&[5.5]), false),
            Err(PowerError::IncorrectCount { got: 1, expected: 2 })
        );
        assert!(tariff.evaluate_powers(&kw(&[5.0, 7.0]), false).is_ok());
        assert!(matches!(
            tariff.evaluate_powers(&kw(&[0.0, 0.0]), true),
            Err(PowerError::IncorrectMaximum { .. })
        ));
        assert!(tariff.evaluate_powers(&kw(&[0.0, 10.0]), true).is_ok());
        assert!(tariff.evaluate_powers(&kw(&[10.0, 0.0]), true).is_ok());
    }

    #[test]
    fn test_collected_power_errors() {
        let tariff = t30a().unwrap();
        let errors = tariff.power_check_errors(&kw(&[-10.0, 17.1]), false);
        assert!(errors.contains(&PowerError::NotPositive));
        assert!(errors.contains(&PowerError::IncorrectCount { got: 2, expected: 3 }));
        assert!(errors.contains(&PowerError::NotNormalized));
        assert!(tariff.power_check_errors(&kw(&[15.242, 15.242, 16.454]), false).is_empty());
    }

    #[test]
    fn test_correct_powers() {
        let tariff = t20a().unwrap();
        let corrected = tariff.correct_powers(&kw(&[0.0])).unwrap();
        assert_eq!(corrected.len(), 1);
        assert!(crate::tariff::power::is_normalized_power(corrected[0]));

        // Valid sets come back unchanged.
        assert_eq!(tariff.correct_powers(&kw(&[5.5])).unwrap(), kw(&[5.5]));

        let unsupported = t30a().unwrap();
        assert!(matches!(
            unsupported.correct_powers(&kw(&[1.0, 2.0, 3.0])),
            Err(Error::CorrectionUnsupported(_))
        ));
    }

    #[test]
    fn test_metering_losses_balance() {
        use crate::profile::Balance;

        let tariff = t31a(Some(1.0)).unwrap();
        let balance: Balance = [
            (PeriodCode::P1, 100.0),
            (PeriodCode::P2, 80.0),
            (PeriodCode::P3, 60.0),
            (PeriodCode::P4, 12.0),
            (PeriodCode::P5, 15.0),
            (PeriodCode::P6, 15.0),
        ]
        .into_iter()
        .map(|(code, energy)| (code, energy.into()))
        .collect();

        let start = NaiveDate::from_ymd_opt(2015, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2015, 3, 31).unwrap();
        let surcharged = tariff.apply_metering_losses(&balance, start, end);
        assert_ne!(surcharged, balance);

        // March 2015: 22 workdays, 9 weekend days, no national holiday.
        // P1 gains 4% of curve losses plus 6 h/day of standing losses.
        let expected_p1 = 104.0 + 0.01 * 6.0 * 22.0 * 1.0;
        approx::assert_abs_diff_eq!(
            surcharged[&PeriodCode::P1].into_inner(),
            expected_p1,
            epsilon = 1e-9
        );
        // P6 counts non-working days.
        let expected_p6 = 15.6 + 0.01 * 18.0 * 9.0 * 1.0;
        approx::assert_abs_diff_eq!(
            surcharged[&PeriodCode::P6].into_inner(),
            expected_p6,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_t20dhs_super_valley() {
        let tariff = t20dhs().unwrap();
        assert_eq!(tariff.number_of_periods(), 3);
        let day = midnight(2014, 11, 12);
        assert_periods(&tariff, day, &[
            (1, PeriodCode::P2),
            (2, PeriodCode::P3),
            (7, PeriodCode::P3),
            (8, PeriodCode::P2),
            (14, PeriodCode::P1),
            (23, PeriodCode::P1),
            (24, PeriodCode::P2),
        ]);
    }
}

//! Period-hour geometry per regulation, zone and day type.
//!
//! Each row lists, per period ordinal, the local hour ranges in which that
//! period is active. The tables transcribe BOE-A-2020-1066 (2.0TD/3.0TD/6.xTD)
//! and the older BOE-A-2001-20850 six-period geometry, with every zone spelled
//! out rather than derived from the peninsular one.

use crate::{
    calendar::{DayType, Zone},
    tariff::period::HourRange,
};

/// Hour ranges per period ordinal for one (zone, day-type) row.
pub type PeriodRows = &'static [&'static [HourRange]];

/// A zone/day-type keyed table of period hour geometry.
#[derive(Debug)]
pub struct PeriodTable {
    rows: &'static [(Zone, DayType, PeriodRows)],
}

impl PeriodTable {
    /// All period rows of a (zone, day-type) combination, `None` when the day
    /// type does not exist under the table's regulation.
    #[must_use]
    pub fn rows(&self, zone: Zone, day_type: DayType) -> Option<PeriodRows> {
        self.rows
            .iter()
            .find(|(row_zone, row_day_type, _)| (*row_zone, *row_day_type) == (zone, day_type))
            .map(|(_, _, rows)| *rows)
    }

    /// Active hours of one period ordinal.
    #[must_use]
    pub fn ranges(&self, zone: Zone, day_type: DayType, row: usize) -> Option<&'static [HourRange]> {
        self.rows(zone, day_type)?.get(row).copied()
    }
}

const fn hr(start: u8, end: u8) -> HourRange {
    HourRange::new(start, end)
}

const NONE: &[HourRange] = &[];
const ALL_DAY: &[HourRange] = &[hr(0, 24)];
const NIGHT: &[HourRange] = &[hr(0, 8)];

/// Two-period power geometry of the 2020 circular. Identical in all zones.
pub static PERIODS_2X_CIRCULAR_2020: PeriodTable = {
    const P1: &[HourRange] = &[hr(8, 24)];
    const WORKDAY: PeriodRows = &[P1, NIGHT];
    const HOLIDAY: PeriodRows = &[NONE, ALL_DAY];
    PeriodTable {
        rows: &[
            (Zone::Peninsula, DayType::A, WORKDAY),
            (Zone::Peninsula, DayType::B, WORKDAY),
            (Zone::Peninsula, DayType::B1, WORKDAY),
            (Zone::Peninsula, DayType::C, WORKDAY),
            (Zone::Peninsula, DayType::D, HOLIDAY),
            (Zone::Balearic, DayType::A, WORKDAY),
            (Zone::Balearic, DayType::B, WORKDAY),
            (Zone::Balearic, DayType::B1, WORKDAY),
            (Zone::Balearic, DayType::C, WORKDAY),
            (Zone::Balearic, DayType::D, HOLIDAY),
            (Zone::Canary, DayType::A, WORKDAY),
            (Zone::Canary, DayType::B, WORKDAY),
            (Zone::Canary, DayType::B1, WORKDAY),
            (Zone::Canary, DayType::C, WORKDAY),
            (Zone::Canary, DayType::D, HOLIDAY),
            (Zone::Ceuta, DayType::A, WORKDAY),
            (Zone::Ceuta, DayType::B, WORKDAY),
            (Zone::Ceuta, DayType::B1, WORKDAY),
            (Zone::Ceuta, DayType::C, WORKDAY),
            (Zone::Ceuta, DayType::D, HOLIDAY),
            (Zone::Melilla, DayType::A, WORKDAY),
            (Zone::Melilla, DayType::B, WORKDAY),
            (Zone::Melilla, DayType::B1, WORKDAY),
            (Zone::Melilla, DayType::C, WORKDAY),
            (Zone::Melilla, DayType::D, HOLIDAY),
        ],
    }
};

/// Three-period geometry of the 2020 circular (2.0TD energy).
///
/// Mainland and islands share one clock; Ceuta and Melilla shift the peak one
/// hour later on high-demand days and keep the mainland clock otherwise.
pub static PERIODS_3X_CIRCULAR_2020: PeriodTable = {
    const MAINLAND: PeriodRows =
        &[&[hr(10, 14), hr(18, 22)], &[hr(8, 10), hr(14, 18), hr(22, 24)], NIGHT];
    const CITIES_A: PeriodRows =
        &[&[hr(11, 15), hr(19, 23)], &[hr(8, 11), hr(15, 19), hr(23, 24)], NIGHT];
    const HOLIDAY: PeriodRows = &[NONE, NONE, ALL_DAY];
    PeriodTable {
        rows: &[
            (Zone::Peninsula, DayType::A, MAINLAND),
            (Zone::Peninsula, DayType::B, MAINLAND),
            (Zone::Peninsula, DayType::B1, MAINLAND),
            (Zone::Peninsula, DayType::C, MAINLAND),
            (Zone::Peninsula, DayType::D, HOLIDAY),
            (Zone::Balearic, DayType::A, MAINLAND),
            (Zone::Balearic, DayType::B, MAINLAND),
            (Zone::Balearic, DayType::B1, MAINLAND),
            (Zone::Balearic, DayType::C, MAINLAND),
            (Zone::Balearic, DayType::D, HOLIDAY),
            (Zone::Canary, DayType::A, MAINLAND),
            (Zone::Canary, DayType::B, MAINLAND),
            (Zone::Canary, DayType::B1, MAINLAND),
            (Zone::Canary, DayType::C, MAINLAND),
            (Zone::Canary, DayType::D, HOLIDAY),
            (Zone::Ceuta, DayType::A, CITIES_A),
            (Zone::Ceuta, DayType::B, MAINLAND),
            (Zone::Ceuta, DayType::B1, MAINLAND),
            (Zone::Ceuta, DayType::C, MAINLAND),
            (Zone::Ceuta, DayType::D, HOLIDAY),
            (Zone::Melilla, DayType::A, CITIES_A),
            (Zone::Melilla, DayType::B, MAINLAND),
            (Zone::Melilla, DayType::B1, MAINLAND),
            (Zone::Melilla, DayType::C, MAINLAND),
            (Zone::Melilla, DayType::D, HOLIDAY),
        ],
    }
};

/// Six-period geometry of the 2020 circular (3.0TD/6.xTD).
pub static PERIODS_6X_CIRCULAR_2020: PeriodTable = {
    // Peninsular clock.
    const PEN_PEAK: &[HourRange] = &[hr(9, 14), hr(18, 22)];
    const PEN_SHOULDER: &[HourRange] = &[hr(8, 9), hr(14, 18), hr(22, 24)];
    // Island clock.
    const ISL_PEAK: &[HourRange] = &[hr(10, 15), hr(18, 22)];
    const ISL_SHOULDER: &[HourRange] = &[hr(8, 10), hr(15, 18), hr(22, 24)];
    // Ceuta and Melilla clock.
    const CITY_PEAK: &[HourRange] = &[hr(10, 15), hr(19, 23)];
    const CITY_SHOULDER: &[HourRange] = &[hr(8, 10), hr(15, 19), hr(23, 24)];

    const HOLIDAY: PeriodRows = &[NONE, NONE, NONE, NONE, NONE, ALL_DAY];

    PeriodTable {
        rows: &[
            (Zone::Peninsula, DayType::A, &[PEN_PEAK, PEN_SHOULDER, NONE, NONE, NONE, NIGHT]),
            (Zone::Peninsula, DayType::B, &[NONE, PEN_PEAK, PEN_SHOULDER, NONE, NONE, NIGHT]),
            (Zone::Peninsula, DayType::B1, &[NONE, NONE, PEN_PEAK, PEN_SHOULDER, NONE, NIGHT]),
            (Zone::Peninsula, DayType::C, &[NONE, NONE, NONE, PEN_PEAK, PEN_SHOULDER, NIGHT]),
            (Zone::Peninsula, DayType::D, HOLIDAY),
            (Zone::Balearic, DayType::A, &[ISL_PEAK, ISL_SHOULDER, NONE, NONE, NONE, NIGHT]),
            (Zone::Balearic, DayType::B, &[NONE, ISL_PEAK, ISL_SHOULDER, NONE, NONE, NIGHT]),
            (Zone::Balearic, DayType::B1, &[NONE, NONE, ISL_PEAK, ISL_SHOULDER, NONE, NIGHT]),
            (Zone::Balearic, DayType::C, &[NONE, NONE, NONE, ISL_PEAK, ISL_SHOULDER, NIGHT]),
            (Zone::Balearic, DayType::D, HOLIDAY),
            // The Canary A band skips P2 and prices the shoulder directly in P3;
            // its B1 band mirrors that by skipping P3.
            (Zone::Canary, DayType::A, &[ISL_PEAK, NONE, ISL_SHOULDER, NONE, NONE, NIGHT]),
            (Zone::Canary, DayType::B, &[NONE, ISL_PEAK, ISL_SHOULDER, NONE, NONE, NIGHT]),
            (Zone::Canary, DayType::B1, &[NONE, ISL_PEAK, NONE, ISL_SHOULDER, NONE, NIGHT]),
            (Zone::Canary, DayType::C, &[NONE, NONE, NONE, ISL_PEAK, ISL_SHOULDER, NIGHT]),
            (Zone::Canary, DayType::D, HOLIDAY),
            (Zone::Ceuta, DayType::A, &[CITY_PEAK, NONE, NONE, CITY_SHOULDER, NONE, NIGHT]),
            (Zone::Ceuta, DayType::B, &[NONE, CITY_PEAK, CITY_SHOULDER, NONE, NONE, NIGHT]),
            (Zone::Ceuta, DayType::B1, &[NONE, CITY_PEAK, NONE, CITY_SHOULDER, NONE, NIGHT]),
            (Zone::Ceuta, DayType::C, &[NONE, NONE, CITY_PEAK, NONE, CITY_SHOULDER, NIGHT]),
            (Zone::Ceuta, DayType::D, HOLIDAY),
            (Zone::Melilla, DayType::A, &[CITY_PEAK, CITY_SHOULDER, NONE, NONE, NONE, NIGHT]),
            (Zone::Melilla, DayType::B, &[NONE, CITY_PEAK, CITY_SHOULDER, NONE, NONE, NIGHT]),
            (Zone::Melilla, DayType::B1, &[NONE, NONE, CITY_PEAK, CITY_SHOULDER, NONE, NIGHT]),
            (Zone::Melilla, DayType::C, &[NONE, NONE, NONE, CITY_PEAK, CITY_SHOULDER, NIGHT]),
            (Zone::Melilla, DayType::D, HOLIDAY),
        ],
    }
};

/// Six-period geometry of RD 1164/2001 (3.1A and 6.x families).
pub static PERIODS_6X_2001: PeriodTable = {
    const HOLIDAY: PeriodRows = &[NONE, NONE, NONE, NONE, NONE, ALL_DAY];
    const C_ROW: PeriodRows = &[NONE, NONE, NONE, NONE, &[hr(8, 24)], NIGHT];
    const B_ROW: PeriodRows = &[NONE, NONE, &[hr(9, 15)], &[hr(8, 9), hr(15, 24)], NONE, NIGHT];
    const B1_ROW: PeriodRows = &[NONE, NONE, &[hr(16, 22)], &[hr(8, 16), hr(22, 24)], NONE, NIGHT];
    const A1_ROW: PeriodRows = &[&[hr(11, 19)], &[hr(8, 11), hr(19, 24)], NONE, NONE, NONE, NIGHT];

    PeriodTable {
        rows: &[
            (Zone::Peninsula, DayType::A, &[
                &[hr(10, 13), hr(18, 21)],
                &[hr(8, 10), hr(13, 18), hr(21, 24)],
                NONE,
                NONE,
                NONE,
                NIGHT,
            ]),
            (Zone::Peninsula, DayType::A1, A1_ROW),
            (Zone::Peninsula, DayType::B, B_ROW),
            (Zone::Peninsula, DayType::B1, B1_ROW),
            (Zone::Peninsula, DayType::C, C_ROW),
            (Zone::Peninsula, DayType::D, HOLIDAY),
            (Zone::Balearic, DayType::A, &[
                &[hr(11, 14), hr(18, 21)],
                &[hr(8, 11), hr(14, 18), hr(21, 24)],
                NONE,
                NONE,
                NONE,
                NIGHT,
            ]),
            (Zone::Balearic, DayType::A1, A1_ROW),
            (Zone::Balearic, DayType::B, B_ROW),
            (Zone::Balearic, DayType::B1, B1_ROW),
            (Zone::Balearic, DayType::C, C_ROW),
            (Zone::Balearic, DayType::D, HOLIDAY),
            (Zone::Canary, DayType::A, &[
                &[hr(11, 14), hr(18, 21)],
                &[hr(8, 11), hr(14, 18), hr(21, 24)],
                NONE,
                NONE,
                NONE,
                NIGHT,
            ]),
            (Zone::Canary, DayType::A1, A1_ROW),
            (Zone::Canary, DayType::B, B_ROW),
            (Zone::Canary, DayType::B1, B1_ROW),
            (Zone::Canary, DayType::C, C_ROW),
            (Zone::Canary, DayType::D, HOLIDAY),
            (Zone::Ceuta, DayType::A, &[
                &[hr(12, 15), hr(20, 23)],
                &[hr(8, 12), hr(15, 20), hr(23, 24)],
                NONE,
                NONE,
                NONE,
                NIGHT,
            ]),
            (Zone::Ceuta, DayType::A1, A1_ROW),
            (Zone::Ceuta, DayType::B, B_ROW),
            (Zone::Ceuta, DayType::B1, &[
                NONE,
                NONE,
                &[hr(17, 23)],
                &[hr(8, 17), hr(23, 24)],
                NONE,
                NIGHT,
            ]),
            (Zone::Ceuta, DayType::C, C_ROW),
            (Zone::Ceuta, DayType::D, HOLIDAY),
            (Zone::Melilla, DayType::A, &[
                &[hr(12, 15), hr(20, 23)],
                &[hr(8, 12), hr(15, 20), hr(23, 24)],
                NONE,
                NONE,
                NONE,
                NIGHT,
            ]),
            (Zone::Melilla, DayType::A1, A1_ROW),
            (Zone::Melilla, DayType::B, B_ROW),
            (Zone::Melilla, DayType::B1, &[
                NONE,
                NONE,
                &[hr(17, 23)],
                &[hr(8, 17), hr(23, 24)],
                NONE,
                NIGHT,
            ]),
            (Zone::Melilla, DayType::C, C_ROW),
            (Zone::Melilla, DayType::D, HOLIDAY),
        ],
    }
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::period::check_ranges;

    fn tables() -> [(&'static str, &'static PeriodTable); 4] {
        [
            ("2x", &PERIODS_2X_CIRCULAR_2020),
            ("3x", &PERIODS_3X_CIRCULAR_2020),
            ("6x", &PERIODS_6X_CIRCULAR_2020),
            ("6x 2001", &PERIODS_6X_2001),
        ]
    }

    #[test]
    fn test_rows_cover_full_days() {
        for (name, table) in tables() {
            for &(zone, day_type, rows) in table.rows {
                let total: u32 = rows
                    .iter()
                    .flat_map(|row| row.iter())
                    .map(|range| range.len_hours())
                    .sum();
                assert_eq!(total, 24, "{name} {zone} {day_type} does not cover the day");
            }
        }
    }

    #[test]
    fn test_rows_do_not_overlap() {
        for (name, table) in tables() {
            for &(zone, day_type, rows) in table.rows {
                let merged: Vec<HourRange> =
                    rows.iter().flat_map(|row| row.iter().copied()).collect();
                assert!(check_ranges(&merged), "{name} {zone} {day_type} overlaps: {merged:?}");
            }
        }
    }

    #[test]
    fn test_zone_specific_boundaries() {
        // The 6x peak runs 9-14 on the mainland, 10-15 on the islands and
        // 10-15/19-23 in Ceuta and Melilla.
        let peninsula = PERIODS_6X_CIRCULAR_2020.ranges(Zone::Peninsula, DayType::A, 0).unwrap();
        assert_eq!(peninsula, [hr(9, 14), hr(18, 22)]);
        let balearic = PERIODS_6X_CIRCULAR_2020.ranges(Zone::Balearic, DayType::A, 0).unwrap();
        assert_eq!(balearic, [hr(10, 15), hr(18, 22)]);
        let melilla = PERIODS_6X_CIRCULAR_2020.ranges(Zone::Melilla, DayType::A, 0).unwrap();
        assert_eq!(melilla, [hr(10, 15), hr(19, 23)]);

        // Canary A prices the shoulder in P3 rather than P2.
        assert!(PERIODS_6X_CIRCULAR_2020.ranges(Zone::Canary, DayType::A, 1).unwrap().is_empty());
        assert_eq!(
            PERIODS_6X_CIRCULAR_2020.ranges(Zone::Canary, DayType::A, 2).unwrap(),
            [hr(8, 10), hr(15, 18), hr(22, 24)],
        );

        // Melilla A keeps the shoulder in P2 while Ceuta moves it to P4.
        assert_eq!(
            PERIODS_6X_CIRCULAR_2020.ranges(Zone::Melilla, DayType::A, 1).unwrap(),
            [hr(8, 10), hr(15, 19), hr(23, 24)],
        );
        assert_eq!(
            PERIODS_6X_CIRCULAR_2020.ranges(Zone::Ceuta, DayType::A, 3).unwrap(),
            [hr(8, 10), hr(15, 19), hr(23, 24)],
        );

        // The 2001 Ceuta B1 evening peak runs 17-23.
        assert_eq!(PERIODS_6X_2001.ranges(Zone::Ceuta, DayType::B1, 2).unwrap(), [hr(17, 23)]);

        // The 3x tables only shift the peak for Ceuta and Melilla on A days.
        assert_eq!(
            PERIODS_3X_CIRCULAR_2020.ranges(Zone::Ceuta, DayType::A, 0).unwrap(),
            [hr(11, 15), hr(19, 23)],
        );
        assert_eq!(
            PERIODS_3X_CIRCULAR_2020.ranges(Zone::Ceuta, DayType::B, 0).unwrap(),
            [hr(10, 14), hr(18, 22)],
        );
    }

    #[test]
    fn test_missing_day_types() {
        assert!(PERIODS_6X_CIRCULAR_2020.rows(Zone::Peninsula, DayType::A1).is_none());
        assert!(PERIODS_6X_2001.rows(Zone::Peninsula, DayType::A1).is_some());
    }
}

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::is_weekend;

/// The five electric zones with distinct day-type and period-hour tables.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize, derive_more::Display)]
pub enum Zone {
    #[display("peninsula")]
    Peninsula,

    #[display("balearic")]
    Balearic,

    #[display("canary")]
    Canary,

    #[display("ceuta")]
    Ceuta,

    #[display("melilla")]
    Melilla,
}

impl Zone {
    pub const ALL: [Self; 5] =
        [Self::Peninsula, Self::Balearic, Self::Canary, Self::Ceuta, Self::Melilla];

    /// Zones are numbered 1 to 5 in the metering exchange formats.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Peninsula),
            2 => Some(Self::Balearic),
            3 => Some(Self::Canary),
            4 => Some(Self::Ceuta),
            5 => Some(Self::Melilla),
            _ => None,
        }
    }
}

/// Seasonal demand band of a calendar day. `D` is always a weekend or holiday.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize, derive_more::Display)]
pub enum DayType {
    A,
    A1,
    B,
    B1,
    C,
    D,
}

/// The 2020 circular applies from this date on; earlier days use the 2001 tables.
const CIRCULAR_3_2020_START: (i32, u32, u32) = (2021, 6, 1);

impl DayType {
    pub const ALL: [Self; 6] = [Self::A, Self::A1, Self::B, Self::B1, Self::C, Self::D];

    /// Classify a calendar day for a zone.
    ///
    /// Weekends and holidays are always `D`; any other day is looked up in the
    /// month/day windows of the regulation in force on that date. Returns
    /// `None` only for a day no window of the zone covers, which the shipped
    /// tables never produce.
    #[must_use]
    pub fn classify(date: NaiveDate, zone: Zone, holidays: &BTreeSet<NaiveDate>) -> Option<Self> {
        if is_weekend(date) || holidays.contains(&date) {
            return Some(Self::D);
        }
        let table = if (date.year(), date.month(), date.day()) >= CIRCULAR_3_2020_START {
            DAY_TYPES_CIRCULAR_2020
        } else {
            DAY_TYPES_2001
        };
        let month_day = (date.month(), date.day());
        let (_, bands) = table.iter().find(|(candidate, _)| *candidate == zone)?;
        bands
            .iter()
            .find(|(_, windows)| windows.iter().any(|(lo, hi)| (*lo..=*hi).contains(&month_day)))
            .map(|(day_type, _)| *day_type)
    }
}

/// Inclusive month/day window.
type MonthDayWindow = ((u32, u32), (u32, u32));

type ZoneBands = &'static [(DayType, &'static [MonthDayWindow])];

/// Day-type calendar of the 2020 circular (BOE-A-2020-1066), per zone.
/// The `02/29` upper bounds are literal and simply have no effect outside leap years.
const DAY_TYPES_CIRCULAR_2020: &[(Zone, ZoneBands)] = &[
    (Zone::Peninsula, &[
        (DayType::A, &[((1, 1), (2, 29)), ((7, 1), (7, 31)), ((12, 1), (12, 31))]),
        (DayType::B, &[((3, 1), (3, 31)), ((11, 1), (11, 30))]),
        (DayType::B1, &[((6, 1), (6, 30)), ((8, 1), (9, 30))]),
        (DayType::C, &[((4, 1), (5, 31)), ((10, 1), (10, 31))]),
        (DayType::D, &[]),
    ]),
    (Zone::Balearic, &[
        (DayType::A, &[((6, 1), (9, 30))]),
        (DayType::B, &[((5, 1), (5, 31)), ((10, 1), (10, 31))]),
        (DayType::B1, &[((1, 1), (2, 29)), ((12, 1), (12, 31))]),
        (DayType::C, &[((3, 1), (4, 30)), ((11, 1), (11, 30))]),
        (DayType::D, &[]),
    ]),
    (Zone::Canary, &[
        (DayType::A, &[((7, 1), (10, 31))]),
        (DayType::B, &[((11, 1), (12, 31))]),
        (DayType::B1, &[((1, 1), (3, 31))]),
        (DayType::C, &[((4, 1), (6, 30))]),
        (DayType::D, &[]),
    ]),
    (Zone::Ceuta, &[
        (DayType::A, &[((1, 1), (2, 29)), ((8, 1), (8, 31)), ((9, 1), (9, 30))]),
        (DayType::B, &[((7, 1), (7, 31)), ((10, 1), (10, 31))]),
        (DayType::B1, &[((3, 1), (3, 31)), ((11, 1), (12, 31))]),
        (DayType::C, &[((4, 1), (6, 30))]),
        (DayType::D, &[]),
    ]),
    (Zone::Melilla, &[
        (DayType::A, &[((1, 1), (1, 31)), ((7, 1), (9, 30))]),
        (DayType::B, &[((2, 1), (2, 29)), ((12, 1), (12, 31))]),
        (DayType::B1, &[((6, 1), (6, 30)), ((10, 1), (11, 30))]),
        (DayType::C, &[((3, 1), (5, 31))]),
        (DayType::D, &[]),
    ]),
];

/// Day-type calendar of RD 1164/2001, per zone.
const DAY_TYPES_2001: &[(Zone, ZoneBands)] = &[
    (Zone::Peninsula, &[
        (DayType::A, &[((1, 1), (2, 29)), ((12, 1), (12, 31))]),
        (DayType::A1, &[((6, 16), (7, 31))]),
        (DayType::B, &[((6, 1), (6, 15)), ((9, 1), (9, 30))]),
        (DayType::B1, &[((3, 1), (3, 31)), ((11, 1), (11, 30))]),
        (DayType::C, &[((4, 1), (5, 31)), ((10, 1), (10, 31))]),
        (DayType::D, &[((8, 1), (8, 31))]),
    ]),
    (Zone::Balearic, &[
        (DayType::A, &[((6, 1), (9, 30))]),
        (DayType::B1, &[((1, 1), (2, 29)), ((5, 1), (5, 31)), ((10, 1), (10, 31))]),
        (DayType::C, &[((3, 1), (3, 31)), ((11, 1), (12, 31))]),
        (DayType::D, &[((4, 1), (4, 30))]),
    ]),
    (Zone::Canary, &[
        (DayType::A, &[((9, 1), (12, 31))]),
        (DayType::B, &[((7, 1), (8, 31))]),
        (DayType::B1, &[((1, 1), (2, 29))]),
        (DayType::C, &[((3, 1), (4, 30)), ((6, 1), (6, 30))]),
        (DayType::D, &[((5, 1), (5, 31))]),
    ]),
    (Zone::Ceuta, &[
        (DayType::A, &[((1, 1), (2, 29)), ((8, 1), (8, 31)), ((12, 1), (12, 31))]),
        (DayType::B, &[((7, 1), (7, 31)), ((9, 1), (9, 30))]),
        (DayType::B1, &[((3, 1), (3, 31)), ((11, 1), (11, 30))]),
        (DayType::C, &[((4, 1), (4, 30)), ((6, 1), (6, 30)), ((10, 1), (10, 31))]),
        (DayType::D, &[((5, 1), (5, 31))]),
    ]),
    (Zone::Melilla, &[
        (DayType::A, &[((1, 1), (2, 29))]),
        (DayType::A1, &[((7, 1), (8, 31))]),
        (DayType::B, &[((6, 1), (6, 30)), ((9, 1), (9, 30))]),
        (DayType::B1, &[((3, 1), (3, 31)), ((12, 1), (12, 31))]),
        (DayType::C, &[((4, 1), (4, 30)), ((10, 1), (11, 30))]),
        (DayType::D, &[((5, 1), (5, 31))]),
    ]),
];

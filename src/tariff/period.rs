use bon::bon;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    calendar::{DayType, Season, Zone},
    prelude::*,
    tariff::tables::PeriodTable,
};

/// Half-open range of local hours `[start, end)` within a day.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[must_use]
pub struct HourRange {
    pub start: u8,
    pub end: u8,
}

impl HourRange {
    pub const FULL_DAY: Self = Self::new(0, 24);

    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn contains(self, hour: u8) -> bool {
        self.start <= hour && hour < self.end
    }

    /// Legacy containment: `(start, end]`, with hour 0 already mapped to 24
    /// by the caller. Pre-2021 metering curves label an hour by its end.
    #[must_use]
    pub const fn contains_shifted(self, hour: u8) -> bool {
        self.start < hour && hour <= self.end
    }

    #[must_use]
    pub const fn len_hours(self) -> u32 {
        (self.end - self.start) as u32
    }
}

/// Check a sequence of hour ranges: sorted, in bounds, non-overlapping.
#[must_use]
pub fn check_ranges(ranges: &[HourRange]) -> bool {
    let mut previous_end = 0;
    for range in ranges.iter().copied().sorted() {
        if range.start >= range.end || range.start > 24 || range.end < 1 || range.end > 24 {
            return false;
        }
        if range.start < previous_end {
            return false;
        }
        previous_end = range.end;
    }
    true
}

fn checked(label: &str, ranges: Vec<HourRange>) -> Result<Vec<HourRange>> {
    if check_ranges(&ranges) {
        Ok(ranges)
    } else {
        Err(Error::InvalidHourRanges { label: label.to_string(), ranges })
    }
}

/// Billing period identifier. `P0` only appears in the special-regime tariff.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize, derive_more::Display)]
pub enum PeriodCode {
    P0,
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
}

impl PeriodCode {
    /// Row of this period in the zone geometry tables (`P1` is row 0).
    #[must_use]
    pub const fn table_row(self) -> Option<usize> {
        match self {
            Self::P0 => None,
            Self::P1 => Some(0),
            Self::P2 => Some(1),
            Self::P3 => Some(2),
            Self::P4 => Some(3),
            Self::P5 => Some(4),
            Self::P6 => Some(5),
        }
    }
}

/// What the period prices: consumed energy (`te`) or contracted power (`tp`).
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, derive_more::Display)]
pub enum Magnitude {
    #[display("energy")]
    #[serde(rename = "te")]
    Energy,

    #[display("power")]
    #[serde(rename = "tp")]
    Power,
}

/// Period membership driven by the zone geometry tables instead of fixed hours.
#[derive(Clone, Copy, Debug)]
pub struct DayTypeLookup {
    pub table: &'static PeriodTable,
    pub zone: Zone,
}

/// One declared period of a tariff.
#[derive(Clone, Debug)]
pub struct TariffPeriod {
    code: PeriodCode,
    magnitude: Magnitude,
    winter_hours: Vec<HourRange>,
    summer_hours: Vec<HourRange>,
    holiday_hours: Vec<HourRange>,
    holiday: bool,
    day_type: Option<DayTypeLookup>,
}

#[bon]
impl TariffPeriod {
    /// Declare a period. Hour-range lists default to the full day; a period
    /// with a day-type lookup validates every row of the attached geometry
    /// table for its zone.
    #[builder]
    pub fn new(
        #[builder(start_fn)] code: PeriodCode,
        #[builder(start_fn)] magnitude: Magnitude,
        winter_hours: Option<Vec<HourRange>>,
        summer_hours: Option<Vec<HourRange>>,
        holiday_hours: Option<Vec<HourRange>>,
        #[builder(default)] holiday: bool,
        day_type: Option<DayTypeLookup>,
    ) -> Result<Self> {
        let winter_hours = checked("winter", winter_hours.unwrap_or_else(|| vec![HourRange::FULL_DAY]))?;
        let summer_hours = checked("summer", summer_hours.unwrap_or_else(|| vec![HourRange::FULL_DAY]))?;
        let holiday_hours = checked("holiday", holiday_hours.unwrap_or_default())?;
        if let Some(lookup) = day_type {
            for day_type in DayType::ALL {
                let Some(rows) = lookup.table.rows(lookup.zone, day_type) else {
                    continue;
                };
                let merged: Vec<HourRange> = rows.iter().flat_map(|row| row.iter().copied()).collect();
                if !check_ranges(&merged) {
                    return Err(Error::InvalidHourRanges {
                        label: format!("{day_type} day type in the {} zone", lookup.zone),
                        ranges: merged,
                    });
                }
            }
        }
        Ok(Self { code, magnitude, winter_hours, summer_hours, holiday_hours, holiday, day_type })
    }
}

impl TariffPeriod {
    #[must_use]
    pub const fn code(&self) -> PeriodCode {
        self.code
    }

    #[must_use]
    pub const fn magnitude(&self) -> Magnitude {
        self.magnitude
    }

    #[must_use]
    pub fn winter_hours(&self) -> &[HourRange] {
        &self.winter_hours
    }

    #[must_use]
    pub fn summer_hours(&self) -> &[HourRange] {
        &self.summer_hours
    }

    #[must_use]
    pub fn holiday_hours(&self) -> &[HourRange] {
        &self.holiday_hours
    }

    #[must_use]
    pub fn seasonal_hours(&self, season: Season) -> &[HourRange] {
        match season {
            Season::Winter => &self.winter_hours,
            Season::Summer => &self.summer_hours,
        }
    }

    #[must_use]
    pub const fn is_holiday(&self) -> bool {
        self.holiday
    }

    #[must_use]
    pub fn day_type(&self) -> Option<&DayTypeLookup> {
        self.day_type.as_ref()
    }

    #[must_use]
    pub fn total_winter_hours(&self) -> u32 {
        self.winter_hours.iter().map(|range| range.len_hours()).sum()
    }

    #[must_use]
    pub fn total_summer_hours(&self) -> u32 {
        self.summer_hours.iter().map(|range| range.len_hours()).sum()
    }
}

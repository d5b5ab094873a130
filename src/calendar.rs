pub mod day_type;
pub mod holidays;
pub mod season;
pub mod solar;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Weekday};
use chrono_tz::Tz;

pub use self::{
    day_type::{DayType, Zone},
    holidays::national_holidays,
    season::Season,
};

/// The reference timezone of the Spanish electricity system.
pub const TIMEZONE: Tz = chrono_tz::Europe::Madrid;

/// Resolve a naive local timestamp in the reference timezone.
///
/// Fall-back duplicates resolve to the standard-time occurrence, the
/// spring-forward gap to the same wall clock one hour later on the DST side.
#[must_use]
pub fn localize(naive: NaiveDateTime) -> DateTime<Tz> {
    match TIMEZONE.from_local_datetime(&naive) {
        chrono::LocalResult::Single(at) => at,
        chrono::LocalResult::Ambiguous(_daylight, standard) => standard,
        chrono::LocalResult::None => match TIMEZONE.from_local_datetime(&(naive + TimeDelta::hours(1))) {
            chrono::LocalResult::Single(at) | chrono::LocalResult::Ambiguous(at, _) => at,
            chrono::LocalResult::None => TIMEZONE.from_utc_datetime(&naive),
        },
    }
}

#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

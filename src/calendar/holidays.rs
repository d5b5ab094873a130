use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::calendar::is_weekend;

/// National holidays as the system operator applies them: only the fixed,
/// non-substitutable dates count. Movable feasts are excluded, and Epiphany
/// joined the list in 2022.
#[must_use]
pub fn national_holidays(year: i32) -> BTreeSet<NaiveDate> {
    let mut days = vec![(1, 1), (5, 1), (8, 15), (10, 12), (11, 1), (12, 6), (12, 8), (12, 25)];
    if year >= 2022 {
        days.push((1, 6));
    }
    days.into_iter().filter_map(|(month, day)| NaiveDate::from_ymd_opt(year, month, day)).collect()
}

/// Count the working and non-working days of an inclusive date window.
///
/// Saturdays, Sundays and the supplied holidays are non-working.
#[must_use]
pub fn count_workdays_and_holidays(
    start: NaiveDate,
    end: NaiveDate,
    holidays: &BTreeSet<NaiveDate>,
) -> (u32, u32) {
    let mut workdays = 0;
    let mut non_working = 0;
    for date in start.iter_days().take_while(|date| *date <= end) {
        if is_weekend(date) || holidays.contains(&date) {
            non_working += 1;
        } else {
            workdays += 1;
        }
    }
    (workdays, non_working)
}

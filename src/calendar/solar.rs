use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Solar hour of a civil timestamp.
///
/// Metering curves for self-consumption settlements are exchanged in solar
/// time, which for this system is plain UTC.
#[must_use]
pub fn solar_hour(civil: DateTime<Tz>) -> DateTime<Utc> {
    civil.with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::calendar::TIMEZONE;

    #[test]
    fn test_offsets_per_season() {
        let winter = TIMEZONE.with_ymd_and_hms(2019, 1, 1, 10, 0, 0).single().unwrap();
        assert_eq!(solar_hour(winter), Utc.with_ymd_and_hms(2019, 1, 1, 9, 0, 0).single().unwrap());

        let summer = TIMEZONE.with_ymd_and_hms(2019, 7, 1, 10, 0, 0).single().unwrap();
        assert_eq!(solar_hour(summer), Utc.with_ymd_and_hms(2019, 7, 1, 8, 0, 0).single().unwrap());
    }
}

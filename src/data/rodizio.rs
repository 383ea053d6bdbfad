//! Municipal vehicle restriction (rodízio) lookup
//!
//! Pure computation: the restricted plate digits depend only on the weekday
//! in São Paulo local time, taken as a fixed UTC-3 offset.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc, Weekday};

use super::VehicleRestriction;

/// São Paulo offset from UTC in seconds
const SAO_PAULO_OFFSET_SECS: i32 = 3 * 3600;

/// Plates value used when no restriction applies
pub const NOT_APPLICABLE: &str = "N/A";

/// Restricted final digits for a weekday
fn restricted_digits(weekday: Weekday) -> Option<[&'static str; 2]> {
    match weekday {
        Weekday::Mon => Some(["1", "2"]),
        Weekday::Tue => Some(["3", "4"]),
        Weekday::Wed => Some(["5", "6"]),
        Weekday::Thu => Some(["7", "8"]),
        Weekday::Fri => Some(["9", "0"]),
        Weekday::Sat | Weekday::Sun => None,
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Restriction in force on a local calendar date
pub fn restriction_for(date: NaiveDate) -> VehicleRestriction {
    let weekday = date.weekday();
    let plates = match restricted_digits(weekday) {
        Some(digits) => digits.iter().map(|d| d.to_string()).collect(),
        None => vec![NOT_APPLICABLE.to_string()],
    };

    VehicleRestriction {
        day: weekday_name(weekday).to_string(),
        plates,
    }
}

/// Restriction in force at an instant, evaluated in UTC-3
pub fn current_restriction(now: DateTime<Utc>) -> VehicleRestriction {
    // west_opt only fails for offsets beyond a day
    let local_date = match FixedOffset::west_opt(SAO_PAULO_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.date_naive(),
    };
    restriction_for(local_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monday_restricts_one_and_two() {
        // 2024-07-15 was a Monday
        let restriction = restriction_for(date(2024, 7, 15));
        assert_eq!(restriction.day, "Monday");
        assert_eq!(restriction.plates, vec!["1", "2"]);
    }

    #[test]
    fn test_weekday_table() {
        assert_eq!(restriction_for(date(2024, 7, 16)).plates, vec!["3", "4"]);
        assert_eq!(restriction_for(date(2024, 7, 17)).plates, vec!["5", "6"]);
        assert_eq!(restriction_for(date(2024, 7, 18)).plates, vec!["7", "8"]);
        assert_eq!(restriction_for(date(2024, 7, 19)).plates, vec!["9", "0"]);
    }

    #[test]
    fn test_weekend_is_not_applicable() {
        let saturday = restriction_for(date(2024, 7, 20));
        assert_eq!(saturday.day, "Saturday");
        assert_eq!(saturday.plates, vec![NOT_APPLICABLE]);

        let sunday = restriction_for(date(2024, 7, 21));
        assert_eq!(sunday.day, "Sunday");
        assert_eq!(sunday.plates, vec![NOT_APPLICABLE]);
    }

    #[test]
    fn test_current_restriction_uses_utc_minus_three() {
        // 02:00 UTC on Tuesday is still Monday 23:00 in São Paulo
        let now = Utc.with_ymd_and_hms(2024, 7, 16, 2, 0, 0).unwrap();
        assert_eq!(current_restriction(now).day, "Monday");

        // 03:00 UTC on Tuesday is Tuesday midnight in São Paulo
        let now = Utc.with_ymd_and_hms(2024, 7, 16, 3, 0, 0).unwrap();
        assert_eq!(current_restriction(now).day, "Tuesday");
    }
}

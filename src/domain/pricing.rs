//! Parking fee calculation.
//!
//! Bookings are billed per started hour at a flat rate: a 1.1 hour stay is
//! billed as two hours.

use chrono::{DateTime, TimeDelta, Utc};

/// Flat rate per started hour, in rupees.
pub const HOURLY_RATE: u32 = 50;

/// Longest stay a single booking or extension may ask for: thirty days.
pub const MAX_BOOKING_HOURS: f64 = 720.0;

/// Fee for a stay of `hours`; zero for empty, negative or non-finite input.
pub fn fee_for_hours(hours: f64) -> u32 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    (hours.ceil() as u32).saturating_mul(HOURLY_RATE)
}

/// Fee for the stay between `start` and `end`.
pub fn fee_for_window(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let seconds = (end - start).num_seconds();
    fee_for_hours(seconds as f64 / 3600.0)
}

/// Parses the duration field of the booking form.
///
/// Blank, unparsable, zero, negative and over-long inputs mean "no duration
/// chosen".
pub fn parse_duration_hours(raw: &str) -> Option<f64> {
    let hours: f64 = raw.trim().parse().ok()?;
    (hours.is_finite() && hours > 0.0 && hours <= MAX_BOOKING_HOURS).then_some(hours)
}

/// Length of a stay of `hours`, rounded to whole seconds and at least one.
pub fn duration_for_hours(hours: f64) -> Option<TimeDelta> {
    if !hours.is_finite() || hours > MAX_BOOKING_HOURS {
        return None;
    }
    let seconds = (hours * 3600.0).round().max(1.0) as i64;
    TimeDelta::try_seconds(seconds)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn fee_is_ceiling_hours_times_rate() {
        for (hours, expected) in [
            (0.0, 0),
            (0.25, 50),
            (1.0, 50),
            (1.1, 100),
            (2.0, 100),
            (2.5, 150),
            (24.0, 1200),
        ] {
            assert_eq!(fee_for_hours(hours), expected, "hours = {hours}");
            assert_eq!(
                fee_for_hours(hours),
                hours.ceil() as u32 * HOURLY_RATE,
                "hours = {hours}"
            );
        }
    }

    #[test]
    fn fee_ignores_invalid_durations() {
        assert_eq!(fee_for_hours(-1.0), 0);
        assert_eq!(fee_for_hours(f64::NAN), 0);
        assert_eq!(fee_for_hours(f64::INFINITY), 0);
    }

    #[test]
    fn blank_duration_shows_zero_fee() {
        assert_eq!(parse_duration_hours(""), None);
        assert_eq!(parse_duration_hours("   "), None);
        assert_eq!(parse_duration_hours("0"), None);
        assert_eq!(parse_duration_hours("abc"), None);
        assert_eq!(parse_duration_hours(" 1.1 ").map(fee_for_hours), Some(100));
    }

    #[test]
    fn oversized_durations_are_rejected() {
        assert_eq!(parse_duration_hours("1e10"), None);
        assert_eq!(parse_duration_hours("721"), None);
        assert_eq!(parse_duration_hours("720"), Some(MAX_BOOKING_HOURS));
        assert_eq!(duration_for_hours(1e10), None);
        assert_eq!(duration_for_hours(f64::INFINITY), None);
        assert_eq!(duration_for_hours(1.5), Some(TimeDelta::minutes(90)));
        assert_eq!(duration_for_hours(0.0), Some(TimeDelta::seconds(1)));
    }

    #[test]
    fn window_fee_bills_started_hours() {
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap();
        assert_eq!(fee_for_window(start, start + Duration::minutes(120)), 100);
        assert_eq!(fee_for_window(start, start + Duration::minutes(121)), 150);
        assert_eq!(fee_for_window(start, start), 0);
    }
}

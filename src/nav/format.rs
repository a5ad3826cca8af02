//! Display formatting for distances, drive times, and arrival estimates

use chrono::{DateTime, Local};

/// Assumed average speed for drive-time estimates, in km/h
const ESTIMATE_SPEED_KMH: f64 = 40.0;

/// Format a distance in meters for display.
///
/// Under 1000 m the value is shown in whole meters; from 1 km up it is shown
/// in kilometers with one decimal.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round() as u64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Estimate a drive time in minutes from a straight-line distance
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimate_duration_minutes(meters: f64) -> u64 {
    let minutes = (meters / 1000.0) / ESTIMATE_SPEED_KMH * 60.0;
    (minutes.ceil() as u64).max(1)
}

/// Format a minute count for display ("12 min", "1 h 05 min")
#[must_use]
pub fn format_duration(minutes: u64) -> String {
    if minutes < 60 {
        format!("{minutes} min")
    } else {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    }
}

/// Estimate battery usage for a trip as a percentage of capacity
#[must_use]
pub fn estimate_battery_usage(meters: f64, consumption_kwh_per_100km: f64, capacity_kwh: f64) -> f64 {
    if capacity_kwh <= 0.0 {
        return 0.0;
    }

    let kwh = meters / 1000.0 / 100.0 * consumption_kwh_per_100km;
    (kwh / capacity_kwh * 100.0).round()
}

/// Parse a human duration string ("12 min", "1 hour 5 mins") into minutes.
///
/// Returns `None` when no recognizable duration component is present. Used on
/// duration text reported by the directions service.
#[must_use]
pub fn parse_duration_minutes(text: &str) -> Option<u64> {
    let mut total: Option<u64> = None;
    let mut pending: Option<u64> = None;

    for token in text.split_whitespace() {
        if let Ok(value) = token.parse::<u64>() {
            pending = Some(value);
            continue;
        }

        let unit = token.trim_matches(|c: char| !c.is_ascii_alphabetic()).to_lowercase();
        if let Some(value) = pending.take() {
            let minutes = if unit.starts_with("hour") || unit == "h" || unit == "hr" || unit == "hrs" {
                value * 60
            } else if unit.starts_with("min") || unit == "m" {
                value
            } else {
                continue;
            };
            total = Some(total.unwrap_or(0) + minutes);
        }
    }

    total
}

/// Arrival clock time for a trip of `duration_seconds` starting at `now`
#[must_use]
pub fn arrival_time(now: DateTime<Local>, duration_seconds: i64) -> String {
    (now + chrono::Duration::seconds(duration_seconds))
        .format("%H:%M")
        .to_string()
}

/// Arrival clock time for a trip starting now
#[must_use]
pub fn arrival_display(duration_seconds: i64) -> String {
    arrival_time(Local::now(), duration_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_meters_under_one_km() {
        assert_eq!(format_distance(850.0), "850 m");
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(999.4), "999 m");
    }

    #[test]
    fn formats_kilometers_with_one_decimal() {
        assert_eq!(format_distance(1500.0), "1.5 km");
        assert_eq!(format_distance(999_999.0), "1000.0 km");
        assert_eq!(format_distance(1000.0), "1.0 km");
    }

    #[test]
    fn duration_estimate_never_below_one_minute() {
        assert_eq!(estimate_duration_minutes(10.0), 1);
        // 20 km at 40 km/h is half an hour
        assert_eq!(estimate_duration_minutes(20_000.0), 30);
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(12), "12 min");
        assert_eq!(format_duration(65), "1 h 05 min");
    }

    #[test]
    fn battery_estimate_scales_with_distance() {
        // 100 km at 15.5 kWh/100km on a 50 kWh pack is 31%
        let pct = estimate_battery_usage(100_000.0, 15.5, 50.0);
        assert!((pct - 31.0).abs() < f64::EPSILON);

        assert!(estimate_battery_usage(10_000.0, 15.5, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_simple_minutes() {
        assert_eq!(parse_duration_minutes("12 mins"), Some(12));
        assert_eq!(parse_duration_minutes("1 min"), Some(1));
    }

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(parse_duration_minutes("1 hour 5 mins"), Some(65));
        assert_eq!(parse_duration_minutes("2 hours"), Some(120));
    }

    #[test]
    fn rejects_text_without_duration() {
        assert_eq!(parse_duration_minutes("around the corner"), None);
        assert_eq!(parse_duration_minutes(""), None);
    }

    #[test]
    fn arrival_wraps_past_midnight() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 23, 50, 0).unwrap();
        assert_eq!(arrival_time(now, 20 * 60), "00:10");
    }

    #[test]
    fn arrival_simple_offset() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 14, 42, 0).unwrap();
        assert_eq!(arrival_time(now, 12 * 60), "14:54");
    }
}

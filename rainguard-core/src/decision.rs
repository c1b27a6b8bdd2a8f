use chrono::{DateTime, Duration, Utc};
use std::ops::RangeInclusive;

use crate::model::{Forecast, RainDecision};

/// Accumulated volume above which rain is considered significant.
pub const SIGNIFICANT_RAIN_MM: f64 = 2.0;

/// Provider condition codes for rain, drizzle, and thunderstorm classes.
pub const RAIN_CODES: RangeInclusive<u32> = 200..=599;

/// Reduce the forecast window ending at `now + hours_ahead` to a rain
/// decision.
///
/// A bucket inside the window counts as a rain period when it carries a
/// measured 3-hour volume, and again when its condition code is storm-class;
/// a single qualifying period is enough to flag rain even with no measured
/// volume at all. The bias towards false positives is intentional: a skipped
/// irrigation cycle is cheaper than watering ahead of a storm.
///
/// Pure function of its inputs; an absent forecast is handled by the caller
/// (a failed fetch means "assume no rain").
pub fn analyze(forecast: &Forecast, now: DateTime<Utc>, hours_ahead: u32) -> RainDecision {
    let cutoff = now + Duration::hours(i64::from(hours_ahead));

    let mut total_rain = 0.0;
    let mut rain_periods: u32 = 0;

    for point in &forecast.points {
        if point.timestamp > cutoff {
            continue;
        }

        if let Some(volume) = point.rain_3h_mm {
            total_rain += volume;
            rain_periods += 1;
        }

        if RAIN_CODES.contains(&point.condition_code) {
            rain_periods += 1;
        }
    }

    RainDecision {
        will_rain: total_rain > SIGNIFICANT_RAIN_MM || rain_periods > 0,
        amount_mm: total_rain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForecastPoint;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn point(hours_from_now: i64, rain_3h_mm: Option<f64>, condition_code: u32) -> ForecastPoint {
        ForecastPoint {
            timestamp: now() + Duration::hours(hours_from_now),
            rain_3h_mm,
            condition_code,
        }
    }

    #[test]
    fn empty_window_means_no_rain() {
        let decision = analyze(&Forecast::default(), now(), 6);
        assert_eq!(decision, RainDecision::NO_RAIN);

        // Points exist but all fall past the cutoff.
        let forecast = Forecast::new(vec![point(9, Some(8.0), 502), point(12, Some(3.0), 500)]);
        let decision = analyze(&forecast, now(), 6);
        assert_eq!(decision, RainDecision::NO_RAIN);
    }

    #[test]
    fn volume_above_threshold_flags_rain() {
        let forecast = Forecast::new(vec![point(3, Some(3.0), 801)]);
        let decision = analyze(&forecast, now(), 6);
        assert!(decision.will_rain);
        assert_eq!(decision.amount_mm, 3.0);
    }

    #[test]
    fn storm_code_without_volume_flags_rain() {
        let forecast = Forecast::new(vec![point(3, None, 500)]);
        let decision = analyze(&forecast, now(), 6);
        assert!(decision.will_rain);
        assert_eq!(decision.amount_mm, 0.0);
    }

    #[test]
    fn clear_sky_means_no_rain() {
        let forecast = Forecast::new(vec![
            point(0, None, 800),
            point(3, None, 800),
            point(6, None, 800),
        ]);
        let decision = analyze(&forecast, now(), 6);
        assert_eq!(decision, RainDecision::NO_RAIN);
    }

    #[test]
    fn code_range_boundaries() {
        // 199 and 600 sit just outside the precipitation classes.
        for (code, expect_rain) in [(199, false), (200, true), (599, true), (600, false)] {
            let forecast = Forecast::new(vec![point(1, None, code)]);
            let decision = analyze(&forecast, now(), 6);
            assert_eq!(decision.will_rain, expect_rain, "code {code}");
        }
    }

    #[test]
    fn small_measured_volume_still_flags_rain() {
        // 1.0 mm is under the significance threshold, but the measured bucket
        // itself counts as a rain period.
        let forecast = Forecast::new(vec![point(3, Some(1.0), 800)]);
        let decision = analyze(&forecast, now(), 6);
        assert!(decision.will_rain);
        assert_eq!(decision.amount_mm, 1.0);
    }

    #[test]
    fn volumes_accumulate_within_window_only() {
        let forecast = Forecast::new(vec![
            point(0, Some(1.5), 500),
            point(3, Some(2.5), 501),
            point(6, Some(0.5), 500),
            point(9, Some(10.0), 502),
        ]);
        let decision = analyze(&forecast, now(), 6);
        assert!(decision.will_rain);
        assert_eq!(decision.amount_mm, 4.5);
    }

    #[test]
    fn point_on_cutoff_is_included() {
        let forecast = Forecast::new(vec![point(6, Some(2.5), 500)]);
        let decision = analyze(&forecast, now(), 6);
        assert!(decision.will_rain);
        assert_eq!(decision.amount_mm, 2.5);
    }

    #[test]
    fn analyze_is_idempotent() {
        let forecast = Forecast::new(vec![
            point(1, Some(0.4), 500),
            point(4, None, 211),
            point(7, Some(6.0), 502),
        ]);

        let first = analyze(&forecast, now(), 6);
        let second = analyze(&forecast, now(), 6);
        assert_eq!(first, second);
    }

    #[test]
    fn wider_window_captures_later_points() {
        let forecast = Forecast::new(vec![point(9, Some(8.0), 502)]);

        assert!(!analyze(&forecast, now(), 6).will_rain);

        let wide = analyze(&forecast, now(), 12);
        assert!(wide.will_rain);
        assert_eq!(wide.amount_mm, 8.0);
    }
}

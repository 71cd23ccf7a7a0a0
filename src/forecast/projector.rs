//! Shapes the engine's full prediction sequence into the wire records the
//! handler returns: future-only window, ISO dates, two-decimal rounding.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ForecastPoint;
use crate::errors::ServiceError;

/// One serialized forecast entry as returned to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// ISO calendar date, `YYYY-MM-DD`
    pub date: String,
    pub expected: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Projects the in-sample + future prediction sequence onto the future-only
/// window, preserving order.
///
/// Guarantees exactly `horizon_days` records in strictly increasing date
/// order, each dated after `last_historical_date`; anything else is a
/// `ForecastShapeMismatch`.
pub fn project_future(
    points: &[ForecastPoint],
    last_historical_date: NaiveDate,
    horizon_days: u32,
) -> Result<Vec<ForecastRecord>, ServiceError> {
    let future: Vec<&ForecastPoint> = points
        .iter()
        .filter(|p| p.date > last_historical_date)
        .collect();

    if future.len() != horizon_days as usize {
        return Err(ServiceError::ForecastShapeMismatch(format!(
            "expected {} future points, engine produced {}",
            horizon_days,
            future.len()
        )));
    }

    for pair in future.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(ServiceError::ForecastShapeMismatch(format!(
                "future dates not strictly increasing ({} then {})",
                pair[0].date, pair[1].date
            )));
        }
    }

    Ok(future
        .into_iter()
        .map(|p| ForecastRecord {
            date: p.date.format("%Y-%m-%d").to_string(),
            expected: round2(p.expected),
            lower_bound: round2(p.lower_bound),
            upper_bound: round2(p.upper_bound),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn points(start: &str, count: i64) -> Vec<ForecastPoint> {
        let start = date(start);
        (0..count)
            .map(|i| ForecastPoint {
                date: start + Duration::days(i),
                expected: 10.0 + i as f64 * 0.333,
                lower_bound: 8.0 + i as f64 * 0.333,
                upper_bound: 12.0 + i as f64 * 0.333,
            })
            .collect()
    }

    #[test]
    fn keeps_only_points_after_last_historical_date() {
        // 5 in-sample days then 30 future days
        let all = points("2024-01-06", 35);
        let records = project_future(&all, date("2024-01-10"), 30).unwrap();

        assert_eq!(records.len(), 30);
        assert_eq!(records.first().unwrap().date, "2024-01-11");
        assert_eq!(records.last().unwrap().date, "2024-02-09");
    }

    #[test]
    fn output_dates_strictly_increase() {
        let all = points("2024-01-01", 40);
        let records = project_future(&all, date("2024-01-10"), 30).unwrap();
        for pair in records.windows(2) {
            assert!(pair[1].date > pair[0].date);
        }
    }

    #[test]
    fn short_future_window_is_a_shape_mismatch() {
        let all = points("2024-01-01", 20);
        let err = project_future(&all, date("2024-01-10"), 30).unwrap_err();
        assert_matches!(err, ServiceError::ForecastShapeMismatch(_));
    }

    #[test]
    fn surplus_future_points_are_a_shape_mismatch() {
        let all = points("2024-01-01", 60);
        let err = project_future(&all, date("2024-01-10"), 30).unwrap_err();
        assert_matches!(err, ServiceError::ForecastShapeMismatch(_));
    }

    #[test]
    fn values_round_to_two_decimals() {
        let all = vec![ForecastPoint {
            date: date("2024-01-11"),
            expected: 10.3333,
            lower_bound: -8.004,
            upper_bound: 12.9999,
        }];
        let records = project_future(&all, date("2024-01-10"), 1).unwrap();
        assert_eq!(records[0].expected, 10.33);
        assert_eq!(records[0].lower_bound, -8.0);
        assert_eq!(records[0].upper_bound, 13.0);
    }

    #[test]
    fn projection_is_idempotent_for_the_same_input() {
        let all = points("2024-01-01", 40);
        let a = project_future(&all, date("2024-01-10"), 30).unwrap();
        let b = project_future(&all, date("2024-01-10"), 30).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}

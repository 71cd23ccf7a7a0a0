//! Additive decomposition engine: linear trend plus weekly seasonal effects,
//! fitted by ordinary least squares on the observed daily aggregates.
//!
//! The fit is closed-form and deterministic. Uncertainty bounds come from the
//! residual standard deviation at a 95% level, widened with forecast
//! distance. Irregular daily coverage is tolerated: absent days simply
//! contribute no observation.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use super::{ForecastPoint, HistorySeries};
use crate::errors::ServiceError;

/// z-score for a 95% interval.
const Z_95: f64 = 1.96;

/// Trend + weekly-seasonality model trained on one request's history.
///
/// Owned exclusively by the request that fitted it; never cached or shared.
#[derive(Debug, Clone)]
pub struct TrainedDecomposition {
    first_date: NaiveDate,
    last_date: NaiveDate,
    observed_dates: Vec<NaiveDate>,
    intercept: f64,
    slope: f64,
    weekday_effects: [f64; 7],
    residual_std: f64,
    n_obs: usize,
}

impl TrainedDecomposition {
    pub fn last_historical_date(&self) -> NaiveDate {
        self.last_date
    }

    fn point_at(&self, date: NaiveDate, interval_scale: f64) -> ForecastPoint {
        let x = (date - self.first_date).num_days() as f64;
        let weekday = date.weekday().num_days_from_monday() as usize;
        let expected = self.intercept + self.slope * x + self.weekday_effects[weekday];
        let width = Z_95 * self.residual_std * interval_scale;
        ForecastPoint {
            date,
            expected,
            lower_bound: expected - width,
            upper_bound: expected + width,
        }
    }
}

/// Fits the additive decomposition to a gated history series.
///
/// Preconditions: the series passed the sufficiency gate, so it holds at
/// least two distinct (strictly increasing) dates.
pub fn fit(history: &HistorySeries) -> Result<TrainedDecomposition, ServiceError> {
    let entries = history.entries();
    let n = entries.len();
    let (first_date, last_date) = match (history.first_date(), history.last_date()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(ServiceError::ModelFitFailed(
                "empty history series".to_string(),
            ))
        }
    };

    let xs: Vec<f64> = entries
        .iter()
        .map(|e| (e.date - first_date).num_days() as f64)
        .collect();
    let ys: Vec<f64> = entries.iter().map(|e| e.total_quantity).collect();

    // Ordinary least squares for the linear trend.
    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = ys.iter().sum::<f64>() / n as f64;
    let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
    let sxy: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();

    if sxx <= f64::EPSILON {
        return Err(ServiceError::ModelFitFailed(
            "degenerate design matrix: no date spread in history".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    // Weekly seasonal component: mean trend residual per weekday, centered
    // across observations so the trend stays unbiased.
    let trend_residuals: Vec<f64> = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| y - (intercept + slope * x))
        .collect();

    let mut weekday_sums = [0.0f64; 7];
    let mut weekday_counts = [0usize; 7];
    for (entry, residual) in entries.iter().zip(&trend_residuals) {
        let w = entry.date.weekday().num_days_from_monday() as usize;
        weekday_sums[w] += residual;
        weekday_counts[w] += 1;
    }

    let mut weekday_effects = [0.0f64; 7];
    for w in 0..7 {
        if weekday_counts[w] > 0 {
            weekday_effects[w] = weekday_sums[w] / weekday_counts[w] as f64;
        }
    }

    let effect_mean = entries
        .iter()
        .map(|e| weekday_effects[e.date.weekday().num_days_from_monday() as usize])
        .sum::<f64>()
        / n as f64;
    for effect in weekday_effects.iter_mut() {
        *effect -= effect_mean;
    }
    let intercept = intercept + effect_mean;

    // Residual spread after removing trend and seasonality.
    let sq_err: f64 = entries
        .iter()
        .zip(&xs)
        .zip(&ys)
        .map(|((entry, x), y)| {
            let w = entry.date.weekday().num_days_from_monday() as usize;
            let fitted = intercept + slope * x + weekday_effects[w];
            (y - fitted).powi(2)
        })
        .sum();
    let residual_std = (sq_err / n as f64).sqrt();

    let finite = slope.is_finite()
        && intercept.is_finite()
        && residual_std.is_finite()
        && weekday_effects.iter().all(|e| e.is_finite());
    if !finite {
        return Err(ServiceError::ModelFitFailed(
            "non-finite parameter estimate".to_string(),
        ));
    }

    debug!(
        observations = n,
        slope, intercept, residual_std, "decomposition model fitted"
    );

    Ok(TrainedDecomposition {
        first_date,
        last_date,
        observed_dates: entries.iter().map(|e| e.date).collect(),
        intercept,
        slope,
        weekday_effects,
        residual_std,
        n_obs: n,
    })
}

/// Extends the fitted model over the historical window plus `horizon_days`
/// future calendar days.
///
/// In-sample points (one per observed date) come first so the caller can
/// locate the past/future boundary; they are never returned to API clients.
pub fn predict(model: &TrainedDecomposition, horizon_days: u32) -> Vec<ForecastPoint> {
    let mut points = Vec::with_capacity(model.observed_dates.len() + horizon_days as usize);

    for &date in &model.observed_dates {
        points.push(model.point_at(date, 1.0));
    }

    for step in 1..=i64::from(horizon_days) {
        let date = model.last_date + Duration::days(step);
        // Intervals widen with distance from the training window.
        let scale = (1.0 + step as f64 / model.n_obs as f64).sqrt();
        points.push(model.point_at(date, scale));
    }

    points
}

/// Convenience composition of [`fit`] and [`predict`].
pub fn fit_and_predict(
    history: &HistorySeries,
    horizon_days: u32,
) -> Result<Vec<ForecastPoint>, ServiceError> {
    let model = fit(history)?;
    Ok(predict(&model, horizon_days))
}

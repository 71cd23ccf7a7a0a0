/*!
 * # Forecast Module
 *
 * Domain core of the service: history series types, the minimum-data
 * sufficiency gate, the trend/seasonality decomposition engine, and the
 * response projector that shapes engine output for the wire.
 *
 * Everything here is request-scoped. A series is aggregated fresh per
 * request, the trained model lives only for that request, and nothing is
 * cached across requests.
 */

pub mod engine;
pub mod projector;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// One day's total summed quantity for a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub total_quantity: f64,
}

/// Ordered daily sales history for one product.
///
/// Invariant: dates strictly increasing, one entry per distinct sale date.
/// Days with no recorded sales are absent, not zero-valued rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySeries {
    entries: Vec<DailyAggregate>,
}

impl HistorySeries {
    /// Builds a series from rows already ordered ascending by date.
    ///
    /// The aggregation query groups by date, so duplicates cannot occur; a
    /// violation here means the query contract was broken upstream.
    pub fn from_ordered_rows(entries: Vec<DailyAggregate>) -> Result<Self, ServiceError> {
        for pair in entries.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ServiceError::Unexpected(anyhow::anyhow!(
                    "history rows not strictly increasing by date ({} then {})",
                    pair[0].date,
                    pair[1].date
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[DailyAggregate] {
        &self.entries
    }

    /// Number of distinct sale-days in the series.
    pub fn distinct_days(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|e| e.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }
}

/// A single prediction produced by the engine.
///
/// Invariant: `lower_bound <= expected <= upper_bound`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub expected: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Admit or reject a series before any fitting is attempted.
///
/// The decomposition model needs enough observations to estimate trend and
/// seasonal components; fewer points produce unstable or degenerate fits.
pub fn check_sufficiency(history: &HistorySeries, min_days: usize) -> Result<(), ServiceError> {
    if history.distinct_days() < min_days {
        return Err(ServiceError::InsufficientHistory(min_days));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn series_from(start: NaiveDate, values: &[f64]) -> HistorySeries {
    let entries = values
        .iter()
        .enumerate()
        .map(|(i, &v)| DailyAggregate {
            date: start + chrono::Duration::days(i as i64),
            total_quantity: v,
        })
        .collect();
    HistorySeries::from_ordered_rows(entries).unwrap()
}

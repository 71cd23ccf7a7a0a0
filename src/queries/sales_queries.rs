use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
    entities::sale::{Column as SaleColumn, Entity as Sale},
    errors::ServiceError,
    forecast::{DailyAggregate, HistorySeries},
};

#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

/// Aggregates one product's sales by calendar day: `SUM(quantity)` grouped by
/// `sale_date`, ordered ascending.
///
/// Days with no recorded sales produce no row; absence means no observation,
/// not a zero-value one. Zero rows is a successful, empty result.
#[derive(Debug, Serialize, Deserialize)]
pub struct DailySalesHistoryQuery {
    pub product_id: String,
}

#[async_trait]
impl Query for DailySalesHistoryQuery {
    type Result = HistorySeries;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let rows: Vec<(NaiveDate, Option<i64>)> = Sale::find()
            .select_only()
            .column(SaleColumn::SaleDate)
            .column_as(SaleColumn::Quantity.sum(), "total_quantity")
            .filter(SaleColumn::ProductId.eq(&self.product_id))
            .group_by(SaleColumn::SaleDate)
            .order_by_asc(SaleColumn::SaleDate)
            .into_tuple()
            .all(db)
            .await
            .map_err(|e| {
                error!(product_id = %self.product_id, error = %e, "daily sales aggregation failed");
                ServiceError::DataSourceUnavailable
            })?;

        debug!(
            product_id = %self.product_id,
            rows = rows.len(),
            "fetched daily sales history"
        );

        let entries = rows
            .into_iter()
            .map(|(date, total)| DailyAggregate {
                date,
                total_quantity: total.unwrap_or(0) as f64,
            })
            .collect();

        HistorySeries::from_ordered_rows(entries)
    }
}

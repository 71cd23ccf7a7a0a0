use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::forecast::HistorySeries;
use crate::queries::{DailySalesHistoryQuery, Query};

/// Configuration for historical data store access
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL; `None` when unconfigured
    pub url: Option<String>,
    /// Connection timeout duration
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            ..Default::default()
        }
    }
}

/// Read access to the historical data store.
///
/// The handler receives this as a passed-in dependency rather than reading
/// global state; tests substitute their own implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SalesStore: Send + Sync {
    /// Fetches one product's sales history aggregated by calendar day,
    /// ordered ascending by date.
    async fn fetch_daily_history(&self, product_id: &str) -> Result<HistorySeries, ServiceError>;
}

/// sea-orm backed store. Each call acquires one fresh connection, runs the
/// aggregation query, and closes the connection on every exit path. No
/// connection survives a request and nothing is shared across requests;
/// pooling is left to the data store's side of the wire.
#[derive(Debug, Clone)]
pub struct SeaOrmSalesStore {
    config: DbConfig,
}

impl SeaOrmSalesStore {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    async fn acquire(&self) -> Result<DatabaseConnection, ServiceError> {
        let url = match self.config.url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => {
                error!("data store URL not configured; cannot serve forecast request");
                return Err(ServiceError::DataSourceUnavailable);
            }
        };

        let mut options = ConnectOptions::new(url.to_owned());
        options
            .max_connections(1)
            .connect_timeout(self.config.connect_timeout)
            .sqlx_logging(false);

        Database::connect(options).await.map_err(|e| {
            error!(error = %e, "failed to connect to historical data store");
            ServiceError::DataSourceUnavailable
        })
    }

    async fn release(db: DatabaseConnection) {
        if let Err(e) = db.close().await {
            warn!(error = %e, "failed to close data store connection cleanly");
        } else {
            debug!("data store connection released");
        }
    }
}

#[async_trait]
impl SalesStore for SeaOrmSalesStore {
    async fn fetch_daily_history(&self, product_id: &str) -> Result<HistorySeries, ServiceError> {
        let db = self.acquire().await?;

        let query = DailySalesHistoryQuery {
            product_id: product_id.to_owned(),
        };
        let result = query.execute(&db).await;

        // Released before the result propagates, success or failure.
        Self::release(db).await;

        result
    }
}

/// Establishes a startup-scoped connection, used only for running migrations.
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, ServiceError> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .sqlx_logging(true);

    let db = Database::connect(options).await?;
    info!("database connection established");
    Ok(db)
}

/// Runs database migrations
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), ServiceError> {
    use sea_orm_migration::MigratorTrait;

    info!("Running database migrations");
    migrations::Migrator::up(db, None)
        .await
        .map_err(ServiceError::DatabaseError)?;
    info!("Database migrations completed successfully");
    Ok(())
}

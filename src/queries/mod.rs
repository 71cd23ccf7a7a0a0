pub mod sales_queries;

pub use sales_queries::{DailySalesHistoryQuery, Query};

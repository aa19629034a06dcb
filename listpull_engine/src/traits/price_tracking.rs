use chrono::{DateTime, NaiveDate, Utc};
use tcg_pricing::ingestion::CardRecords;
use thiserror::Error;

use crate::db_types::{
    CurrentPrice,
    NewPriceAlert,
    PriceAlert,
    PriceHistoryEntry,
    Product,
    WatchedAlert,
    WatchlistItem,
};

#[derive(Debug, Clone, Error)]
pub enum PriceStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} is not being tracked")]
    ProductNotFound(i64),
    #[error("Watch list item {0} does not exist")]
    WatchlistItemNotFound(i64),
    #[error("Price alert {0} does not exist")]
    AlertNotFound(i64),
    #[error("Cannot store price. {0}")]
    InvalidPrice(String),
}

impl From<sqlx::Error> for PriceStoreError {
    fn from(e: sqlx::Error) -> Self {
        PriceStoreError::DatabaseError(e.to_string())
    }
}

/// Storage behaviour for the market price tracker: products and their prices, the watch list, and price alerts.
#[allow(async_fn_in_trait)]
pub trait PriceTracking {
    /// Stores a card's category, product, SKUs and current prices, and records today's price history, all in one
    /// transaction.
    ///
    /// Product fields that are missing from `records` keep their stored value. A second ingest on the same `date`
    /// overwrites that day's history instead of adding to it.
    async fn store_card(&self, records: &CardRecords, date: NaiveDate, now: DateTime<Utc>)
        -> Result<(), PriceStoreError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, PriceStoreError>;

    /// The ids of every tracked product, in ascending order.
    async fn fetch_product_ids(&self) -> Result<Vec<i64>, PriceStoreError>;

    async fn fetch_current_price(&self, product_id: i64, variant: &str)
        -> Result<Option<CurrentPrice>, PriceStoreError>;

    /// History for one variant, newest first.
    async fn fetch_price_history(&self, product_id: i64, variant: &str)
        -> Result<Vec<PriceHistoryEntry>, PriceStoreError>;

    /// Adds the variant to the watch list. If it is already actively watched, the existing item is returned instead.
    async fn add_watchlist_item(
        &self,
        product_id: i64,
        variant: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WatchlistItem, PriceStoreError>;

    /// Clears the item's `active` flag.
    async fn deactivate_watchlist_item(&self, id: i64) -> Result<(), PriceStoreError>;

    async fn fetch_watchlist_item(&self, id: i64) -> Result<Option<WatchlistItem>, PriceStoreError>;

    /// Active watch list items, in id order.
    async fn fetch_watchlist(&self) -> Result<Vec<WatchlistItem>, PriceStoreError>;

    async fn insert_price_alert(&self, alert: NewPriceAlert) -> Result<PriceAlert, PriceStoreError>;

    /// Alerts on active watch list items that have not fired yet, in id order.
    async fn fetch_armed_alerts(&self) -> Result<Vec<WatchedAlert>, PriceStoreError>;

    /// Stamps `triggered_at` on the alert, but only if it has not fired before. Returns false if another run got there
    /// first.
    async fn mark_alert_triggered(&self, alert_id: i64, now: DateTime<Utc>) -> Result<bool, PriceStoreError>;

    /// Alerts that have fired, most recent first.
    async fn fetch_triggered_alerts(&self) -> Result<Vec<WatchedAlert>, PriceStoreError>;

    async fn acknowledge_alert(&self, alert_id: i64) -> Result<(), PriceStoreError>;
}

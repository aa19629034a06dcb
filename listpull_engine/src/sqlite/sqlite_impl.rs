//! `SqliteDatabase` is the concrete ListPull storage backend.
//!
//! It implements every trait in [`crate::traits`] on top of a `sqlx` connection pool.
use std::{fmt::Debug, path::Path};

use chrono::{DateTime, NaiveDate, Utc};
use log::*;
use rust_decimal::Decimal;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tcg_pricing::ingestion::{CardRecords, PriceRecord};

use super::db::{db_url, email_queue, new_pool, orders, prices, prices::PriceRow, staff};
use crate::{
    db_types::{
        AuditActor,
        AuditEntry,
        Cents,
        CurrentPrice,
        EmailJob,
        EmailStatus,
        NewEmailJob,
        NewOrder,
        NewPriceAlert,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatusType,
        PriceAlert,
        PriceHistoryEntry,
        Product,
        StaffRole,
        StaffUser,
        WatchedAlert,
        WatchlistItem,
    },
    traits::{
        EmailQueueError,
        EmailQueueManagement,
        OrderManagement,
        OrderStoreError,
        PriceStoreError,
        PriceTracking,
        StaffManagement,
        StaffStoreError,
        StatusCounts,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(
        &self,
        order_number: &OrderNumber,
        order: &NewOrder,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let new_order = orders::insert_order(order_number, order, now, &mut tx).await?;
        orders::insert_order_items(new_order.id, &order.items, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] inserted with id {}", new_order.order_number, new_order.id);
        Ok(new_order)
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        old_status: OrderStatusType,
        new_status: OrderStatusType,
        actor: &AuditActor,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::update_status(order_id, old_status, new_status, now, &mut tx).await? {
            Some(order) => order,
            None => {
                // Work out which error to report before the transaction rolls back
                return match orders::fetch_order_by_id(order_id, &mut tx).await? {
                    Some(_) => Err(OrderStoreError::StatusChanged { order_id, expected: old_status }),
                    None => Err(OrderStoreError::OrderNotFound(order_id)),
                };
            },
        };
        orders::insert_audit_entry(order_id, actor, old_status, new_status, now, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_audit_log(&self, order_id: i64) -> Result<Vec<AuditEntry>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let entries = orders::fetch_audit_log(order_id, &mut conn).await?;
        Ok(entries)
    }

    async fn count_orders_by_status(&self) -> Result<StatusCounts, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let counts = orders::count_by_status(&mut conn).await?;
        Ok(counts)
    }

    async fn fetch_stale_submitted(
        &self,
        cutoff: DateTime<Utc>,
        unalerted_only: bool,
    ) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_stale_submitted(cutoff, unalerted_only, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_stale_ready(
        &self,
        cutoff: DateTime<Utc>,
        unalerted_only: bool,
    ) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_stale_ready(cutoff, unalerted_only, &mut conn).await?;
        Ok(orders)
    }

    async fn mark_stale_alert_sent(&self, order_id: i64) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        if orders::set_stale_alert_sent(order_id, &mut conn).await? {
            Ok(())
        } else {
            Err(OrderStoreError::OrderNotFound(order_id))
        }
    }

    async fn mark_pickup_alert_sent(&self, order_id: i64) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        if orders::set_pickup_alert_sent(order_id, &mut conn).await? {
            Ok(())
        } else {
            Err(OrderStoreError::OrderNotFound(order_id))
        }
    }
}

impl EmailQueueManagement for SqliteDatabase {
    async fn enqueue_email(&self, job: NewEmailJob) -> Result<EmailJob, EmailQueueError> {
        let mut conn = self.pool.acquire().await?;
        let job = email_queue::insert_job(job, &mut conn).await?;
        Ok(job)
    }

    async fn fetch_email_job(&self, id: i64) -> Result<Option<EmailJob>, EmailQueueError> {
        let mut conn = self.pool.acquire().await?;
        let job = email_queue::fetch_job(id, &mut conn).await?;
        Ok(job)
    }

    async fn fetch_pending_emails(&self) -> Result<Vec<EmailJob>, EmailQueueError> {
        self.fetch_emails(Some(EmailStatus::Pending)).await
    }

    async fn fetch_emails(&self, status: Option<EmailStatus>) -> Result<Vec<EmailJob>, EmailQueueError> {
        let mut conn = self.pool.acquire().await?;
        let jobs = email_queue::fetch_jobs(status, &mut conn).await?;
        Ok(jobs)
    }

    async fn mark_email_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<EmailJob, EmailQueueError> {
        let mut conn = self.pool.acquire().await?;
        email_queue::mark_sent(id, sent_at, &mut conn).await?.ok_or(EmailQueueError::JobNotFound(id))
    }

    async fn record_email_failure(
        &self,
        id: i64,
        error: &str,
        max_attempts: i64,
    ) -> Result<EmailJob, EmailQueueError> {
        let mut conn = self.pool.acquire().await?;
        email_queue::record_failure(id, error, max_attempts, &mut conn).await?.ok_or(EmailQueueError::JobNotFound(id))
    }

    async fn delete_finished_emails_before(&self, cutoff: DateTime<Utc>) -> Result<u64, EmailQueueError> {
        let mut conn = self.pool.acquire().await?;
        let count = email_queue::delete_finished_before(cutoff, &mut conn).await?;
        Ok(count)
    }
}

impl StaffManagement for SqliteDatabase {
    async fn fetch_staff_user(&self, id: i64) -> Result<Option<StaffUser>, StaffStoreError> {
        let mut conn = self.pool.acquire().await?;
        let user = staff::fetch_staff_user(id, &mut conn).await?;
        Ok(user)
    }

    async fn create_staff_user(
        &self,
        email: &str,
        password_hash: &str,
        role: StaffRole,
        now: DateTime<Utc>,
    ) -> Result<StaffUser, StaffStoreError> {
        let mut conn = self.pool.acquire().await?;
        staff::insert_staff_user(email, password_hash, role, now, &mut conn).await
    }
}

fn to_cents(price: Option<Decimal>) -> Result<Option<Cents>, PriceStoreError> {
    price.map(Cents::from_decimal).transpose().map_err(|e| PriceStoreError::InvalidPrice(e.to_string()))
}

fn price_row(price: &PriceRecord) -> Result<PriceRow, PriceStoreError> {
    Ok(PriceRow {
        product_id: price.product_id,
        variant: price.variant.clone(),
        market_price: to_cents(price.market_price)?,
        low_price: to_cents(price.low_price)?,
        mid_price: to_cents(price.mid_price)?,
        source: price.source.clone(),
    })
}

impl PriceTracking for SqliteDatabase {
    async fn store_card(
        &self,
        records: &CardRecords,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(), PriceStoreError> {
        let rows = records.prices.iter().map(price_row).collect::<Result<Vec<_>, _>>()?;
        let mut tx = self.pool.begin().await?;
        prices::upsert_category(&records.category, &mut tx).await?;
        prices::upsert_product(&records.product, &mut tx).await?;
        for sku in &records.skus {
            prices::upsert_sku(sku, &mut tx).await?;
        }
        for row in &rows {
            prices::upsert_current_price(row, now, &mut tx).await?;
            prices::record_price_history(row, date, now, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Stored {} ({}) with {} prices", records.product.name, records.product.product_id, rows.len());
        Ok(())
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        let product = prices::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_product_ids(&self) -> Result<Vec<i64>, PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        let ids = prices::fetch_product_ids(&mut conn).await?;
        Ok(ids)
    }

    async fn fetch_current_price(
        &self,
        product_id: i64,
        variant: &str,
    ) -> Result<Option<CurrentPrice>, PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        let price = prices::fetch_current_price(product_id, variant, &mut conn).await?;
        Ok(price)
    }

    async fn fetch_price_history(
        &self,
        product_id: i64,
        variant: &str,
    ) -> Result<Vec<PriceHistoryEntry>, PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        let history = prices::fetch_price_history(product_id, variant, &mut conn).await?;
        Ok(history)
    }

    async fn add_watchlist_item(
        &self,
        product_id: i64,
        variant: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WatchlistItem, PriceStoreError> {
        let mut tx = self.pool.begin().await?;
        if prices::fetch_product(product_id, &mut tx).await?.is_none() {
            return Err(PriceStoreError::ProductNotFound(product_id));
        }
        if let Some(item) = prices::fetch_active_watchlist_item(product_id, variant, &mut tx).await? {
            trace!("🗃️ {product_id} ({variant}) is already on the watch list as item {}", item.id);
            return Ok(item);
        }
        let item = prices::insert_watchlist_item(product_id, variant, notes, now, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn deactivate_watchlist_item(&self, id: i64) -> Result<(), PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        if prices::deactivate_watchlist_item(id, &mut conn).await? {
            Ok(())
        } else {
            Err(PriceStoreError::WatchlistItemNotFound(id))
        }
    }

    async fn fetch_watchlist_item(&self, id: i64) -> Result<Option<WatchlistItem>, PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        let item = prices::fetch_watchlist_item(id, &mut conn).await?;
        Ok(item)
    }

    async fn fetch_watchlist(&self) -> Result<Vec<WatchlistItem>, PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = prices::fetch_active_watchlist(&mut conn).await?;
        Ok(items)
    }

    async fn insert_price_alert(&self, alert: NewPriceAlert) -> Result<PriceAlert, PriceStoreError> {
        let mut tx = self.pool.begin().await?;
        let watchlist_id = alert.watchlist_id;
        if prices::fetch_watchlist_item(watchlist_id, &mut tx).await?.is_none() {
            return Err(PriceStoreError::WatchlistItemNotFound(watchlist_id));
        }
        let alert = prices::insert_price_alert(alert, &mut tx).await?;
        tx.commit().await?;
        Ok(alert)
    }

    async fn fetch_armed_alerts(&self) -> Result<Vec<WatchedAlert>, PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        let alerts = prices::fetch_armed_alerts(&mut conn).await?;
        Ok(alerts)
    }

    async fn mark_alert_triggered(&self, alert_id: i64, now: DateTime<Utc>) -> Result<bool, PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        let fired = prices::set_alert_triggered(alert_id, now, &mut conn).await?;
        Ok(fired)
    }

    async fn fetch_triggered_alerts(&self) -> Result<Vec<WatchedAlert>, PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        let alerts = prices::fetch_triggered_alerts(&mut conn).await?;
        Ok(alerts)
    }

    async fn acknowledge_alert(&self, alert_id: i64) -> Result<(), PriceStoreError> {
        let mut conn = self.pool.acquire().await?;
        if prices::set_alert_acknowledged(alert_id, &mut conn).await? {
            Ok(())
        } else {
            Err(PriceStoreError::AlertNotFound(alert_id))
        }
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `LP_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Creates the database file if it is missing, opens a pool on it and brings the schema up to date.
    pub async fn open_and_migrate(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        if !Sqlite::database_exists(url).await? {
            info!("🗃️ Creating new database at {url}");
            if let Some(dir) = database_dir(url) {
                std::fs::create_dir_all(dir).map_err(sqlx::Error::Io)?;
            }
            Sqlite::create_database(url).await?;
        }
        let db = Self::new_with_url(url, max_connections).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Runs any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// The directory holding the database file, if the URL names a file in a subdirectory.
fn database_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")).unwrap_or(url);
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn database_directories() {
        assert_eq!(database_dir("sqlite://data/listpull.db"), Some(Path::new("data")));
        assert_eq!(database_dir("sqlite:/tmp/lp/x.db?mode=rwc"), Some(Path::new("/tmp/lp")));
        assert_eq!(database_dir("sqlite://listpull.db"), None);
        assert_eq!(database_dir("sqlite::memory:"), None);
    }
}

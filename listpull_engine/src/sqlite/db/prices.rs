use chrono::{DateTime, NaiveDate, Utc};
use log::trace;
use sqlx::SqliteConnection;
use tcg_pricing::ingestion::{GameCategory, ProductRecord, SkuRecord};

use crate::db_types::{
    Cents,
    CurrentPrice,
    NewPriceAlert,
    PriceAlert,
    PriceHistoryEntry,
    Product,
    WatchedAlert,
    WatchlistItem,
};

/// A [`tcg_pricing::ingestion::PriceRecord`] with its prices converted to cents.
#[derive(Debug, Clone)]
pub struct PriceRow {
    pub product_id: i64,
    pub variant: String,
    pub market_price: Option<Cents>,
    pub low_price: Option<Cents>,
    pub mid_price: Option<Cents>,
    pub source: String,
}

pub async fn upsert_category(category: &GameCategory, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO categories (category_id, name, display_name) VALUES ($1, $2, $3)
            ON CONFLICT (category_id) DO NOTHING;
        "#,
    )
    .bind(category.category_id)
    .bind(category.name)
    .bind(category.display_name)
    .execute(conn)
    .await?;
    Ok(())
}

/// Optional fields only overwrite stored values when they are present.
pub async fn upsert_product(product: &ProductRecord, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO products (product_id, category_id, name, clean_name, image_url, number, rarity, product_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (product_id) DO UPDATE SET
                category_id = excluded.category_id,
                name = excluded.name,
                clean_name = excluded.clean_name,
                image_url = COALESCE(excluded.image_url, products.image_url),
                number = COALESCE(excluded.number, products.number),
                rarity = COALESCE(excluded.rarity, products.rarity),
                product_type = excluded.product_type;
        "#,
    )
    .bind(product.product_id)
    .bind(product.category_id)
    .bind(&product.name)
    .bind(&product.clean_name)
    .bind(&product.image_url)
    .bind(&product.number)
    .bind(&product.rarity)
    .bind(&product.product_type)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn upsert_sku(sku: &SkuRecord, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO skus (sku_id, product_id, variant, condition, language) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (sku_id) DO UPDATE SET
                product_id = excluded.product_id,
                variant = excluded.variant,
                condition = excluded.condition,
                language = excluded.language;
        "#,
    )
    .bind(sku.sku_id)
    .bind(sku.product_id)
    .bind(&sku.variant)
    .bind(&sku.condition)
    .bind(&sku.language)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn upsert_current_price(
    price: &PriceRow,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO current_prices (product_id, variant, market_price, low_price, mid_price, updated_at, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (product_id, variant) DO UPDATE SET
                market_price = excluded.market_price,
                low_price = excluded.low_price,
                mid_price = excluded.mid_price,
                updated_at = excluded.updated_at,
                source = excluded.source;
        "#,
    )
    .bind(price.product_id)
    .bind(&price.variant)
    .bind(price.market_price)
    .bind(price.low_price)
    .bind(price.mid_price)
    .bind(now)
    .bind(&price.source)
    .execute(conn)
    .await?;
    Ok(())
}

/// Keeps one row per variant per day. A repeat on the same day replaces the prices.
pub async fn record_price_history(
    price: &PriceRow,
    date: NaiveDate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO price_history (product_id, variant, date, market_price, low_price, source, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (product_id, variant, date) DO UPDATE SET
                market_price = excluded.market_price,
                low_price = excluded.low_price;
        "#,
    )
    .bind(price.product_id)
    .bind(&price.variant)
    .bind(date)
    .bind(price.market_price)
    .bind(price.low_price)
    .bind(&price.source)
    .bind(now)
    .execute(conn)
    .await?;
    trace!("🗃️ Price history for {} ({}) on {date} recorded", price.product_id, price.variant);
    Ok(())
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE product_id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_product_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    let ids = sqlx::query_scalar("SELECT product_id FROM products ORDER BY product_id").fetch_all(conn).await?;
    Ok(ids)
}

pub async fn fetch_current_price(
    product_id: i64,
    variant: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CurrentPrice>, sqlx::Error> {
    let price = sqlx::query_as("SELECT * FROM current_prices WHERE product_id = $1 AND variant = $2")
        .bind(product_id)
        .bind(variant)
        .fetch_optional(conn)
        .await?;
    Ok(price)
}

pub async fn fetch_price_history(
    product_id: i64,
    variant: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<PriceHistoryEntry>, sqlx::Error> {
    let history =
        sqlx::query_as("SELECT * FROM price_history WHERE product_id = $1 AND variant = $2 ORDER BY date DESC")
            .bind(product_id)
            .bind(variant)
            .fetch_all(conn)
            .await?;
    Ok(history)
}

pub async fn fetch_active_watchlist_item(
    product_id: i64,
    variant: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<WatchlistItem>, sqlx::Error> {
    let item = sqlx::query_as(
        "SELECT * FROM watchlist WHERE product_id = $1 AND variant = $2 AND active = 1 ORDER BY id LIMIT 1",
    )
    .bind(product_id)
    .bind(variant)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

pub async fn insert_watchlist_item(
    product_id: i64,
    variant: &str,
    notes: Option<&str>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<WatchlistItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO watchlist (product_id, variant, notes, added_at) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(product_id)
    .bind(variant)
    .bind(notes)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

/// Returns false if there is no such item.
pub async fn deactivate_watchlist_item(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE watchlist SET active = 0 WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_watchlist_item(id: i64, conn: &mut SqliteConnection) -> Result<Option<WatchlistItem>, sqlx::Error> {
    let item = sqlx::query_as("SELECT * FROM watchlist WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(item)
}

pub async fn fetch_active_watchlist(conn: &mut SqliteConnection) -> Result<Vec<WatchlistItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM watchlist WHERE active = 1 ORDER BY id").fetch_all(conn).await?;
    Ok(items)
}

pub async fn insert_price_alert(alert: NewPriceAlert, conn: &mut SqliteConnection) -> Result<PriceAlert, sqlx::Error> {
    let alert = sqlx::query_as(
        r#"
            INSERT INTO price_alerts (watchlist_id, threshold_bps, time_window, direction) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(alert.watchlist_id)
    .bind(alert.threshold)
    .bind(alert.time_window)
    .bind(alert.direction.to_string())
    .fetch_one(conn)
    .await?;
    Ok(alert)
}

pub async fn fetch_armed_alerts(conn: &mut SqliteConnection) -> Result<Vec<WatchedAlert>, sqlx::Error> {
    let alerts = sqlx::query_as(
        r#"
            SELECT price_alerts.*, watchlist.product_id, watchlist.variant
            FROM price_alerts JOIN watchlist ON watchlist.id = price_alerts.watchlist_id
            WHERE watchlist.active = 1 AND price_alerts.triggered_at IS NULL
            ORDER BY price_alerts.id;
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(alerts)
}

/// The `triggered_at IS NULL` guard makes this a compare-and-set: only one caller can fire an alert.
pub async fn set_alert_triggered(
    alert_id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE price_alerts SET triggered_at = $1 WHERE id = $2 AND triggered_at IS NULL")
        .bind(now)
        .bind(alert_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_triggered_alerts(conn: &mut SqliteConnection) -> Result<Vec<WatchedAlert>, sqlx::Error> {
    let alerts = sqlx::query_as(
        r#"
            SELECT price_alerts.*, watchlist.product_id, watchlist.variant
            FROM price_alerts JOIN watchlist ON watchlist.id = price_alerts.watchlist_id
            WHERE price_alerts.triggered_at IS NOT NULL
            ORDER BY price_alerts.triggered_at DESC, price_alerts.id DESC;
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(alerts)
}

pub async fn set_alert_acknowledged(alert_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE price_alerts SET acknowledged = 1 WHERE id = $1").bind(alert_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

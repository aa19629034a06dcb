use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{AuditActor, AuditEntry, NewOrder, NewOrderItem, Order, OrderItem, OrderNumber, OrderStatusType},
    traits::{OrderStoreError, StatusCounts},
};

/// Inserts a new order row. This is not atomic with respect to the line items; wrap it in a transaction along with
/// [`insert_order_items`] and pass `&mut *tx` as the connection.
///
/// A clash on the order number is reported as [`OrderStoreError::OrderNumberExists`].
pub async fn insert_order(
    order_number: &OrderNumber,
    order: &NewOrder,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderStoreError> {
    let created_at = order.created_at.unwrap_or(now);
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_name,
                customer_email,
                customer_phone,
                game,
                notes,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order_number.as_str())
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.game)
    .bind(&order.notes)
    .bind(created_at)
    .bind(created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(OrderStoreError::OrderNumberExists(order_number.clone()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn insert_order_items(
    order_id: i64,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<u64, OrderStoreError> {
    if items.is_empty() {
        return Ok(0);
    }
    let mut builder =
        QueryBuilder::new("INSERT INTO order_items (order_id, quantity, card_name, set_code, collector_number) ");
    builder.push_values(items, |mut row, item| {
        row.push_bind(order_id)
            .push_bind(item.quantity)
            .push_bind(&item.card_name)
            .push_bind(&item.set_code)
            .push_bind(&item.collector_number);
    });
    let result = builder.build().execute(conn).await?;
    trace!("🗃️ Inserted {} line items for order #{order_id}", result.rows_affected());
    Ok(result.rows_affected())
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Conditionally moves the order from `old_status` to `new_status`, resetting the alert flag that belongs to the new
/// status. Returns `None` if the order is not (or no longer) in `old_status`.
pub async fn update_status(
    order_id: i64,
    old_status: OrderStatusType,
    new_status: OrderStatusType,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(new_status);
    builder.push(", updated_at = ");
    builder.push_bind(now);
    match new_status {
        OrderStatusType::InProgress => {
            builder.push(", stale_alert_sent = 0");
        },
        OrderStatusType::PickedUp => {
            builder.push(", pickup_alert_sent = 0");
        },
        _ => {},
    }
    builder.push(" WHERE id = ");
    builder.push_bind(order_id);
    builder.push(" AND status = ");
    builder.push_bind(old_status);
    builder.push(" RETURNING *;");
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    Ok(order)
}

pub async fn insert_audit_entry(
    order_id: i64,
    actor: &AuditActor,
    old_status: OrderStatusType,
    new_status: OrderStatusType,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<AuditEntry, sqlx::Error> {
    let entry: AuditEntry = sqlx::query_as(
        r#"
            INSERT INTO order_audit_log (order_id, actor, old_status, new_status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(actor.to_string())
    .bind(old_status)
    .bind(new_status)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Audit: order #{order_id} {old_status} -> {new_status} by {}", entry.actor);
    Ok(entry)
}

pub async fn fetch_audit_log(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<AuditEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM order_audit_log WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}

pub async fn count_by_status(conn: &mut SqliteConnection) -> Result<StatusCounts, sqlx::Error> {
    let rows: Vec<(OrderStatusType, i64)> = sqlx::query_as(
        r#"
            SELECT status, COUNT(*) FROM orders
            WHERE status IN ('submitted', 'in_progress', 'ready')
            GROUP BY status
        "#,
    )
    .fetch_all(conn)
    .await?;
    let mut counts = StatusCounts::default();
    rows.into_iter().for_each(|(status, count)| counts.add(status, count));
    Ok(counts)
}

/// Submitted orders are stale once their *creation* time passes the cutoff.
pub async fn fetch_stale_submitted(
    cutoff: DateTime<Utc>,
    unalerted_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE status = 'submitted' AND created_at < ");
    builder.push_bind(cutoff);
    if unalerted_only {
        builder.push(" AND stale_alert_sent = 0");
    }
    builder.push(" ORDER BY created_at, id");
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Ready orders are stale once the time they *became ready* passes the cutoff.
pub async fn fetch_stale_ready(
    cutoff: DateTime<Utc>,
    unalerted_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE status = 'ready' AND updated_at < ");
    builder.push_bind(cutoff);
    if unalerted_only {
        builder.push(" AND pickup_alert_sent = 0");
    }
    builder.push(" ORDER BY updated_at, id");
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

pub async fn set_stale_alert_sent(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE orders SET stale_alert_sent = 1 WHERE id = $1").bind(order_id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

pub async fn set_pickup_alert_sent(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE orders SET pickup_alert_sent = 1 WHERE id = $1").bind(order_id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

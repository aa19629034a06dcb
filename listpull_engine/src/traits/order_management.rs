use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{AuditActor, AuditEntry, NewOrder, Order, OrderItem, OrderNumber, OrderStatusType},
    traits::data_objects::StatusCounts,
};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order number {0} is already in use")]
    OrderNumberExists(OrderNumber),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {order_id} is no longer in status {expected}")]
    StatusChanged { order_id: i64, expected: OrderStatusType },
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the behaviour for storing and querying decklist orders in the database backend.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores the order, under the given order number, together with its line items in a single atomic transaction.
    ///
    /// If the order number is already taken, [`OrderStoreError::OrderNumberExists`] is returned and nothing is stored,
    /// so that the caller can pick a new number and try again.
    async fn insert_order(
        &self,
        order_number: &OrderNumber,
        order: &NewOrder,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderStoreError>;

    /// Line items for the order, in the order they appeared in the decklist.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderStoreError>;

    /// Moves the order from `old_status` to `new_status` and writes the matching audit entry, atomically.
    ///
    /// The update is conditional on the order still being in `old_status`. If someone else got there first,
    /// [`OrderStoreError::StatusChanged`] is returned and nothing is written.
    ///
    /// Entering `in_progress` clears `stale_alert_sent`, and entering `picked_up` clears `pickup_alert_sent`, so that a
    /// later stall is alerted afresh.
    async fn update_order_status(
        &self,
        order_id: i64,
        old_status: OrderStatusType,
        new_status: OrderStatusType,
        actor: &AuditActor,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderStoreError>;

    /// Every status transition recorded for the order, oldest first.
    async fn fetch_audit_log(&self, order_id: i64) -> Result<Vec<AuditEntry>, OrderStoreError>;

    async fn count_orders_by_status(&self) -> Result<StatusCounts, OrderStoreError>;

    /// Orders in `submitted` that were created before `cutoff`, oldest first. If `unalerted_only` is set, orders that
    /// have already been alerted in this episode are skipped.
    async fn fetch_stale_submitted(
        &self,
        cutoff: DateTime<Utc>,
        unalerted_only: bool,
    ) -> Result<Vec<Order>, OrderStoreError>;

    /// Orders that have sat in `ready` since before `cutoff`, oldest first. If `unalerted_only` is set, orders that
    /// have already been alerted in this episode are skipped.
    async fn fetch_stale_ready(
        &self,
        cutoff: DateTime<Utc>,
        unalerted_only: bool,
    ) -> Result<Vec<Order>, OrderStoreError>;

    async fn mark_stale_alert_sent(&self, order_id: i64) -> Result<(), OrderStoreError>;

    async fn mark_pickup_alert_sent(&self, order_id: i64) -> Result<(), OrderStoreError>;
}

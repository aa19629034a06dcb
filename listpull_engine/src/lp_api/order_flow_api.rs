use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{AuditActor, AuditEntry, EmailTemplate, NewEmailJob, NewOrder, Order, OrderNumber, OrderStatusType},
    decklist::parse_decklist,
    lp_api::errors::OrderFlowError,
    traits::{EmailQueueManagement, OrderManagement, OrderStoreError, OrderWithItems},
};

/// How many fresh order numbers to try before giving up on a submission.
pub const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// `OrderFlowApi` is the primary API for moving decklist orders through the store: intake, lookups and staff status
/// changes.
///
/// Customer emails are never sent from here. Instead, a job is put on the email queue and the email worker picks it up
/// on its next drain.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + EmailQueueManagement
{
    /// Parses the decklist into line items and submits the order. See [`Self::submit_order`].
    pub async fn submit_decklist(&self, order: NewOrder, decklist: &str) -> Result<OrderWithItems, OrderFlowError> {
        let items = parse_decklist(decklist)?;
        self.submit_order(order.with_items(items)).await
    }

    /// Stores a new order with a freshly generated order number, and queues the confirmation email.
    ///
    /// Order numbers are random, so a clash with an existing order is possible (if unlikely). On a clash a new number
    /// is drawn, up to [`ORDER_NUMBER_ATTEMPTS`] times.
    pub async fn submit_order(&self, order: NewOrder) -> Result<OrderWithItems, OrderFlowError> {
        validate_new_order(&order)?;
        let now = Utc::now();
        let mut stored = None;
        for attempt in 1..=ORDER_NUMBER_ATTEMPTS {
            let order_number = OrderNumber::generate(order.created_at.unwrap_or(now));
            match self.db.insert_order(&order_number, &order, now).await {
                Ok(o) => {
                    stored = Some(o);
                    break;
                },
                Err(OrderStoreError::OrderNumberExists(n)) => {
                    warn!("🔄️📦️ Order number {n} is taken (attempt {attempt}/{ORDER_NUMBER_ATTEMPTS})");
                },
                Err(e) => return Err(e.into()),
            }
        }
        let stored = stored.ok_or(OrderFlowError::OrderNumberExhausted(ORDER_NUMBER_ATTEMPTS))?;
        info!(
            "🔄️📦️ Order [{}] submitted by {} with {} line items",
            stored.order_number,
            stored.customer_email,
            order.items.len()
        );
        let job = NewEmailJob::new(stored.id, stored.customer_email.clone(), EmailTemplate::Confirmation);
        self.db.enqueue_email(job).await?;
        let items = self.db.fetch_order_items(stored.id).await?;
        Ok(OrderWithItems::new(stored, items))
    }

    pub async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<OrderWithItems>, OrderFlowError> {
        let order = match self.db.fetch_order_by_number(order_number).await? {
            Some(o) => o,
            None => return Ok(None),
        };
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(Some(OrderWithItems::new(order, items)))
    }

    /// Moves the order to `new_status` on behalf of `actor`.
    ///
    /// * Terminal orders (`picked_up`, `cancelled`) cannot change.
    /// * Setting the status the order already has is an error.
    /// * Every change is written to the audit log.
    /// * Moving to `ready` queues the "ready for pickup" email.
    pub async fn update_status(
        &self,
        order_number: &OrderNumber,
        new_status: OrderStatusType,
        actor: AuditActor,
    ) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
        let old_status = order.status;
        if old_status.is_terminal() {
            return Err(OrderFlowError::TerminalStatus { order_number: order_number.clone(), status: old_status });
        }
        if !old_status.can_transition_to(new_status) {
            return Err(OrderFlowError::UnchangedStatus { order_number: order_number.clone(), status: old_status });
        }
        let updated = match self.db.update_order_status(order.id, old_status, new_status, &actor, Utc::now()).await {
            Ok(o) => o,
            Err(OrderStoreError::StatusChanged { .. }) => {
                return Err(OrderFlowError::ConcurrentUpdate(order_number.clone()))
            },
            Err(e) => return Err(e.into()),
        };
        info!("🔄️📦️ Order [{order_number}] moved from {old_status} to {new_status} by {actor}");
        if new_status == OrderStatusType::Ready {
            let job = NewEmailJob::new(updated.id, updated.customer_email.clone(), EmailTemplate::Ready);
            let job = self.db.enqueue_email(job).await?;
            debug!("🔄️📧 Ready email #{} queued for order [{order_number}]", job.id);
        }
        Ok(updated)
    }

    pub async fn audit_log(&self, order_number: &OrderNumber) -> Result<Vec<AuditEntry>, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))?;
        let entries = self.db.fetch_audit_log(order.id).await?;
        Ok(entries)
    }
}

fn validate_new_order(order: &NewOrder) -> Result<(), OrderFlowError> {
    if order.customer_name.trim().is_empty() {
        return Err(OrderFlowError::InvalidOrder("customer name is required".into()));
    }
    let email = order.customer_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(OrderFlowError::InvalidOrder(format!("'{email}' is not a valid email address")));
    }
    if order.game.trim().is_empty() {
        return Err(OrderFlowError::InvalidOrder("game is required".into()));
    }
    if order.items.is_empty() {
        return Err(OrderFlowError::InvalidOrder("the order has no cards".into()));
    }
    Ok(())
}

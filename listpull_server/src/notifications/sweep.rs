use chrono::{DateTime, Utc};
use discord_tools::{Embed, EmbedField, Notifier, COLOR_RED, COLOR_YELLOW};
use listpull_engine::{db_types::Order, traits::OrderStoreError, OrderManagement};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{config::NotificationConfig, notifications::format_waiting};

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Alerts posted for submitted orders nobody has started on.
    pub stale_orders: usize,
    /// Alerts posted for ready orders nobody has collected.
    pub stale_pickups: usize,
    /// How many of those alerts the webhook accepted.
    pub delivered: usize,
}

impl SweepSummary {
    pub fn total(&self) -> usize {
        self.stale_orders + self.stale_pickups
    }
}

pub fn stale_order_alert(order: &Order, now: DateTime<Utc>) -> Embed {
    Embed::new(format!("⏰ Order {} has not been started", order.order_number), COLOR_YELLOW)
        .with_description(format!(
            "Submitted {} ago and still waiting to be pulled.",
            format_waiting(order.created_at, now)
        ))
        .with_field(EmbedField::inline("Customer", &order.customer_name))
        .with_field(EmbedField::inline("Game", &order.game))
        .with_field(EmbedField::new("Contact", contact_details(order)))
        .with_timestamp(now)
}

pub fn stale_pickup_alert(order: &Order, now: DateTime<Utc>) -> Embed {
    Embed::new(format!("📦 Order {} has not been picked up", order.order_number), COLOR_RED)
        .with_description(format!(
            "Ready for {} and still on the shelf. Reach out to the customer.",
            format_waiting(order.updated_at, now)
        ))
        .with_field(EmbedField::inline("Customer", &order.customer_name))
        .with_field(EmbedField::inline("Game", &order.game))
        .with_field(EmbedField::new("Contact", contact_details(order)))
        .with_timestamp(now)
}

fn contact_details(order: &Order) -> String {
    match order.customer_phone.as_deref() {
        Some(phone) => format!("{}\n{phone}", order.customer_email),
        None => order.customer_email.clone(),
    }
}

/// Posts one alert for every stalled order that has not been alerted in its current stall episode.
///
/// Orders are flagged as alerted once the post has been attempted, whether or not the webhook accepted it. A failure
/// to set the flag is logged and the sweep carries on; that order will simply be alerted again next time.
///
/// When notifications are disabled this returns straight away without touching the database.
pub async fn run_stale_sweep<B, N>(
    db: &B,
    notifier: &N,
    config: &NotificationConfig,
    now: DateTime<Utc>,
) -> Result<SweepSummary, OrderStoreError>
where
    B: OrderManagement,
    N: Notifier,
{
    let mut summary = SweepSummary::default();
    if !notifier.is_enabled() {
        trace!("🕰️ Discord is not configured. Skipping the stale order sweep");
        return Ok(summary);
    }
    let orders = db.fetch_stale_submitted(now - config.stale_order_threshold(), true).await?;
    let pickups = db.fetch_stale_ready(now - config.pickup_hold_threshold(), true).await?;
    if orders.is_empty() && pickups.is_empty() {
        debug!("🕰️ Stale order sweep found nothing new");
        return Ok(summary);
    }
    for order in &orders {
        if notifier.notify(vec![stale_order_alert(order, now)]).await {
            summary.delivered += 1;
        }
        summary.stale_orders += 1;
        if let Err(e) = db.mark_stale_alert_sent(order.id).await {
            error!("🕰️ Could not flag order {} as alerted. {e}", order.order_number);
        }
    }
    for order in &pickups {
        if notifier.notify(vec![stale_pickup_alert(order, now)]).await {
            summary.delivered += 1;
        }
        summary.stale_pickups += 1;
        if let Err(e) = db.mark_pickup_alert_sent(order.id).await {
            error!("🕰️ Could not flag order {} as alerted. {e}", order.order_number);
        }
    }
    info!(
        "🕰️ Stale order sweep posted {} stale order and {} pickup alerts ({} delivered)",
        summary.stale_orders, summary.stale_pickups, summary.delivered
    );
    Ok(summary)
}

use chrono::{DateTime, Utc};
use discord_tools::{
    truncate_list,
    Embed,
    EmbedField,
    Notifier,
    COLOR_GREEN,
    COLOR_RED,
    COLOR_YELLOW,
    FIELD_VALUE_LIMIT,
};
use listpull_engine::{
    db_types::Order,
    traits::{OrderStoreError, StaleOrders, StatusCounts},
    OrderManagement,
};
use log::*;

use crate::{config::NotificationConfig, notifications::format_waiting};

/// Builds the daily digest message.
///
/// With nothing outstanding and nothing stale this is a short "all clear". Otherwise it carries the per-status counts
/// and the stale lists. The colour is red if anything is stale, yellow if orders are pending, and green otherwise.
pub fn build_digest_embed(counts: &StatusCounts, stale: &StaleOrders, now: DateTime<Utc>) -> Embed {
    if counts.total() == 0 && stale.is_empty() {
        return Embed::new("✅ All clear", COLOR_GREEN)
            .with_description("No orders are waiting to be pulled or picked up.")
            .with_timestamp(now);
    }
    let color = if stale.is_empty() { COLOR_YELLOW } else { COLOR_RED };
    let mut embed = Embed::new("📋 Daily order digest", color)
        .with_description(format!("{} open orders.", counts.total()))
        .with_field(EmbedField::inline("Submitted", counts.submitted.to_string()))
        .with_field(EmbedField::inline("In progress", counts.in_progress.to_string()))
        .with_field(EmbedField::inline("Ready for pickup", counts.ready.to_string()))
        .with_timestamp(now);
    if !stale.orders.is_empty() {
        let lines = stale.orders.iter().map(|o| stale_order_line(o, now)).collect::<Vec<_>>();
        let name = format!("⏰ Waiting to be pulled ({})", stale.orders.len());
        embed = embed.with_field(EmbedField::new(name, truncate_list(&lines, FIELD_VALUE_LIMIT)));
    }
    if !stale.pickups.is_empty() {
        let lines = stale.pickups.iter().map(|o| stale_pickup_line(o, now)).collect::<Vec<_>>();
        let name = format!("📦 Not picked up ({})", stale.pickups.len());
        embed = embed.with_field(EmbedField::new(name, truncate_list(&lines, FIELD_VALUE_LIMIT)));
    }
    embed
}

fn stale_order_line(order: &Order, now: DateTime<Utc>) -> String {
    format!(
        "• **{}** {} ({}), waiting {}",
        order.order_number,
        order.customer_name,
        order.game,
        format_waiting(order.created_at, now)
    )
}

fn stale_pickup_line(order: &Order, now: DateTime<Utc>) -> String {
    format!(
        "• **{}** {}, {}, {}, ready for {}",
        order.order_number,
        order.customer_name,
        order.customer_email,
        order.customer_phone.as_deref().unwrap_or("no phone"),
        format_waiting(order.updated_at, now)
    )
}

/// Collects the counts and stale lists and posts the digest.
///
/// Returns `Ok(false)` without touching the database when notifications are disabled. Otherwise returns whether the
/// webhook accepted the message.
pub async fn run_digest<B, N>(
    db: &B,
    notifier: &N,
    config: &NotificationConfig,
    now: DateTime<Utc>,
) -> Result<bool, OrderStoreError>
where
    B: OrderManagement,
    N: Notifier,
{
    if !notifier.is_enabled() {
        trace!("🕰️ Discord is not configured. Skipping the digest");
        return Ok(false);
    }
    let counts = db.count_orders_by_status().await?;
    let orders = db.fetch_stale_submitted(now - config.stale_order_threshold(), false).await?;
    let pickups = db.fetch_stale_ready(now - config.pickup_hold_threshold(), false).await?;
    let stale = StaleOrders { orders, pickups };
    info!(
        "🕰️ Posting digest: {} submitted, {} in progress, {} ready, {} stale, {} uncollected",
        counts.submitted,
        counts.in_progress,
        counts.ready,
        stale.orders.len(),
        stale.pickups.len()
    );
    let embed = build_digest_embed(&counts, &stale, now);
    Ok(notifier.notify(vec![embed]).await)
}

use std::fmt::Write;

use anyhow::Result;
use listpull_engine::{
    db_types::{Cents, EmailJob, Order, PriceHistoryEntry, WatchedAlert, WatchlistItem},
    TriggeredAlert,
};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};
use tcg_pricing::{
    justtcg::{extract_prices, Card},
    InventoryRow,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

pub fn format_email_jobs(jobs: &[EmailJob]) -> String {
    if jobs.is_empty() {
        return "The email queue is empty".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Order", "Recipient", "Template", "Status", "Attempts", "Created At", "Sent At"]);
    jobs.iter().for_each(|job| {
        table.add_row(row![
            job.id,
            job.order_id,
            job.recipient,
            job.template.to_string(),
            job.status.to_string(),
            job.attempts,
            job.created_at.to_string(),
            job.sent_at.map(|t| t.to_string()).unwrap_or_default()
        ]);
    });
    markdown_style(&mut table);
    format!("{table}\n{} jobs", jobs.len())
}

pub fn format_email_job(job: &EmailJob, order: Option<&Order>) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "-----------------------------------------------------------------------------")?;
    writeln!(f, "Email job #{:<10} [{:^9}]          Created {}", job.id, job.status.to_string(), job.created_at)?;
    writeln!(f, "-----------------------------------------------------------------------------")?;
    writeln!(f, "Template:  {}", job.template)?;
    writeln!(f, "Recipient: {}", job.recipient)?;
    writeln!(f, "Attempts:  {}", job.attempts)?;
    match job.sent_at {
        Some(t) => writeln!(f, "Sent at:   {t}")?,
        None => writeln!(f, "Sent at:   Not sent")?,
    }
    writeln!(f, "Last error: {}", job.last_error.as_deref().unwrap_or("None"))?;
    match order {
        Some(order) => writeln!(
            f,
            "Order:     {} for {} ({}), currently {}",
            order.order_number, order.customer_name, order.game, order.status
        )?,
        None => writeln!(f, "Order:     #{} no longer exists", job.order_id)?,
    }
    writeln!(f, "-----------------------------------------------------------------------------")?;
    Ok(f)
}

/// Tabulates the rows whose listed price differs between `before` and `after`.
pub fn format_price_changes(before: &[InventoryRow], after: &[InventoryRow]) -> String {
    let mut table = Table::new();
    table.set_titles(row!["TCGplayer Id", "Product", "Condition", "TCG Low", "Market", "Old price", "New price"]);
    let price = |p: Option<rust_decimal::Decimal>| p.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
    let mut changes = 0;
    before.iter().zip(after).filter(|(old, new)| old.current_listed_price != new.current_listed_price).for_each(
        |(old, new)| {
            changes += 1;
            table.add_row(row![
                new.sku_id,
                new.product_name,
                new.condition,
                r->price(new.tcg_low),
                r->price(new.market_price),
                r->price(old.current_listed_price),
                r->price(new.current_listed_price)
            ]);
        },
    );
    if changes == 0 {
        return "No prices changed".to_string();
    }
    markdown_style(&mut table);
    table.to_string()
}

fn cents(price: Option<Cents>) -> String {
    price.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn format_watchlist(items: &[WatchlistItem]) -> String {
    if items.is_empty() {
        return "The watch list is empty".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Product", "Variant", "Added", "Notes"]);
    items.iter().for_each(|item| {
        table.add_row(row![
            item.id,
            item.product_id,
            item.variant,
            item.added_at.format("%Y-%m-%d").to_string(),
            item.notes.as_deref().unwrap_or_default()
        ]);
    });
    markdown_style(&mut table);
    table.to_string()
}

pub fn format_price_history(history: &[PriceHistoryEntry]) -> String {
    if history.is_empty() {
        return "No prices recorded".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Date", "Market", "Low", "Source"]);
    history.iter().for_each(|h| {
        table.add_row(row![h.date.to_string(), r->cents(h.market_price), r->cents(h.low_price), h.source]);
    });
    markdown_style(&mut table);
    table.to_string()
}

/// Alerts that fired just now.
pub fn format_triggered(alerts: &[TriggeredAlert]) -> String {
    if alerts.is_empty() {
        return "No alerts triggered".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Alert", "Product", "Variant", "Old price", "New price", "Threshold", "Direction"]);
    alerts.iter().for_each(|a| {
        table.add_row(row![
            a.alert_id,
            a.product_id,
            a.variant,
            r->a.old_price.to_string(),
            r->a.new_price.to_string(),
            r->a.threshold.to_string(),
            a.direction.to_string()
        ]);
    });
    markdown_style(&mut table);
    format!("{table}\n{} alerts triggered", alerts.len())
}

/// Every alert that has ever fired.
pub fn format_fired_alerts(alerts: &[WatchedAlert]) -> String {
    if alerts.is_empty() {
        return "No alerts have fired".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Alert", "Product", "Variant", "Threshold", "Direction", "Fired At", "Seen"]);
    alerts.iter().for_each(|w| {
        table.add_row(row![
            w.alert.id,
            w.product_id,
            w.variant,
            r->w.alert.threshold_bps.to_string(),
            w.alert.direction.to_string(),
            w.alert.triggered_at.map(|t| t.to_string()).unwrap_or_default(),
            if w.alert.acknowledged { "yes" } else { "no" }
        ]);
    });
    markdown_style(&mut table);
    table.to_string()
}

/// One line per variant.
pub fn format_search_results(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "No cards found".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["TCGplayer Id", "Name", "Set", "Number", "Printing", "Condition", "Price", "24h %"]);
    let show = |d: Option<rust_decimal::Decimal>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
    for card in cards {
        for variant in &card.variants {
            let prices = extract_prices(variant);
            table.add_row(row![
                card.tcgplayer_id.as_deref().unwrap_or("-"),
                card.name,
                card.set_name.as_deref().unwrap_or(&card.set),
                card.number.as_deref().unwrap_or_default(),
                prices.printing.as_deref().unwrap_or_default(),
                prices.condition.as_deref().unwrap_or_default(),
                r->show(prices.price),
                r->show(prices.price_change_24h)
            ]);
        }
    }
    markdown_style(&mut table);
    table.to_string()
}

use std::fmt::Write;

use crate::{db_types::EmailTemplate, mailer::EmailMessage, traits::OrderWithItems};

/// Renders the customer email for `template` about the given order.
pub fn render_email(template: EmailTemplate, order: &OrderWithItems, store_name: &str) -> EmailMessage {
    match template {
        EmailTemplate::Confirmation => confirmation_email(order, store_name),
        EmailTemplate::Ready => ready_email(order, store_name),
    }
}

fn confirmation_email(order: &OrderWithItems, store_name: &str) -> EmailMessage {
    let o = &order.order;
    let subject = format!("{store_name}: we received your order {}", o.order_number);
    let mut text = format!(
        "Hi {},\n\nThanks for your {} decklist order! Your order number is {}.\n\nWe'll email you again when your \
         cards have been pulled and are ready for pickup.\n\n",
        o.customer_name, o.game, o.order_number
    );
    let _ = writeln!(text, "Cards requested ({} total):", order.card_count());
    for item in &order.items {
        let _ = write!(text, "  {} x {}", item.quantity, item.card_name);
        if let Some(set) = &item.set_code {
            let _ = write!(text, " ({set})");
        }
        text.push('\n');
    }
    if let Some(notes) = o.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = write!(text, "\nYour notes: {notes}\n");
    }
    let _ = write!(text, "\n{store_name}");
    EmailMessage { to: o.customer_email.clone(), subject, text }
}

fn ready_email(order: &OrderWithItems, store_name: &str) -> EmailMessage {
    let o = &order.order;
    let subject = format!("{store_name}: order {} is ready for pickup", o.order_number);
    let text = format!(
        "Hi {},\n\nGood news! Your {} order {} has been pulled and is ready for pickup at {store_name}.\n\nPlease \
         bring your order number with you.\n\n{store_name}",
        o.customer_name, o.game, o.order_number
    );
    EmailMessage { to: o.customer_email.clone(), subject, text }
}

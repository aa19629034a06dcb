use std::fmt::Display;

use listpull_engine::db_types::{EmailStatus, NewOrder, OrderStatusType};
use serde::{Deserialize, Serialize};

/// The body of a customer's `POST /orders` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub game: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// The pasted decklist, one card per line.
    pub decklist: String,
}

impl SubmitOrderRequest {
    /// Splits the request into the order details and the raw decklist text.
    pub fn into_parts(self) -> (NewOrder, String) {
        let mut order = NewOrder::new(self.customer_name.trim(), self.customer_email.trim(), self.game.trim());
        if let Some(phone) = self.customer_phone.filter(|p| !p.trim().is_empty()) {
            order = order.with_phone(phone.trim());
        }
        if let Some(notes) = self.notes.filter(|n| !n.trim().is_empty()) {
            order = order.with_notes(notes);
        }
        (order, self.decklist)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatusType,
    /// The staff member making the change. Changes without one are attributed to the system.
    #[serde(default)]
    pub staff_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailQueueQuery {
    #[serde(default)]
    pub status: Option<EmailStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

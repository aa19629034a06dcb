use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, OrderStatusType};

/// Number of orders in each active status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub submitted: i64,
    pub in_progress: i64,
    pub ready: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: OrderStatusType, count: i64) {
        match status {
            OrderStatusType::Submitted => self.submitted += count,
            OrderStatusType::InProgress => self.in_progress += count,
            OrderStatusType::Ready => self.ready += count,
            OrderStatusType::PickedUp | OrderStatusType::Cancelled => {},
        }
    }

    pub fn total(&self) -> i64 {
        self.submitted + self.in_progress + self.ready
    }
}

/// Orders that have been waiting too long in `submitted` (stale orders) or `ready` (stale pickups).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaleOrders {
    pub orders: Vec<Order>,
    pub pickups: Vec<Order>,
}

impl StaleOrders {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.pickups.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }

    pub fn card_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

use tcg_pricing::justtcg::JustTcgError;
use thiserror::Error;

use crate::{
    db_types::{OrderNumber, OrderStatusType},
    decklist::DecklistError,
    traits::{EmailQueueError, OrderStoreError, PriceStoreError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("Invalid decklist. {0}")]
    InvalidDecklist(#[from] DecklistError),
    #[error("Order {order_number} is {status}, and can no longer change status")]
    TerminalStatus { order_number: OrderNumber, status: OrderStatusType },
    #[error("Order {order_number} is already {status}")]
    UnchangedStatus { order_number: OrderNumber, status: OrderStatusType },
    #[error("Order {0} was modified by someone else. Reload and try again")]
    ConcurrentUpdate(OrderNumber),
    #[error("Could not generate a unique order number after {0} attempts")]
    OrderNumberExhausted(usize),
    #[error("Could not queue email. {0}")]
    EmailQueueError(#[from] EmailQueueError),
}

impl From<OrderStoreError> for OrderFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::DatabaseError(s) => Self::DatabaseError(s),
            other => Self::DatabaseError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PriceTrackerError {
    #[error("Could not update prices. {0}")]
    StoreError(#[from] PriceStoreError),
    #[error("Could not fetch market data. {0}")]
    SourceError(#[from] JustTcgError),
    #[error("Invalid alert threshold: {0}")]
    InvalidThreshold(String),
}

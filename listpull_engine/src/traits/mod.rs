//! #  Storage contracts
//!
//! This module defines the behaviour that a database backend needs to expose in order to drive ListPull.
//!
//! * [`OrderManagement`] covers decklist orders: creation, lookups, status transitions and the audit trail, plus the
//!   queries the notification scheduler needs (status counts, stale orders, alert flags).
//! * [`EmailQueueManagement`] covers the durable email queue that the dispatcher drains.
//! * [`StaffManagement`] is the thin slice of the staff-account store that order auditing consumes.
//! * [`PriceTracking`] covers market prices for tracked products, the watch list and price alerts.
//!
//! [`crate::SqliteDatabase`] implements all four.
mod data_objects;
mod email_queue_management;
mod order_management;
mod price_tracking;
mod staff_management;

pub use data_objects::{OrderWithItems, StaleOrders, StatusCounts};
pub use email_queue_management::{EmailQueueError, EmailQueueManagement};
pub use order_management::{OrderManagement, OrderStoreError};
pub use price_tracking::{PriceStoreError, PriceTracking};
pub use staff_management::{StaffManagement, StaffStoreError};

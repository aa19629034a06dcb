//! ListPull Engine
//!
//! ListPull takes decklist orders from customers of a trading-card store, lets staff pull the cards, and keeps the
//! customer informed until the order is collected. This library holds the core of that flow. It is independent of the
//! HTTP layer.
//!
//! The library is divided into these sections:
//! 1. Storage ([`traits`] and the SQLite backend, [`SqliteDatabase`]). You should rarely need to touch the database
//!    directly; use the public API instead. The data types stored in the database live in [`db_types`].
//! 2. The public API ([`OrderFlowApi`] and [`EmailQueueApi`]). Order intake, status changes, audit logging and
//!    queue management.
//! 3. Customer email ([`mailer`]). Templates, transports and the [`EmailDispatcher`] that drains the queue.
//! 4. Decklist parsing ([`decklist`]).
//! 5. Market price tracking ([`PriceTrackerApi`]). Stores JustTCG prices for tracked products and fires watch-list
//!    alerts when a price moves too far.
pub mod db_types;
pub mod decklist;
pub mod mailer;
pub mod traits;

mod lp_api;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use lp_api::{
    email_queue_api::{EmailQueueApi, EMAIL_RETENTION_DAYS},
    errors::{OrderFlowError, PriceTrackerError},
    order_flow_api::{OrderFlowApi, ORDER_NUMBER_ATTEMPTS},
    price_tracker_api::{IngestSummary, PriceTrackerApi, TriggeredAlert, REFRESH_BATCH_SIZE},
};
pub use mailer::{DrainOutcome, DrainSummary, EmailDispatcher};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::db_url, SqliteDatabase};
pub use traits::{EmailQueueManagement, OrderManagement, PriceTracking, StaffManagement};

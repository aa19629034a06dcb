//! # ListPull engine public API
//!
//! * [`order_flow_api`] handles order intake, lookups and staff status changes.
//! * [`email_queue_api`] handles queue-level operations on outgoing email: enqueueing, inspection and cleanup.
//! * [`price_tracker_api`] refreshes market prices for tracked products and fires watch-list price alerts.
//!
//! Each API is constructed from a backend implementing the storage traits it needs:
//!
//! ```rust,ignore
//! use listpull_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = OrderFlowApi::new(db);
//! let order = api.fetch_order(&"LP-240517-7K3Q".into()).await?;
//! ```
pub mod email_queue_api;
pub mod errors;
pub mod order_flow_api;
pub mod price_tracker_api;

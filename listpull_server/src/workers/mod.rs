//! Background jobs that run alongside the HTTP server.
pub mod email_worker;

pub use email_worker::{start_email_worker, EmailWorker, CLEANUP_EVERY_N_TICKS, DRAIN_INTERVAL};

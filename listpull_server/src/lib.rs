//! # ListPull server
//!
//! The HTTP face of ListPull, and the home of its background jobs:
//! * The HTTP API for customers (order submission and lookup) and staff (status changes, email queue). See
//!   [`routes`].
//! * The email worker, which drains the customer email queue every 30 seconds. See [`workers`].
//! * The notification scheduler, which posts the daily digest and stale order alerts to Discord. See
//!   [`notifications`].
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod notifications;
pub mod routes;
pub mod server;
pub mod workers;

#[cfg(test)]
mod endpoint_tests;

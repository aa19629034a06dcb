//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! Every interaction is a plain function that accepts a `&mut SqliteConnection`. Callers can pass a pooled
//! connection, or open a transaction and pass that instead when several statements must land together.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod email_queue;
pub mod orders;
pub mod prices;
pub mod staff;

const SQLITE_DB_URL: &str = "sqlite://data/listpull.db";

pub fn db_url() -> String {
    let result = env::var("LP_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ LP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

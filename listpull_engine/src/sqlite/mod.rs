//! SQLite backend for the ListPull engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;

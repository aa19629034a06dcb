//! Pricing helpers for a store's TCGplayer inventory.
//!
//! * [`calculate_price`] and [`reprice_rows`] apply a [`RepricingStrategy`] to market data.
//! * [`parse_csv`] and [`generate_csv`] read and write TCGplayer's inventory export format.
//! * [`evaluate_alert`] decides whether a watch-list price move crosses an alert threshold.
//! * [`justtcg`] fetches market data, and [`ingestion`] turns it into product, SKU and price records.
//!
//! All money is handled as [`rust_decimal::Decimal`]. Repriced listings are rounded half-up to whole cents. Market
//! data is rounded half-to-even.
mod alerts;
mod error;
pub mod ingestion;
mod inventory_csv;
pub mod justtcg;
mod repricing;

pub use alerts::{evaluate_alert, AlertDirection};
pub use error::PricingError;
pub use inventory_csv::{generate_csv, parse_csv, InventoryRow, CSV_HEADERS};
pub use repricing::{
    calculate_price,
    reprice_rows,
    RepriceSummary,
    RepricingSettings,
    RepricingStrategy,
    ABSOLUTE_MINIMUM,
};

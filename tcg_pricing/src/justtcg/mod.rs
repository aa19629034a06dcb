//! Client for the JustTCG market data API.
//!
//! Every request carries the API key in the `x-api-key` header. Card listings come back as [`CardsResponse`]; use
//! [`extract_prices`] to turn a [`Variant`]'s raw numbers into cents.
mod client;
mod config;
mod data_objects;
mod error;
mod prices;

pub use client::{game_slug, CardLookup, CardSource, JustTcgClient, GAME_SLUGS};
pub use config::{JustTcgConfig, DEFAULT_BASE_URL};
pub use data_objects::{
    ApiUsage,
    BatchItem,
    Card,
    CardSet,
    CardsResponse,
    DataList,
    Game,
    PageMeta,
    PricePoint,
    Variant,
};
pub use error::JustTcgError;
pub use prices::{extract_prices, to_price, VariantPrices};

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::data_objects::{PricePoint, Variant};

/// Converts a JSON price to cents, rounding half-to-even the way the quotes are published. Values that are not finite
/// numbers give `None`.
pub fn to_price(value: Option<f64>) -> Option<Decimal> {
    let value = value?;
    let price = Decimal::from_str(&value.to_string()).ok()?;
    let mut price = price.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    price.rescale(2);
    Some(price)
}

/// The market data of one variant, flattened and converted to [`Decimal`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantPrices {
    pub price: Option<Decimal>,
    pub condition: Option<String>,
    pub printing: Option<String>,
    pub sku_id: Option<String>,
    /// Percentage moves over the last day, week and month.
    pub price_change_24h: Option<Decimal>,
    pub price_change_7d: Option<Decimal>,
    pub price_change_30d: Option<Decimal>,
    pub avg_price_7d: Option<Decimal>,
    pub min_price_7d: Option<Decimal>,
    pub max_price_7d: Option<Decimal>,
    pub price_history: Vec<PricePoint>,
}

pub fn extract_prices(variant: &Variant) -> VariantPrices {
    VariantPrices {
        price: to_price(variant.price),
        condition: variant.condition.clone(),
        printing: variant.printing.clone(),
        sku_id: variant.tcgplayer_sku_id.clone(),
        price_change_24h: to_price(variant.price_change_24hr),
        price_change_7d: to_price(variant.price_change_7d),
        price_change_30d: to_price(variant.price_change_30d),
        avg_price_7d: to_price(variant.avg_price_7d),
        min_price_7d: to_price(variant.min_price_7d),
        max_price_7d: to_price(variant.max_price_7d),
        price_history: variant.price_history.clone(),
    }
}

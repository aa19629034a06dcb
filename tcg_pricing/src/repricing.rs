use std::{fmt::Display, str::FromStr};

use log::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{error::PricingError, inventory_csv::InventoryRow};

/// No listing is ever priced below one cent.
pub const ABSOLUTE_MINIMUM: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepricingStrategy {
    /// Match the lowest listing on TCGplayer.
    MatchLow,
    /// Undercut the lowest listing by a percentage.
    Undercut,
    /// Match the TCGplayer market price.
    MatchMarket,
}

impl Display for RepricingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchLow => write!(f, "match_low"),
            Self::Undercut => write!(f, "undercut"),
            Self::MatchMarket => write!(f, "match_market"),
        }
    }
}

impl FromStr for RepricingStrategy {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "match_low" => Ok(Self::MatchLow),
            "undercut" => Ok(Self::Undercut),
            "match_market" => Ok(Self::MatchMarket),
            _ => Err(PricingError::UnknownStrategy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepricingSettings {
    pub strategy: RepricingStrategy,
    /// Percentage taken off the TCG low price by [`RepricingStrategy::Undercut`]. Treated as zero if absent.
    pub undercut_pct: Option<Decimal>,
    /// The lowest price the seller will accept.
    pub floor_price: Option<Decimal>,
}

impl RepricingSettings {
    pub fn new(strategy: RepricingStrategy) -> Self {
        Self { strategy, undercut_pct: None, floor_price: None }
    }

    pub fn with_undercut_pct(mut self, pct: Decimal) -> Self {
        self.undercut_pct = Some(pct);
        self
    }

    pub fn with_floor_price(mut self, floor: Decimal) -> Self {
        self.floor_price = Some(floor);
        self
    }
}

/// Tally of one [`reprice_rows`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepriceSummary {
    /// Rows whose price changed.
    pub repriced: usize,
    /// Rows that were priced, but landed on the price they already had.
    pub unchanged: usize,
    /// Rows with no market data. Their price is left alone.
    pub skipped: usize,
    /// Rows whose new price could not be calculated. Their price is left alone.
    pub failed: usize,
}

fn to_cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Calculates a new listing price from the TCGplayer market data.
///
/// The floor price is applied after the strategy, and the result never drops below [`ABSOLUTE_MINIMUM`]. The returned
/// value always carries exactly two decimal places, rounded half-up.
///
/// Returns [`PricingError::Overflow`] if an undercut percentage pushes the price out of range.
pub fn calculate_price(
    current_price: Decimal,
    tcg_low: Decimal,
    market_price: Decimal,
    strategy: RepricingStrategy,
    undercut_pct: Option<Decimal>,
    floor_price: Option<Decimal>,
) -> Result<Decimal, PricingError> {
    let mut new_price = match strategy {
        RepricingStrategy::MatchLow => tcg_low,
        RepricingStrategy::Undercut => {
            let pct = undercut_pct.unwrap_or(Decimal::ZERO);
            let undercut = pct
                .checked_div(Decimal::ONE_HUNDRED)
                .and_then(|p| Decimal::ONE.checked_sub(p))
                .and_then(|multiplier| tcg_low.checked_mul(multiplier))
                .ok_or_else(|| PricingError::Overflow(format!("{tcg_low} undercut by {pct}%")))?;
            to_cents(undercut)
        },
        RepricingStrategy::MatchMarket => market_price,
    };
    if let Some(floor) = floor_price {
        if new_price < floor {
            new_price = floor;
        }
    }
    if new_price < ABSOLUTE_MINIMUM {
        new_price = ABSOLUTE_MINIMUM;
    }
    let new_price = to_cents(new_price);
    trace!("Repriced {current_price} -> {new_price} ({strategy})");
    Ok(new_price)
}

/// Reprices every row in place, writing the new price into [`InventoryRow::current_listed_price`].
///
/// Rows with neither a TCG low nor a market price keep whatever price they had, as do rows whose price cannot be
/// calculated.
pub fn reprice_rows(rows: &mut [InventoryRow], settings: &RepricingSettings) -> RepriceSummary {
    let mut summary = RepriceSummary::default();
    for row in rows.iter_mut() {
        let tcg_low = row.tcg_low.unwrap_or(Decimal::ZERO);
        let market = row.market_price.unwrap_or(Decimal::ZERO);
        if tcg_low.is_zero() && market.is_zero() {
            debug!("No market data for {} ({}). Keeping its current price.", row.product_name, row.sku_id);
            summary.skipped += 1;
            continue;
        }
        let current = row.current_listed_price.unwrap_or(Decimal::ZERO);
        let result = calculate_price(
            current,
            tcg_low,
            market,
            settings.strategy,
            settings.undercut_pct,
            settings.floor_price,
        );
        let new_price = match result {
            Ok(price) => price,
            Err(e) => {
                warn!("Could not reprice {} ({}). {e}", row.product_name, row.sku_id);
                summary.failed += 1;
                continue;
            },
        };
        if new_price == current {
            summary.unchanged += 1;
        } else {
            summary.repriced += 1;
        }
        row.current_listed_price = Some(new_price);
    }
    info!(
        "Repriced {} rows with {}. {} unchanged, {} without market data, {} failed",
        summary.repriced, settings.strategy, summary.unchanged, summary.skipped, summary.failed
    );
    summary
}

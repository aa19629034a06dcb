use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tcg_pricing::{
    evaluate_alert,
    ingestion::parse_card,
    justtcg::{BatchItem, Card, CardSource},
    AlertDirection,
};

use crate::{
    db_types::{BasisPoints, Cents, NewPriceAlert, PriceAlert, PriceHistoryEntry, WatchedAlert, WatchlistItem},
    lp_api::errors::PriceTrackerError,
    traits::PriceTracking,
};

/// Products are looked up this many at a time during a refresh.
pub const REFRESH_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub updated: usize,
    pub errors: usize,
}

impl IngestSummary {
    fn add(&mut self, other: IngestSummary) {
        self.updated += other.updated;
        self.errors += other.errors;
    }
}

/// An alert that fired during [`PriceTrackerApi::check_alerts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub alert_id: i64,
    pub product_id: i64,
    pub variant: String,
    pub old_price: Cents,
    pub new_price: Cents,
    pub threshold: BasisPoints,
    pub direction: AlertDirection,
    pub triggered_at: DateTime<Utc>,
}

/// `PriceTrackerApi` keeps market prices for tracked products up to date and raises watch-list price alerts.
pub struct PriceTrackerApi<B> {
    db: B,
}

impl<B> Debug for PriceTrackerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PriceTrackerApi")
    }
}

impl<B> PriceTrackerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PriceTrackerApi<B>
where B: PriceTracking
{
    /// Stores one card. Returns false, storing nothing, if the card has no usable TCGplayer id.
    pub async fn ingest_card(&self, card: &Card, now: DateTime<Utc>) -> Result<bool, PriceTrackerError> {
        let Some(records) = parse_card(card) else {
            debug!("💹️ {} has no TCGplayer id. Skipping it.", card.name);
            return Ok(false);
        };
        self.db.store_card(&records, now.date_naive(), now).await?;
        Ok(true)
    }

    /// Stores each card in its own transaction, so one bad card does not lose the rest.
    pub async fn ingest_batch(&self, cards: &[Card], now: DateTime<Utc>) -> IngestSummary {
        let mut summary = IngestSummary::default();
        for card in cards {
            match self.ingest_card(card, now).await {
                Ok(true) => summary.updated += 1,
                Ok(false) => summary.errors += 1,
                Err(e) => {
                    warn!("💹️ Could not store {}. {e}", card.name);
                    summary.errors += 1;
                },
            }
        }
        summary
    }

    /// Looks up the given TCGplayer ids and stores whatever comes back. This is how new products start being tracked.
    pub async fn track<S: CardSource>(
        &self,
        source: &S,
        tcgplayer_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<IngestSummary, PriceTrackerError> {
        let mut summary = IngestSummary::default();
        for batch in tcgplayer_ids.chunks(REFRESH_BATCH_SIZE) {
            let items = batch.iter().map(BatchItem::new).collect::<Vec<_>>();
            let response = source.batch_lookup(&items).await?;
            summary.add(self.ingest_batch(&response.data, now).await);
        }
        Ok(summary)
    }

    /// Fetches fresh prices for every tracked product, [`REFRESH_BATCH_SIZE`] at a time.
    ///
    /// A batch that fails to download counts every product in it as an error, and the refresh moves on to the next
    /// batch.
    pub async fn refresh_prices<S: CardSource>(
        &self,
        source: &S,
        now: DateTime<Utc>,
    ) -> Result<IngestSummary, PriceTrackerError> {
        let ids = self.db.fetch_product_ids().await?;
        if ids.is_empty() {
            info!("💹️ No tracked products to refresh");
            return Ok(IngestSummary::default());
        }
        info!("💹️ Refreshing prices for {} tracked products", ids.len());
        let mut summary = IngestSummary::default();
        for (n, batch) in ids.chunks(REFRESH_BATCH_SIZE).enumerate() {
            let items = batch.iter().map(|id| BatchItem::new(id.to_string())).collect::<Vec<_>>();
            match source.batch_lookup(&items).await {
                Ok(response) => {
                    let result = self.ingest_batch(&response.data, now).await;
                    let remaining = response
                        .metadata
                        .and_then(|m| m.api_requests_remaining)
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "?".into());
                    info!(
                        "💹️ Batch {}: {} updated, {} errors. {remaining} API requests remaining",
                        n + 1,
                        result.updated,
                        result.errors
                    );
                    summary.add(result);
                },
                Err(e) => {
                    error!("💹️ Batch {} failed. {e}", n + 1);
                    summary.errors += batch.len();
                },
            }
        }
        info!("💹️ Refresh complete. {}/{} updated, {} errors", summary.updated, ids.len(), summary.errors);
        Ok(summary)
    }

    /// Compares each armed alert's current market price against the previous day's and fires those that cross their
    /// threshold.
    ///
    /// Only alerts on active watch list items that have never fired are considered. Variants without a current price,
    /// or without an earlier history entry, are skipped, as are zero prices. Each alert fires at most once.
    pub async fn check_alerts(&self, now: DateTime<Utc>) -> Result<Vec<TriggeredAlert>, PriceTrackerError> {
        let armed = self.db.fetch_armed_alerts().await?;
        let mut triggered = Vec::new();
        for WatchedAlert { alert, product_id, variant } in armed {
            let current = self.db.fetch_current_price(product_id, &variant).await?;
            let Some(new_price) = current.and_then(|p| p.market_price).filter(|p| !p.is_zero()) else {
                trace!("💹️ No current price for {product_id} ({variant}). Skipping alert {}", alert.id);
                continue;
            };
            let history = self.db.fetch_price_history(product_id, &variant).await?;
            let Some(old_price) = history.get(1).and_then(|h| h.market_price).filter(|p| !p.is_zero()) else {
                trace!("💹️ No earlier price for {product_id} ({variant}). Skipping alert {}", alert.id);
                continue;
            };
            let threshold = alert.threshold_bps.to_percent();
            if !evaluate_alert(old_price.to_decimal(), new_price.to_decimal(), threshold, alert.direction) {
                continue;
            }
            if !self.db.mark_alert_triggered(alert.id, now).await? {
                debug!("💹️ Alert {} was already triggered elsewhere", alert.id);
                continue;
            }
            info!("💹️ Alert {} fired. {product_id} ({variant}) moved {old_price} -> {new_price}", alert.id);
            triggered.push(TriggeredAlert {
                alert_id: alert.id,
                product_id,
                variant,
                old_price,
                new_price,
                threshold: alert.threshold_bps,
                direction: alert.direction,
                triggered_at: now,
            });
        }
        Ok(triggered)
    }

    /// Puts a tracked product variant on the watch list.
    pub async fn watch(
        &self,
        product_id: i64,
        variant: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WatchlistItem, PriceTrackerError> {
        let item = self.db.add_watchlist_item(product_id, variant, notes, now).await?;
        Ok(item)
    }

    pub async fn unwatch(&self, watchlist_id: i64) -> Result<(), PriceTrackerError> {
        self.db.deactivate_watchlist_item(watchlist_id).await?;
        Ok(())
    }

    pub async fn watchlist(&self) -> Result<Vec<WatchlistItem>, PriceTrackerError> {
        Ok(self.db.fetch_watchlist().await?)
    }

    /// Adds an alert to a watch list item. The threshold is a percentage and may not be negative.
    pub async fn add_alert(
        &self,
        watchlist_id: i64,
        threshold_pct: Decimal,
        direction: AlertDirection,
        time_window: Option<&str>,
    ) -> Result<PriceAlert, PriceTrackerError> {
        if threshold_pct.is_sign_negative() {
            return Err(PriceTrackerError::InvalidThreshold(format!("{threshold_pct}% is negative")));
        }
        let threshold =
            BasisPoints::from_percent(threshold_pct).map_err(|e| PriceTrackerError::InvalidThreshold(e.to_string()))?;
        let mut alert = NewPriceAlert::new(watchlist_id, threshold, direction);
        if let Some(window) = time_window {
            alert = alert.with_time_window(window);
        }
        Ok(self.db.insert_price_alert(alert).await?)
    }

    pub async fn triggered_alerts(&self) -> Result<Vec<WatchedAlert>, PriceTrackerError> {
        Ok(self.db.fetch_triggered_alerts().await?)
    }

    pub async fn acknowledge(&self, alert_id: i64) -> Result<(), PriceTrackerError> {
        self.db.acknowledge_alert(alert_id).await?;
        Ok(())
    }

    /// Daily market prices for a variant, newest first.
    pub async fn history(&self, product_id: i64, variant: &str) -> Result<Vec<PriceHistoryEntry>, PriceTrackerError> {
        Ok(self.db.fetch_price_history(product_id, variant).await?)
    }
}

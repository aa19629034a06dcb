use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::{
    config::JustTcgConfig,
    data_objects::{BatchItem, CardSet, CardsResponse, DataList, Game},
    error::JustTcgError,
};

/// Short game names accepted on the command line, and the JustTCG slug each maps to.
pub const GAME_SLUGS: [(&str, &str); 4] = [
    ("pokemon", "pokemon"),
    ("magic", "magic-the-gathering"),
    ("onepiece", "one-piece-card-game"),
    ("lorcana", "disney-lorcana"),
];

/// Resolves a short game name (`magic`) or a full slug (`magic-the-gathering`) to the JustTCG slug.
pub fn game_slug(game: &str) -> Result<&'static str, JustTcgError> {
    let game = game.trim().to_lowercase();
    GAME_SLUGS
        .iter()
        .find(|(short, slug)| *short == game || *slug == game)
        .map(|(_, slug)| *slug)
        .ok_or(JustTcgError::UnknownGame(game))
}

/// How to identify a single card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardLookup {
    TcgplayerId(String),
    CardId(String),
}

/// Anything that can look up current market data for a batch of TCGplayer products.
#[allow(async_fn_in_trait)]
pub trait CardSource {
    async fn batch_lookup(&self, items: &[BatchItem]) -> Result<CardsResponse, JustTcgError>;
}

#[derive(Clone)]
pub struct JustTcgClient {
    config: JustTcgConfig,
    client: Arc<Client>,
}

impl JustTcgClient {
    pub fn new(config: JustTcgConfig) -> Result<Self, JustTcgError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| JustTcgError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, JustTcgError> {
        if !self.config.is_enabled() {
            return Err(JustTcgError::Disabled);
        }
        let response = request
            .header("x-api-key", self.config.api_key.reveal())
            .send()
            .await
            .map_err(|e| JustTcgError::Connection(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(JustTcgError::Rejected { status: status.as_u16(), message });
        }
        trace!("💹️ JustTCG answered {status}");
        response.json::<T>().await.map_err(|e| JustTcgError::InvalidResponse(e.to_string()))
    }

    pub async fn get_games(&self) -> Result<Vec<Game>, JustTcgError> {
        let games = self.send::<DataList<Game>>(self.client.get(self.url("/games"))).await?;
        Ok(games.data)
    }

    /// Lists the sets of a game, optionally filtered by a name search.
    pub async fn get_sets(&self, game: &str, query: Option<&str>) -> Result<Vec<CardSet>, JustTcgError> {
        let mut params = vec![("game", game_slug(game)?)];
        if let Some(q) = query.filter(|q| !q.trim().is_empty()) {
            params.push(("q", q));
        }
        let sets = self.send::<DataList<CardSet>>(self.client.get(self.url("/sets")).query(&params)).await?;
        Ok(sets.data)
    }

    /// Searches a game's cards by name. Results include a week of price history.
    pub async fn search_cards(&self, game: &str, query: &str) -> Result<CardsResponse, JustTcgError> {
        let params = [
            ("q", query),
            ("game", game_slug(game)?),
            ("include_price_history", "true"),
            ("priceHistoryDuration", "7d"),
        ];
        let cards = self.send::<CardsResponse>(self.client.get(self.url("/cards")).query(&params)).await?;
        debug!("💹️ Search for '{query}' found {} cards", cards.data.len());
        Ok(cards)
    }

    /// Fetches one card with 30 days of price history.
    pub async fn get_card(&self, lookup: &CardLookup) -> Result<CardsResponse, JustTcgError> {
        let id_param = match lookup {
            CardLookup::TcgplayerId(id) => ("tcgplayerId", id.as_str()),
            CardLookup::CardId(id) => ("cardId", id.as_str()),
        };
        let params = [("include_price_history", "true"), ("priceHistoryDuration", "30d"), id_param];
        self.send(self.client.get(self.url("/cards")).query(&params)).await
    }

    /// Looks up many products in one request.
    pub async fn batch_lookup(&self, items: &[BatchItem]) -> Result<CardsResponse, JustTcgError> {
        let cards = self.send::<CardsResponse>(self.client.post(self.url("/cards")).json(items)).await?;
        if let Some(usage) = cards.metadata {
            debug!(
                "💹️ Batch of {} returned {} cards. {} requests left today",
                items.len(),
                cards.data.len(),
                usage.api_daily_requests_remaining.map(|n| n.to_string()).unwrap_or_else(|| "?".into())
            );
        }
        Ok(cards)
    }
}

impl CardSource for JustTcgClient {
    async fn batch_lookup(&self, items: &[BatchItem]) -> Result<CardsResponse, JustTcgError> {
        JustTcgClient::batch_lookup(self, items).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn game_slugs() {
        assert_eq!(game_slug("magic").unwrap(), "magic-the-gathering");
        assert_eq!(game_slug("Disney-Lorcana").unwrap(), "disney-lorcana");
        assert_eq!(game_slug(" pokemon ").unwrap(), "pokemon");
        assert!(matches!(game_slug("yugioh"), Err(JustTcgError::UnknownGame(_))));
    }
}

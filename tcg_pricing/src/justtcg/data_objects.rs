use serde::{Deserialize, Deserializer, Serialize};

/// JustTCG returns ids as strings, but older responses and some batch results carry bare numbers.
fn id_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }
    let id = Option::<RawId>::deserialize(de)?.and_then(|raw| match raw {
        RawId::Text(s) if s.trim().is_empty() => None,
        RawId::Text(s) => Some(s.trim().to_string()),
        RawId::Number(n) => Some(n.to_string()),
    });
    Ok(id)
}

/// The envelope around every card listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardsResponse {
    #[serde(default)]
    pub data: Vec<Card>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
    #[serde(rename = "_metadata", default)]
    pub metadata: Option<ApiUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    pub id: String,
    pub name: String,
    /// The JustTCG game slug, e.g. `magic-the-gathering`.
    pub game: String,
    pub set: String,
    pub set_name: Option<String>,
    pub number: Option<String>,
    pub rarity: Option<String>,
    #[serde(rename = "tcgplayerId", deserialize_with = "id_string")]
    pub tcgplayer_id: Option<String>,
    pub image: Option<String>,
    pub variants: Vec<Variant>,
}

/// One condition and printing of a card, with its market data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub condition: Option<String>,
    pub printing: Option<String>,
    #[serde(deserialize_with = "id_string")]
    pub tcgplayer_sku_id: Option<String>,
    pub price: Option<f64>,
    pub price_change_24hr: Option<f64>,
    pub price_change_7d: Option<f64>,
    pub price_change_30d: Option<f64>,
    pub avg_price_7d: Option<f64>,
    pub min_price_7d: Option<f64>,
    pub max_price_7d: Option<f64>,
    /// Unix seconds.
    pub last_updated: Option<i64>,
    pub price_history: Vec<PricePoint>,
}

/// A price (`p`) observed at unix time `t`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub p: f64,
    pub t: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

/// Remaining request quota, as reported by JustTCG on every response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiUsage {
    pub api_requests_remaining: Option<i64>,
    pub api_daily_requests_remaining: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardSet {
    pub id: String,
    pub name: String,
}

/// The `{"data": [...]}` wrapper used by the games and sets endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// One entry in a batch lookup request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(rename = "tcgplayerId")]
    pub tcgplayer_id: String,
}

impl BatchItem {
    pub fn new<S: Into<String>>(tcgplayer_id: S) -> Self {
        Self { tcgplayer_id: tcgplayer_id.into() }
    }
}

//! Turns JustTCG card listings into the product, SKU and price records the price tracker stores.
//!
//! Products are keyed by their TCGplayer product id. Cards without one cannot be tracked and are dropped.
use log::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::justtcg::{to_price, Card};

/// Recorded against every price that comes from JustTCG.
pub const PRICE_SOURCE: &str = "justtcg";
const DEFAULT_PRINTING: &str = "Normal";
const DEFAULT_CONDITION: &str = "Near Mint";
const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameCategory {
    pub category_id: i64,
    pub name: &'static str,
    pub display_name: &'static str,
}

/// TCGplayer categories, keyed by JustTCG game slug.
pub const GAME_CATEGORIES: [(&str, GameCategory); 4] = [
    ("pokemon", GameCategory { category_id: 1, name: "pokemon", display_name: "Pokemon" }),
    ("magic-the-gathering", GameCategory { category_id: 2, name: "magic", display_name: "Magic: The Gathering" }),
    ("one-piece-card-game", GameCategory { category_id: 3, name: "onepiece", display_name: "One Piece" }),
    ("disney-lorcana", GameCategory { category_id: 4, name: "lorcana", display_name: "Disney Lorcana" }),
];

/// Unrecognised games are filed under Pokemon.
pub fn category_for_game(game: &str) -> GameCategory {
    GAME_CATEGORIES
        .iter()
        .find(|(slug, _)| *slug == game)
        .map(|(_, category)| *category)
        .unwrap_or(GAME_CATEGORIES[0].1)
}

/// Lower-cased name with everything but ASCII letters, digits and spaces removed.
pub fn clean_name(name: &str) -> String {
    let kept = name.chars().filter(|c| c.is_ascii_alphanumeric() || *c == ' ').collect::<String>();
    kept.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: i64,
    pub category_id: i64,
    pub name: String,
    pub clean_name: String,
    pub image_url: Option<String>,
    pub number: Option<String>,
    pub rarity: Option<String>,
    pub product_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub sku_id: i64,
    pub product_id: i64,
    pub variant: String,
    pub condition: String,
    pub language: String,
}

/// The latest prices of one product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub product_id: i64,
    pub variant: String,
    pub market_price: Option<Decimal>,
    /// The 7-day minimum.
    pub low_price: Option<Decimal>,
    /// The 7-day average.
    pub mid_price: Option<Decimal>,
    pub source: String,
}

/// Everything one card contributes to the price tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardRecords {
    pub category: GameCategory,
    pub product: ProductRecord,
    pub skus: Vec<SkuRecord>,
    pub prices: Vec<PriceRecord>,
}

/// `None` if the card cannot be tracked because it has no usable TCGplayer id.
pub fn parse_card(card: &Card) -> Option<CardRecords> {
    let product = parse_product(card)?;
    Some(CardRecords {
        category: category_for_game(&card.game),
        product,
        skus: parse_skus(card),
        prices: parse_current_prices(card),
    })
}

fn product_id(card: &Card) -> Option<i64> {
    let id = card.tcgplayer_id.as_deref()?;
    match id.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("💹️ {} has a non-numeric TCGplayer id '{id}'. Ignoring it.", card.name);
            None
        },
    }
}

/// `None` if the card has no usable TCGplayer id.
pub fn parse_product(card: &Card) -> Option<ProductRecord> {
    let product_id = product_id(card)?;
    Some(ProductRecord {
        product_id,
        category_id: category_for_game(&card.game).category_id,
        name: card.name.clone(),
        clean_name: clean_name(&card.name),
        image_url: card.image.clone(),
        number: card.number.clone(),
        rarity: card.rarity.clone(),
        product_type: "single".to_string(),
    })
}

/// One SKU per variant. Variants without a SKU id are skipped.
pub fn parse_skus(card: &Card) -> Vec<SkuRecord> {
    let Some(product_id) = product_id(card) else {
        return Vec::new();
    };
    card.variants
        .iter()
        .filter_map(|v| {
            let sku_id = v.tcgplayer_sku_id.as_deref()?.parse::<i64>().ok()?;
            Some(SkuRecord {
                sku_id,
                product_id,
                variant: v.printing.clone().unwrap_or_else(|| DEFAULT_PRINTING.to_string()),
                condition: v.condition.clone().unwrap_or_else(|| DEFAULT_CONDITION.to_string()),
                language: DEFAULT_LANGUAGE.to_string(),
            })
        })
        .collect()
}

/// One price record per variant, whether or not it carries a SKU id.
pub fn parse_current_prices(card: &Card) -> Vec<PriceRecord> {
    let Some(product_id) = product_id(card) else {
        return Vec::new();
    };
    card.variants
        .iter()
        .map(|v| PriceRecord {
            product_id,
            variant: v.printing.clone().unwrap_or_else(|| DEFAULT_PRINTING.to_string()),
            market_price: to_price(v.price),
            low_price: to_price(v.min_price_7d),
            mid_price: to_price(v.avg_price_7d),
            source: PRICE_SOURCE.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;
    use crate::justtcg::Variant;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn charizard() -> Card {
        let variant = |printing: &str, sku: &str, price: f64, min: f64, avg: f64| Variant {
            condition: Some("Near Mint".into()),
            printing: Some(printing.into()),
            tcgplayer_sku_id: Some(sku.into()),
            price: Some(price),
            min_price_7d: Some(min),
            avg_price_7d: Some(avg),
            ..Default::default()
        };
        Card {
            id: "pokemon-sv08-charizard-ex-rare".into(),
            name: "Charizard ex".into(),
            game: "pokemon".into(),
            set: "sv08".into(),
            set_name: Some("Surging Sparks".into()),
            number: Some("006".into()),
            rarity: Some("Double Rare".into()),
            tcgplayer_id: Some("572189".into()),
            image: Some("https://example.com/charizard.jpg".into()),
            variants: vec![
                variant("Normal", "9876543", 12.5, 11.0, 13.0),
                variant("Foil", "9876544", 45.0, 40.0, 44.0),
            ],
        }
    }

    #[test]
    fn card_to_product() {
        let product = parse_product(&charizard()).unwrap();
        assert_eq!(product.product_id, 572189);
        assert_eq!(product.category_id, 1);
        assert_eq!(product.name, "Charizard ex");
        assert_eq!(product.clean_name, "charizard ex");
        assert_eq!(product.rarity.as_deref(), Some("Double Rare"));
        assert_eq!(product.image_url.as_deref(), Some("https://example.com/charizard.jpg"));
        assert_eq!(product.product_type, "single");
    }

    #[test]
    fn cards_without_a_tcgplayer_id_are_dropped() {
        let card = Card { tcgplayer_id: None, ..charizard() };
        assert!(parse_product(&card).is_none());
        assert!(parse_skus(&card).is_empty());
        assert!(parse_current_prices(&card).is_empty());
        let card = Card { tcgplayer_id: Some("sv08-006".into()), ..charizard() };
        assert!(parse_product(&card).is_none());
    }

    #[test]
    fn variants_to_skus() {
        let mut card = charizard();
        card.variants.push(Variant { printing: Some("Reverse Holo".into()), ..Default::default() });
        let skus = parse_skus(&card);
        assert_eq!(skus.len(), 2);
        assert_eq!(skus[0].sku_id, 9876543);
        assert_eq!(skus[0].product_id, 572189);
        assert_eq!(skus[0].variant, "Normal");
        assert_eq!(skus[0].language, "English");
        assert_eq!(skus[1].variant, "Foil");
    }

    #[test]
    fn variant_prices() {
        let mut card = charizard();
        card.variants.push(Variant::default());
        let prices = parse_current_prices(&card);
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].market_price, Some(d("12.50")));
        assert_eq!(prices[0].low_price, Some(d("11.00")));
        assert_eq!(prices[0].mid_price, Some(d("13.00")));
        assert_eq!(prices[0].source, "justtcg");
        assert_eq!(prices[1].variant, "Foil");
        assert_eq!(prices[2].variant, "Normal");
        assert_eq!(prices[2].market_price, None);
    }

    #[test]
    fn whole_card() {
        let card = Card { game: "disney-lorcana".into(), ..charizard() };
        let records = parse_card(&card).unwrap();
        assert_eq!(records.category.display_name, "Disney Lorcana");
        assert_eq!(records.product.category_id, 4);
        assert_eq!(records.skus.len(), 2);
        assert_eq!(records.prices.len(), 2);
        assert!(parse_card(&Card { tcgplayer_id: None, ..card }).is_none());
    }

    #[test]
    fn categories_and_names() {
        assert_eq!(category_for_game("disney-lorcana").category_id, 4);
        assert_eq!(category_for_game("magic-the-gathering").display_name, "Magic: The Gathering");
        assert_eq!(category_for_game("digimon").name, "pokemon");
        assert_eq!(clean_name("  Sheoldred, the Apocalypse! "), "sheoldred the apocalypse");
        assert_eq!(clean_name("Pokémon Center ETB"), "pokmon center etb");
    }
}

//! Decklist parsing
//!
//! Customers paste decklists in whatever format their deck builder exports. The parser accepts the common shapes:
//!
//! ```text
//! 4 Lightning Bolt
//! 4x Counterspell
//! 1 Sol Ring (C21) 263
//! Sideboard
//! 2 Pyroblast *F*
//! ```
//!
//! Blank lines, `//` and `#` comments, and section headers (`Deck`, `Sideboard:`, `Commander` ...) are skipped. A line
//! without a leading quantity counts as a single copy.
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::db_types::NewOrderItem;

/// Upper bound on copies of one card per line. Anything bigger is a typo.
pub const MAX_QUANTITY: i64 = 999;

const SECTION_HEADERS: [&str; 8] =
    ["deck", "main", "mainboard", "sideboard", "commander", "companion", "maybeboard", "tokens"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecklistError {
    #[error("The decklist does not contain any cards")]
    Empty,
    #[error("Line {line}: quantity {quantity} is out of range (1-{MAX_QUANTITY})")]
    InvalidQuantity { line: usize, quantity: String },
    #[error("Line {0}: no card name found")]
    MissingCardName(usize),
}

fn line_regex() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^(?:(?P<qty>\d+)\s*[xX]?\s+)?                      # 4, 4x, 4 x
            (?P<name>.+?)
            (?:\s+\((?P<set>[A-Za-z0-9]{2,6})\)                 # (C21)
               (?:\s+(?P<num>[A-Za-z0-9-]+))?)?                # 263
            (?:\s+\*[A-Za-z]+\*)?$                             # *F*
            ",
        )
        .expect("decklist line regex is valid")
    })
}

fn is_section_header(line: &str) -> bool {
    let header = line.trim_end_matches(':').trim().to_ascii_lowercase();
    SECTION_HEADERS.contains(&header.as_str())
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with('#')
}

/// Parses a pasted decklist into order line items, in the order they appear.
pub fn parse_decklist(text: &str) -> Result<Vec<NewOrderItem>, DecklistError> {
    let mut items = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || is_comment(line) || is_section_header(line) {
            continue;
        }
        let line = line.strip_prefix("SB:").map(str::trim).unwrap_or(line);
        let caps = line_regex().captures(line).ok_or(DecklistError::MissingCardName(line_no))?;
        let quantity = match caps.name("qty") {
            Some(q) => q.as_str().parse::<i64>().ok().filter(|q| (1..=MAX_QUANTITY).contains(q)).ok_or_else(|| {
                DecklistError::InvalidQuantity { line: line_no, quantity: q.as_str().to_string() }
            })?,
            None => 1,
        };
        let card_name = caps.name("name").map(|m| m.as_str().trim()).unwrap_or_default();
        if card_name.is_empty() {
            return Err(DecklistError::MissingCardName(line_no));
        }
        items.push(NewOrderItem {
            quantity,
            card_name: card_name.to_string(),
            set_code: caps.name("set").map(|m| m.as_str().to_ascii_uppercase()),
            collector_number: caps.name("num").map(|m| m.as_str().to_string()),
        });
    }
    if items.is_empty() {
        return Err(DecklistError::Empty);
    }
    Ok(items)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_and_x_quantities() {
        let items = parse_decklist("4 Lightning Bolt\n4x Counterspell\n2X Brainstorm").unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], NewOrderItem::new(4, "Lightning Bolt"));
        assert_eq!(items[1], NewOrderItem::new(4, "Counterspell"));
        assert_eq!(items[2], NewOrderItem::new(2, "Brainstorm"));
    }

    #[test]
    fn set_codes_and_collector_numbers() {
        let items = parse_decklist("1 Sol Ring (c21) 263\n1 Atraxa, Praetors' Voice (CM2)\n1 Pyroblast (ICE) 213 *F*")
            .unwrap();
        assert_eq!(items[0].card_name, "Sol Ring");
        assert_eq!(items[0].set_code.as_deref(), Some("C21"));
        assert_eq!(items[0].collector_number.as_deref(), Some("263"));
        assert_eq!(items[1].card_name, "Atraxa, Praetors' Voice");
        assert_eq!(items[1].set_code.as_deref(), Some("CM2"));
        assert_eq!(items[1].collector_number, None);
        assert_eq!(items[2].card_name, "Pyroblast");
        assert_eq!(items[2].collector_number.as_deref(), Some("213"));
    }

    #[test]
    fn comments_and_headers_are_skipped() {
        let list = "// Burn\nDeck\n4 Lightning Bolt\n\n# sideboard below\nSideboard:\n2 Smash to Smithereens\nSB: 1 \
                    Pyroblast";
        let items = parse_decklist(list).unwrap();
        let names = items.iter().map(|i| i.card_name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Lightning Bolt", "Smash to Smithereens", "Pyroblast"]);
    }

    #[test]
    fn missing_quantity_means_one() {
        let items = parse_decklist("Black Lotus").unwrap();
        assert_eq!(items, vec![NewOrderItem::new(1, "Black Lotus")]);
    }

    #[test]
    fn empty_lists_are_rejected() {
        assert_eq!(parse_decklist(""), Err(DecklistError::Empty));
        assert_eq!(parse_decklist("  \n// nothing\nSideboard\n"), Err(DecklistError::Empty));
    }

    #[test]
    fn silly_quantities_are_rejected() {
        let err = parse_decklist("4 Island\n0 Forest").unwrap_err();
        assert_eq!(err, DecklistError::InvalidQuantity { line: 2, quantity: "0".into() });
        assert!(matches!(parse_decklist("5000 Swamp"), Err(DecklistError::InvalidQuantity { line: 1, .. })));
    }
}

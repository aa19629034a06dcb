//! TCGplayer inventory export format.
//!
//! The export has one row per SKU and condition. Price columns may be blank, which reads as `None`. Columns missing
//! from the file read as blank, so exports from older seller portals still load. The same goes for rows with
//! trailing cells cut off.
use std::str::FromStr;

use log::*;
use rust_decimal::Decimal;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PricingError;

/// Column headers, in the order TCGplayer expects them on upload.
pub const CSV_HEADERS: [&str; 16] = [
    "TCGplayer Id",
    "Product Line",
    "Set Name",
    "Product Name",
    "Title",
    "Number",
    "Rarity",
    "Condition",
    "TCG Market Price",
    "TCG Direct Low",
    "TCG Low Price With Shipping",
    "TCG Low Price",
    "Total Quantity",
    "Add to Quantity",
    "TCG Marketplace Price",
    "Photo URL",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    #[serde(rename = "TCGplayer Id", default)]
    pub sku_id: String,
    #[serde(rename = "Product Line", default)]
    pub product_line: String,
    #[serde(rename = "Set Name", default)]
    pub set_name: String,
    #[serde(rename = "Product Name", default)]
    pub product_name: String,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Number", default)]
    pub number: String,
    #[serde(rename = "Rarity", default)]
    pub rarity: String,
    #[serde(rename = "Condition", default)]
    pub condition: String,
    #[serde(rename = "TCG Market Price", default, deserialize_with = "read_price", serialize_with = "write_price")]
    pub market_price: Option<Decimal>,
    #[serde(rename = "TCG Direct Low", default, deserialize_with = "read_price", serialize_with = "write_price")]
    pub direct_low: Option<Decimal>,
    #[serde(
        rename = "TCG Low Price With Shipping",
        default,
        deserialize_with = "read_price",
        serialize_with = "write_price"
    )]
    pub tcg_low_with_shipping: Option<Decimal>,
    #[serde(rename = "TCG Low Price", default, deserialize_with = "read_price", serialize_with = "write_price")]
    pub tcg_low: Option<Decimal>,
    #[serde(rename = "Total Quantity", default)]
    pub total_quantity: String,
    #[serde(rename = "Add to Quantity", default)]
    pub add_to_quantity: String,
    /// The seller's listed price. This is the column that repricing rewrites.
    #[serde(rename = "TCG Marketplace Price", default, deserialize_with = "read_price", serialize_with = "write_price")]
    pub current_listed_price: Option<Decimal>,
    #[serde(rename = "Photo URL", default)]
    pub photo_url: String,
}

fn read_price<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Decimal>, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Decimal::from_str(s).map(Some).map_err(|e| D::Error::custom(format!("'{s}' is not a price. {e}"))),
    }
}

fn write_price<S: Serializer>(price: &Option<Decimal>, ser: S) -> Result<S::Ok, S::Error> {
    match price {
        Some(p) => ser.serialize_str(&p.to_string()),
        None => ser.serialize_str(""),
    }
}

/// Reads a TCGplayer inventory export. A leading byte order mark is ignored, and short rows read their missing cells
/// as blank.
pub fn parse_csv(csv_content: &str) -> Result<Vec<InventoryRow>, PricingError> {
    let content = csv_content.strip_prefix('\u{feff}').unwrap_or(csv_content);
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(content.as_bytes());
    let rows = reader.deserialize::<InventoryRow>().collect::<Result<Vec<_>, _>>()?;
    debug!("Read {} inventory rows", rows.len());
    Ok(rows)
}

/// Writes rows back out with TCGplayer's headers, ready to upload. The header line is written even if there are no
/// rows.
pub fn generate_csv(rows: &[InventoryRow]) -> Result<String, PricingError> {
    let write_err = |e: csv::Error| PricingError::CsvWriteError(e.to_string());
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(write_err)?;
    for row in rows {
        writer.serialize(row).map_err(write_err)?;
    }
    let bytes = writer.into_inner().map_err(|e| PricingError::CsvWriteError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| PricingError::CsvWriteError(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{reprice_rows, RepricingSettings, RepricingStrategy};

    const EXPORT: &str = "TCGplayer Id,Product Line,Set Name,Product Name,Title,Number,Rarity,Condition,TCG Market \
                          Price,TCG Direct Low,TCG Low Price With Shipping,TCG Low Price,Total Quantity,Add to \
                          Quantity,TCG Marketplace Price,Photo URL\n9876543,Pokemon,Surging Sparks,Charizard \
                          ex,,006,Double Rare,Near Mint,14.00,,12.75,12.50,5,0,15.00,\n1234567,Magic: The \
                          Gathering,Dominaria United,\"Sheoldred, the Apocalypse\",,107,Mythic,Lightly \
                          Played,,,,,2,0,80.00,\n";

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parse_tcgplayer_export() {
        let rows = parse_csv(EXPORT).unwrap();
        assert_eq!(rows.len(), 2);
        let charizard = &rows[0];
        assert_eq!(charizard.sku_id, "9876543");
        assert_eq!(charizard.product_name, "Charizard ex");
        assert_eq!(charizard.number, "006");
        assert_eq!(charizard.current_listed_price, Some(d("15.00")));
        assert_eq!(charizard.market_price, Some(d("14.00")));
        assert_eq!(charizard.tcg_low, Some(d("12.50")));
        assert_eq!(charizard.direct_low, None);
        assert_eq!(charizard.total_quantity, "5");
        let sheoldred = &rows[1];
        assert_eq!(sheoldred.product_name, "Sheoldred, the Apocalypse");
        assert_eq!(sheoldred.tcg_low, None);
        assert_eq!(sheoldred.market_price, None);
    }

    #[test]
    fn byte_order_mark_and_missing_columns() {
        let rows = parse_csv("\u{feff}TCGplayer Id,TCG Low Price\n42, 1.25 \n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sku_id, "42");
        assert_eq!(rows[0].tcg_low, Some(d("1.25")));
        assert_eq!(rows[0].current_listed_price, None);
        assert_eq!(rows[0].photo_url, "");
    }

    #[test]
    fn short_rows_read_as_blank() {
        let export = "TCGplayer Id,Product Name,TCG Low Price,TCG Marketplace Price\n42,Pikachu,0.50,0.75\n43,Eevee\n";
        let rows = parse_csv(export).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].current_listed_price, Some(d("0.75")));
        assert_eq!(rows[1].sku_id, "43");
        assert_eq!(rows[1].product_name, "Eevee");
        assert_eq!(rows[1].tcg_low, None);
        assert_eq!(rows[1].current_listed_price, None);
    }

    #[test]
    fn bad_price_is_an_error() {
        let err = parse_csv("TCGplayer Id,TCG Low Price\n42,cheap\n").unwrap_err();
        assert!(matches!(err, PricingError::InvalidCsv(_)));
        assert!(err.to_string().contains("'cheap' is not a price"));
    }

    #[test]
    fn regenerate_with_new_prices() {
        let mut rows = parse_csv(EXPORT).unwrap();
        reprice_rows(&mut rows, &RepricingSettings::new(RepricingStrategy::MatchLow));
        let csv = generate_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "9876543,Pokemon,Surging Sparks,Charizard ex,,006,Double Rare,Near Mint,14.00,,12.75,12.50,5,0,12.50,"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1234567,Magic: The Gathering,Dominaria United,\"Sheoldred, the Apocalypse\",,107,Mythic,Lightly \
             Played,,,,,2,0,80.00,"
        );
        assert!(lines.next().is_none());
        let again = parse_csv(&csv).unwrap();
        assert_eq!(again, rows);
    }

    #[test]
    fn empty_inventory_still_has_headers() {
        let csv = generate_csv(&[]).unwrap();
        assert_eq!(csv, format!("{}\n", CSV_HEADERS.join(",")));
    }
}

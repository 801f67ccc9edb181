use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::error::ReconError;
use crate::price::parse_price;

/// Layout of a new-price file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NewPriceFormat {
    /// Comma-delimited with `SKU` and `Price` header columns.
    Keyed,
    /// Semicolon-delimited `Price;Shipping;Cost;SKU`, first line skipped.
    Positional,
}

impl NewPriceFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            Self::Keyed => b',',
            Self::Positional => b';',
        }
    }

    /// Semicolons mean the positional layout; anything else is read as keyed.
    pub fn from_delimiter(delimiter: u8) -> Self {
        if delimiter == b';' {
            Self::Positional
        } else {
            Self::Keyed
        }
    }
}

impl std::fmt::Display for NewPriceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyed => write!(f, "keyed"),
            Self::Positional => write!(f, "positional"),
        }
    }
}

impl std::str::FromStr for NewPriceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyed" => Ok(Self::Keyed),
            "positional" => Ok(Self::Positional),
            other => Err(format!("unknown price list format '{other}' (expected keyed or positional)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceEntry {
    pub price_cents: i64,
    pub shipping_cents: Option<i64>,
    pub cost_cents: Option<i64>,
}

/// A row dropped while loading because its price was unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line: u64,
    pub sku: String,
    pub value: String,
}

/// New prices keyed by SKU. Later rows for the same SKU win.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    entries: HashMap<String, PriceEntry>,
    pub rejected: Vec<RejectedRow>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(source: &str, content: &str, format: NewPriceFormat) -> Result<Self, ReconError> {
        match format {
            NewPriceFormat::Keyed => Self::from_keyed_csv(source, content),
            NewPriceFormat::Positional => Self::from_positional_csv(source, content),
        }
    }

    /// Comma-delimited, header row with `SKU` and `Price` columns.
    pub fn from_keyed_csv(source: &str, content: &str) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_err(source, e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let idx = |name: &str| -> Result<usize, ReconError> {
            headers.iter().position(|h| h == name).ok_or_else(|| ReconError::MissingColumn {
                source: source.into(),
                column: name.into(),
            })
        };
        let sku_idx = idx("SKU")?;
        let price_idx = idx("Price")?;

        let mut table = Self::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_err(source, e))?;
            if is_blank(&record) {
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let sku = record.get(sku_idx).unwrap_or("").trim().to_string();
            let raw_price = record.get(price_idx).unwrap_or("");
            table.push(source, line, sku, raw_price, None, None);
        }

        Ok(table)
    }

    /// Semicolon-delimited `Price;Shipping;Cost;SKU`; the first line is a
    /// header and skipped. Rows with fewer than four cells are ignored.
    pub fn from_positional_csv(source: &str, content: &str) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut table = Self::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_err(source, e))?;
            if record.len() < 4 || is_blank(&record) {
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let sku = record[3].trim().to_string();
            table.push(
                source,
                line,
                sku,
                &record[0],
                parse_price(&record[1]),
                parse_price(&record[2]),
            );
        }

        Ok(table)
    }

    fn push(
        &mut self,
        source: &str,
        line: u64,
        sku: String,
        raw_price: &str,
        shipping_cents: Option<i64>,
        cost_cents: Option<i64>,
    ) {
        match parse_price(raw_price) {
            Some(price_cents) => {
                self.entries.insert(
                    sku,
                    PriceEntry {
                        price_cents,
                        shipping_cents,
                        cost_cents,
                    },
                );
            }
            None => {
                warn!(source, line, sku = %sku, value = raw_price, "skipping row with unreadable price");
                self.rejected.push(RejectedRow {
                    line,
                    sku,
                    value: raw_price.to_string(),
                });
            }
        }
    }

    pub fn insert(&mut self, sku: impl Into<String>, price_cents: i64) {
        self.entries.insert(
            sku.into(),
            PriceEntry {
                price_cents,
                shipping_cents: None,
                cost_cents: None,
            },
        );
    }

    pub fn get(&self, sku: &str) -> Option<&PriceEntry> {
        self.entries.get(sku)
    }

    pub fn price(&self, sku: &str) -> Option<i64> {
        self.entries.get(sku).map(|e| e.price_cents)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

fn csv_err(source: &str, e: csv::Error) -> ReconError {
    ReconError::Csv {
        source: source.into(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_with_comma_decimal() {
        let csv = "SKU,Price\nKBS-200-SCH-10-20,\"10,50€\"\nKBS-500-SCH-10-20,25.00\n";
        let table = PriceTable::from_keyed_csv("new.csv", csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.price("KBS-200-SCH-10-20"), Some(1050));
        assert_eq!(table.price("KBS-500-SCH-10-20"), Some(2500));
        assert!(table.rejected.is_empty());
    }

    #[test]
    fn keyed_column_order_and_bom() {
        let csv = "\u{feff}Price,Name,SKU\n7.5,thing,KBS-100-SCH-1-2\n";
        let table = PriceTable::from_keyed_csv("new.csv", csv).unwrap();
        assert_eq!(table.price("KBS-100-SCH-1-2"), Some(750));
    }

    #[test]
    fn keyed_missing_column() {
        let err = PriceTable::from_keyed_csv("new.csv", "Sku,Cost\nA,1\n").unwrap_err();
        assert!(err.to_string().contains("'SKU'"));
    }

    #[test]
    fn keyed_rejects_unreadable_price() {
        let csv = "SKU,Price\nKBS-200-SCH-10-20,call us\nKBS-500-SCH-10-20,3\n";
        let table = PriceTable::from_keyed_csv("new.csv", csv).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rejected.len(), 1);
        assert_eq!(table.rejected[0].sku, "KBS-200-SCH-10-20");
        assert_eq!(table.rejected[0].line, 2);
    }

    #[test]
    fn positional_rows() {
        let csv = "\
Preis;Versand;EK;SKU
\"12,90 €\";\"4,90 €\";\"6,10 â‚¬\";KBS-200-SCH-10-20
;;;
short;row
\"20,00 €\";;;KBS-500-SCH-10-20
";
        let table = PriceTable::from_positional_csv("future.csv", csv).unwrap();
        assert_eq!(table.len(), 2);
        let entry = table.get("KBS-200-SCH-10-20").unwrap();
        assert_eq!(entry.price_cents, 1290);
        assert_eq!(entry.shipping_cents, Some(490));
        assert_eq!(entry.cost_cents, Some(610));
        let entry = table.get("KBS-500-SCH-10-20").unwrap();
        assert_eq!(entry.shipping_cents, None);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("keyed".parse::<NewPriceFormat>(), Ok(NewPriceFormat::Keyed));
        assert_eq!("positional".parse::<NewPriceFormat>(), Ok(NewPriceFormat::Positional));
        assert!("xml".parse::<NewPriceFormat>().is_err());
        assert_eq!(NewPriceFormat::from_delimiter(b';'), NewPriceFormat::Positional);
        assert_eq!(NewPriceFormat::from_delimiter(b','), NewPriceFormat::Keyed);
    }
}

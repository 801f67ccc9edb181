//! Read-only views over a historical export: every distinct price each
//! normalized SKU was listed at, optionally side by side with a future price
//! list.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::RepriceConfig;
use crate::error::ReconError;
use crate::export::{write_delimited, OldExport, EXPORT_DELIMITER};
use crate::mapping::MeasurementMapping;
use crate::normalize::normalized_sku;
use crate::price::{format_price, parse_price};
use crate::sku::SkuParser;
use crate::table::PriceTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkuPrices {
    /// Normalized SKU.
    pub sku: String,
    /// Distinct observed prices, ascending.
    pub prices: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceHistory {
    /// Sorted by measurement, then pack size.
    pub skus: Vec<SkuPrices>,
    /// Item numbers whose block contains a malformed SKU. All rows of these
    /// blocks are left out of `skus`.
    pub broken_item_numbers: BTreeSet<String>,
}

struct Observation {
    item_number: String,
    sku: String,
    price_cents: i64,
}

/// Group a historical export by normalized SKU.
///
/// Variation rows leave `Item number` empty; they belong to the last item
/// number seen above them.
pub fn collect_history(
    config: &RepriceConfig,
    export: &OldExport,
    source: &str,
    mapping: &MeasurementMapping,
) -> Result<PriceHistory, ReconError> {
    let sku_idx = export.column(source, &config.columns.sku)?;
    let price_idx = export.column(source, &config.columns.price)?;
    let item_idx = export.column(source, &config.columns.item_number)?;
    let parser = SkuParser::new(&config.prefix);

    let mut broken = BTreeSet::new();
    let mut observations = Vec::new();
    let mut current_item = String::new();

    for row in 0..export.len() {
        let item = export.cell(row, item_idx).trim();
        if !item.is_empty() {
            current_item = item.to_string();
        }

        let raw = export.cell(row, sku_idx).trim();
        if !parser.is_candidate(raw) {
            continue;
        }
        let sku = match parser.parse(raw) {
            Ok(sku) => sku,
            Err(_) => {
                broken.insert(current_item.clone());
                continue;
            }
        };

        let price_text = export.cell(row, price_idx);
        let price_cents = parse_price(price_text).ok_or_else(|| ReconError::PriceParse {
            source: source.into(),
            line: export.line_of(row),
            value: price_text.into(),
        })?;

        observations.push(Observation {
            item_number: current_item.clone(),
            sku: normalized_sku(&sku, config, mapping),
            price_cents,
        });
    }

    let mut grouped: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
    for obs in observations {
        if broken.contains(&obs.item_number) {
            continue;
        }
        grouped.entry(obs.sku).or_default().insert(obs.price_cents);
    }

    let mut skus: Vec<SkuPrices> = grouped
        .into_iter()
        .map(|(sku, prices)| SkuPrices {
            sku,
            prices: prices.into_iter().collect(),
        })
        .collect();
    skus.sort_by(|a, b| sort_key(&a.sku).cmp(&sort_key(&b.sku)).then_with(|| a.sku.cmp(&b.sku)));

    Ok(PriceHistory {
        skus,
        broken_item_numbers: broken,
    })
}

/// (dim2, dim1, pieces), each read from its digits alone.
fn sort_key(sku: &str) -> (u64, u64, u64) {
    let parts: Vec<&str> = sku.split('-').collect();
    let num = |i: usize| -> u64 {
        parts
            .get(i)
            .map(|p| p.chars().filter(char::is_ascii_digit).collect::<String>())
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(0)
    };
    (num(4), num(3), num(1))
}

/// `SKU;Price 1;…;Price N`, N being the most distinct prices any SKU had.
pub fn render_unique(history: &PriceHistory) -> Result<String, ReconError> {
    let max_prices = history.skus.iter().map(|s| s.prices.len()).max().unwrap_or(0);

    let mut header = vec!["SKU".to_string()];
    header.extend((1..=max_prices).map(|i| format!("Price {i}")));

    let rows = history.skus.iter().map(|s| {
        std::iter::once(s.sku.clone())
            .chain(s.prices.iter().map(|p| format_price(*p)))
            .collect::<Vec<_>>()
    });

    write_delimited(EXPORT_DELIMITER, std::iter::once(header).chain(rows))
}

/// Comparison sheet: each SKU's lowest historical price next to its future
/// price, shipping and cost. Empty columns are spacers for hand-written
/// formulas.
pub fn render_comparison(history: &PriceHistory, future: &PriceTable) -> Result<String, ReconError> {
    let header: Vec<String> = [
        "SKU", "COLOR", "SIZE", "PIECES", "New Price", "Price", "", "EK", "", "-Versand",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();

    let optional = |cents: Option<i64>| cents.map(format_price).unwrap_or_default();

    let rows = history.skus.iter().map(|s| {
        let parts: Vec<&str> = s.sku.split('-').collect();
        let part = |i: usize| parts.get(i).copied().unwrap_or("").to_string();
        let entry = future.get(&s.sku);
        let lowest = s.prices.first().copied();

        vec![
            s.sku.clone(),
            part(2),
            format!("{}x{}", part(3), part(4)),
            part(1),
            optional(entry.map(|e| e.price_cents)),
            optional(lowest),
            String::new(),
            optional(entry.and_then(|e| e.cost_cents)),
            String::new(),
            optional(entry.and_then(|e| e.shipping_cents)),
        ]
    });

    write_delimited(EXPORT_DELIMITER, std::iter::once(header).chain(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: &str = "\
Info;Version=1.0
Action;Item number;Custom label (SKU);Start price
Add;100;KBS-500-NAT-10-20;20.00
Add;;KBS-200-SCH-10-20;9.50
Add;;KBS-200-NAT-10-20;9.00
Add;101;KBS-200-ROT-300-48;5,00
Add;;KBS-200-GRN-300-48;5.00
Add;102;KBS-200-SCH-1-2;1.00
Add;;KBS-200-SCH-1;1.00
Add;103;OTHER-ITEM;7.00
";

    fn history() -> PriceHistory {
        let export = OldExport::parse("old.csv", HISTORY).unwrap();
        collect_history(&RepriceConfig::catalog(), &export, "old.csv", &MeasurementMapping::new()).unwrap()
    }

    #[test]
    fn groups_distinct_prices() {
        let h = history();
        let skus: Vec<&str> = h.skus.iter().map(|s| s.sku.as_str()).collect();
        assert_eq!(
            skus,
            vec!["KBS-200-SCH-10-20", "KBS-500-SCH-10-20", "KBS-200-COLOR-300-48"]
        );
        assert_eq!(h.skus[0].prices, vec![900, 950]);
        assert_eq!(h.skus[2].prices, vec![500]);
    }

    #[test]
    fn broken_block_excluded() {
        let h = history();
        assert_eq!(h.broken_item_numbers.iter().collect::<Vec<_>>(), vec!["102"]);
        assert!(h.skus.iter().all(|s| !s.sku.ends_with("-1-2")));
    }

    #[test]
    fn mapping_merges_measurements() {
        let export = OldExport::parse("old.csv", HISTORY).unwrap();
        let mut mapping = MeasurementMapping::new();
        mapping.insert("300-48", "10-20");
        let h = collect_history(&RepriceConfig::maka(), &export, "old.csv", &mapping).unwrap();
        let bra = h.skus.iter().find(|s| s.sku == "KBS-200-BRA-10-20").unwrap();
        assert_eq!(bra.prices, vec![500]);
    }

    #[test]
    fn unparseable_price_is_an_error() {
        let content = "meta\nItem number;Custom label (SKU);Start price\n1;KBS-200-SCH-1-2;free\n";
        let export = OldExport::parse("old.csv", content).unwrap();
        let err = collect_history(&RepriceConfig::maka(), &export, "old.csv", &MeasurementMapping::new())
            .unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn unique_report() {
        let out = render_unique(&history()).unwrap();
        assert_eq!(
            out,
            "\
SKU;Price 1;Price 2
KBS-200-SCH-10-20;9.00;9.50
KBS-500-SCH-10-20;20.00
KBS-200-COLOR-300-48;5.00
"
        );
    }

    #[test]
    fn unique_report_empty_history() {
        assert_eq!(render_unique(&PriceHistory::default()).unwrap(), "SKU\n");
    }

    #[test]
    fn comparison_report() {
        let future = PriceTable::from_positional_csv(
            "future.csv",
            "Preis;Versand;EK;SKU\n\"11,00 €\";\"4,90 €\";\"6,00 €\";KBS-200-SCH-10-20\n",
        )
        .unwrap();
        let out = render_comparison(&history(), &future).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "SKU;COLOR;SIZE;PIECES;New Price;Price;;EK;;-Versand");
        assert_eq!(lines[1], "KBS-200-SCH-10-20;SCH;10x20;200;11.00;9.00;;6.00;;4.90");
        assert_eq!(lines[2], "KBS-500-SCH-10-20;SCH;10x20;500;;20.00;;;;");
        assert_eq!(lines.len(), 4);
    }
}

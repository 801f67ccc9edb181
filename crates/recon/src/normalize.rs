use crate::config::{ColorConfig, RepriceConfig};
use crate::mapping::MeasurementMapping;
use crate::sku::Sku;

/// Map a color onto the codes the new price list uses: aliases of the
/// canonical color become canonical, the canonical color stays, everything
/// else falls into the generic bucket.
pub fn normalize_color<'a>(color: &'a str, colors: &'a ColorConfig) -> &'a str {
    if colors.canonical_aliases.iter().any(|c| c == color) {
        &colors.canonical
    } else if color == colors.canonical || color == colors.generic {
        color
    } else {
        &colors.generic
    }
}

/// `PREFIX-PIECES-COLOR'-MEASUREMENT'`: color normalized, measurement replaced
/// by its learned alias when one exists.
pub fn normalized_sku(sku: &Sku, config: &RepriceConfig, mapping: &MeasurementMapping) -> String {
    let key = sku.measurement_key();
    sku.key_with(normalize_color(&sku.color, &config.colors), mapping.resolve(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sku::SkuParser;
    use proptest::prelude::*;

    #[test]
    fn color_rules() {
        let colors = RepriceConfig::maka().colors;
        assert_eq!(normalize_color("NAT", &colors), "SCH");
        assert_eq!(normalize_color("SCH", &colors), "SCH");
        assert_eq!(normalize_color("ROT", &colors), "BRA");
        assert_eq!(normalize_color("nat", &colors), "BRA");

        let colors = RepriceConfig::catalog().colors;
        assert_eq!(normalize_color("ROT", &colors), "COLOR");
        assert_eq!(normalize_color("NAT", &colors), "SCH");
    }

    #[test]
    fn normalized_sku_applies_alias() {
        let config = RepriceConfig::catalog();
        let mut mapping = MeasurementMapping::new();
        mapping.insert("300-50", "300-48");
        let parser = SkuParser::new("KBS");

        let sku = parser.parse("KBS-500-NAT-300-50").unwrap();
        assert_eq!(normalized_sku(&sku, &config, &mapping), "KBS-500-SCH-300-48");

        let sku = parser.parse("KBS-500-WEI-10-20").unwrap();
        assert_eq!(normalized_sku(&sku, &config, &mapping), "KBS-500-COLOR-10-20");
    }

    proptest! {
        #[test]
        fn color_normalization_is_idempotent(color in "[A-Za-z]{3}", catalog in any::<bool>()) {
            let config = if catalog { RepriceConfig::catalog() } else { RepriceConfig::maka() };
            let once = normalize_color(&color, &config.colors);
            prop_assert_eq!(normalize_color(once, &config.colors), once);
        }
    }
}

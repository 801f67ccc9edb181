use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Every knob the resolver and export layer need. The two shops we price for
/// differ only in these values; see [`RepriceConfig::maka`] and
/// [`RepriceConfig::catalog`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepriceConfig {
    pub name: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub colors: ColorConfig,
    /// Subtracted from every resolved price.
    #[serde(default)]
    pub price_adjustment_cents: i64,
    #[serde(default = "default_minimum_pack_size")]
    pub minimum_pack_size: u32,
    /// MeasurementKeys (`"dim1-dim2"`) that are never priced.
    #[serde(default = "default_excluded_measurements")]
    pub excluded_measurements: Vec<String>,
    #[serde(default)]
    pub interpolation: InterpolationConfig,
    #[serde(default)]
    pub columns: ColumnConfig,
    /// Give up on a SKU after this many rejected corrections. 0 = keep asking.
    #[serde(default)]
    pub max_correction_attempts: u32,
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorConfig {
    /// The one color the new price list carries per size.
    #[serde(default = "default_canonical_color")]
    pub canonical: String,
    /// Colors priced like the canonical one.
    #[serde(default = "default_canonical_aliases")]
    pub canonical_aliases: Vec<String>,
    /// Bucket code for every other color.
    #[serde(default = "default_generic_color")]
    pub generic: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            canonical: default_canonical_color(),
            canonical_aliases: default_canonical_aliases(),
            generic: default_generic_color(),
        }
    }
}

// ---------------------------------------------------------------------------
// Interpolation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InterpolationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_lower_pieces")]
    pub lower_pieces: u32,
    #[serde(default = "default_upper_pieces")]
    pub upper_pieces: u32,
    /// Pack sizes the new price list never carries directly.
    #[serde(default = "default_interpolated_sizes")]
    pub sizes: Vec<u32>,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lower_pieces: default_lower_pieces(),
            upper_pieces: default_upper_pieces(),
            sizes: default_interpolated_sizes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Header names in the old export.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColumnConfig {
    #[serde(default = "default_sku_column")]
    pub sku: String,
    #[serde(default = "default_price_column")]
    pub price: String,
    #[serde(default = "default_item_number_column")]
    pub item_number: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            sku: default_sku_column(),
            price: default_price_column(),
            item_number: default_item_number_column(),
        }
    }
}

fn default_prefix() -> String {
    "KBS".into()
}
fn default_minimum_pack_size() -> u32 {
    100
}
fn default_excluded_measurements() -> Vec<String> {
    vec!["920-90".into(), "920-48".into()]
}
fn default_canonical_color() -> String {
    "SCH".into()
}
fn default_canonical_aliases() -> Vec<String> {
    vec!["NAT".into()]
}
fn default_generic_color() -> String {
    "BRA".into()
}
fn default_lower_pieces() -> u32 {
    200
}
fn default_upper_pieces() -> u32 {
    500
}
fn default_interpolated_sizes() -> Vec<u32> {
    vec![300, 400]
}
fn default_sku_column() -> String {
    "Custom label (SKU)".into()
}
fn default_price_column() -> String {
    "Start price".into()
}
fn default_item_number_column() -> String {
    "Item number".into()
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Built-in profile names accepted by [`RepriceConfig::profile`].
pub const PROFILES: [&str; 2] = ["maka", "catalog"];

impl RepriceConfig {
    /// Marketplace repricing: `BRA` bucket, 300/400 packs interpolated from
    /// 200/500, 0.15 taken off every price.
    pub fn maka() -> Self {
        Self {
            name: "maka".into(),
            prefix: default_prefix(),
            colors: ColorConfig {
                generic: "BRA".into(),
                ..ColorConfig::default()
            },
            price_adjustment_cents: 15,
            minimum_pack_size: default_minimum_pack_size(),
            excluded_measurements: default_excluded_measurements(),
            interpolation: InterpolationConfig {
                enabled: true,
                ..InterpolationConfig::default()
            },
            columns: ColumnConfig::default(),
            max_correction_attempts: 0,
        }
    }

    /// Catalog listing: `COLOR` bucket, no interpolation, prices taken as-is.
    pub fn catalog() -> Self {
        Self {
            name: "catalog".into(),
            colors: ColorConfig {
                generic: "COLOR".into(),
                ..ColorConfig::default()
            },
            price_adjustment_cents: 0,
            interpolation: InterpolationConfig::default(),
            ..Self::maka()
        }
    }

    pub fn profile(name: &str) -> Option<Self> {
        match name {
            "maka" => Some(Self::maka()),
            "catalog" => Some(Self::catalog()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RepriceConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RepriceConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.prefix.is_empty() || self.prefix.contains('-') {
            return Err(ReconError::ConfigValidation(format!(
                "prefix must be non-empty and dash-free, got '{}'",
                self.prefix
            )));
        }

        let colors = &self.colors;
        if colors.canonical.is_empty() || colors.generic.is_empty() {
            return Err(ReconError::ConfigValidation(
                "colors.canonical and colors.generic must be non-empty".into(),
            ));
        }
        if colors.generic == colors.canonical || colors.canonical_aliases.contains(&colors.generic) {
            return Err(ReconError::ConfigValidation(format!(
                "colors.generic '{}' collides with the canonical color",
                colors.generic
            )));
        }

        for key in &self.excluded_measurements {
            if !is_measurement_key(key) {
                return Err(ReconError::ConfigValidation(format!(
                    "excluded measurement '{key}' is not of the form dim1-dim2"
                )));
            }
        }

        let interp = &self.interpolation;
        if interp.lower_pieces >= interp.upper_pieces {
            return Err(ReconError::ConfigValidation(format!(
                "interpolation.lower_pieces ({}) must be below upper_pieces ({})",
                interp.lower_pieces, interp.upper_pieces
            )));
        }
        if let Some(size) = interp
            .sizes
            .iter()
            .find(|s| **s <= interp.lower_pieces || **s >= interp.upper_pieces)
        {
            return Err(ReconError::ConfigValidation(format!(
                "interpolated size {size} is not between {} and {}",
                interp.lower_pieces, interp.upper_pieces
            )));
        }

        let cols = &self.columns;
        if cols.sku.is_empty() || cols.price.is_empty() || cols.item_number.is_empty() {
            return Err(ReconError::ConfigValidation("column names must be non-empty".into()));
        }

        Ok(())
    }

    pub fn is_excluded(&self, measurement_key: &str) -> bool {
        self.excluded_measurements.iter().any(|k| k == measurement_key)
    }

    pub fn is_interpolated_size(&self, pack_size: u32) -> bool {
        self.interpolation.sizes.contains(&pack_size)
    }
}

fn is_measurement_key(key: &str) -> bool {
    match key.split_once('-') {
        Some((a, b)) => {
            !a.is_empty()
                && !b.is_empty()
                && a.bytes().all(|c| c.is_ascii_digit())
                && b.bytes().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

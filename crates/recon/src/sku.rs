use std::fmt;

use regex::Regex;

/// A SKU of the form `PREFIX-PIECES-COLOR-DIM1-DIM2`.
///
/// Fields keep their original text so that `to_string()` reproduces the input
/// exactly (leading zeros included).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sku {
    pub prefix: String,
    pub pieces: String,
    pub color: String,
    pub dim1: String,
    pub dim2: String,
    /// `pieces` as a number.
    pub pack_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkuError {
    /// Does not match `PREFIX-<digits>-<3 letters>-<digits>-<digits>`.
    Pattern(String),
    /// Pack size digits do not fit a u32.
    PackSizeOverflow(String),
}

impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(raw) => write!(f, "'{raw}' does not match PREFIX-PIECES-COLOR-DIM1-DIM2"),
            Self::PackSizeOverflow(raw) => write!(f, "'{raw}': pack size out of range"),
        }
    }
}

impl std::error::Error for SkuError {}

/// Validates SKUs for one brand prefix.
#[derive(Debug, Clone)]
pub struct SkuParser {
    prefix: String,
    pattern: Regex,
}

impl SkuParser {
    pub fn new(prefix: &str) -> Self {
        // `\d` is Unicode-aware in the regex crate; SKUs are ASCII only.
        let pattern = Regex::new(&format!(
            r"^({})-([0-9]+)-([A-Za-z]{{3}})-([0-9]+)-([0-9]+)$",
            regex::escape(prefix)
        ))
        .expect("escaped prefix always forms a valid pattern");
        Self {
            prefix: prefix.to_string(),
            pattern,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True when the raw label belongs to this brand, valid or not.
    pub fn is_candidate(&self, raw: &str) -> bool {
        raw.starts_with(&self.prefix)
    }

    pub fn is_valid(&self, raw: &str) -> bool {
        self.pattern.is_match(raw)
    }

    pub fn parse(&self, raw: &str) -> Result<Sku, SkuError> {
        let caps = self
            .pattern
            .captures(raw)
            .ok_or_else(|| SkuError::Pattern(raw.to_string()))?;

        let pieces = caps[2].to_string();
        let pack_size = pieces
            .parse::<u32>()
            .map_err(|_| SkuError::PackSizeOverflow(raw.to_string()))?;

        Ok(Sku {
            prefix: caps[1].to_string(),
            pieces,
            color: caps[3].to_string(),
            dim1: caps[4].to_string(),
            dim2: caps[5].to_string(),
            pack_size,
        })
    }
}

impl Sku {
    /// `"dim1-dim2"`, the key into the measurement mapping.
    pub fn measurement_key(&self) -> String {
        format!("{}-{}", self.dim1, self.dim2)
    }

    /// Lookup key with the same prefix and pieces but a different color and
    /// measurement text.
    pub fn key_with(&self, color: &str, measurement: &str) -> String {
        lookup_key(&self.prefix, &self.pieces, color, measurement)
    }

    /// Lookup key for another pack size.
    pub fn key_with_pieces(&self, pieces: u32, color: &str, measurement: &str) -> String {
        lookup_key(&self.prefix, &pieces.to_string(), color, measurement)
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.prefix, self.pieces, self.color, self.dim1, self.dim2
        )
    }
}

/// Build `PREFIX-PIECES-COLOR-MEASUREMENT`. The measurement is taken as-is
/// (it may itself contain a dash).
pub fn lookup_key(prefix: &str, pieces: &str, color: &str, measurement: &str) -> String {
    format!("{prefix}-{pieces}-{color}-{measurement}")
}

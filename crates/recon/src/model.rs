use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Which rule produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Color-normalized SKU found in the new prices.
    Normalized,
    /// The old SKU itself found in the new prices.
    Original,
    /// Found via a previously learned measurement alias.
    Alias,
    /// Computed from the two reference pack sizes.
    Interpolated,
    /// Found via a measurement supplied during this run.
    Correction,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normalized => write!(f, "normalized"),
            Self::Original => write!(f, "original"),
            Self::Alias => write!(f, "alias"),
            Self::Interpolated => write!(f, "interpolated"),
            Self::Correction => write!(f, "correction"),
        }
    }
}

/// Why a SKU ended up in the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    InvalidSku,
    BelowMinimumPack,
    ExcludedMeasurement,
    InterpolationUnsupported,
    MissingReferencePrice,
    /// The computed price does not fit in cents.
    PriceOutOfRange,
    AliasMiss,
    Skipped,
    AttemptsExhausted,
    NeedsManualInput,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSku => write!(f, "invalid_sku"),
            Self::BelowMinimumPack => write!(f, "below_minimum_pack"),
            Self::ExcludedMeasurement => write!(f, "excluded_measurement"),
            Self::InterpolationUnsupported => write!(f, "interpolation_unsupported"),
            Self::MissingReferencePrice => write!(f, "missing_reference_price"),
            Self::PriceOutOfRange => write!(f, "price_out_of_range"),
            Self::AliasMiss => write!(f, "alias_miss"),
            Self::Skipped => write!(f, "skipped"),
            Self::AttemptsExhausted => write!(f, "attempts_exhausted"),
            Self::NeedsManualInput => write!(f, "needs_manual_input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Priced {
        /// Key that hit the price table (the lower reference for interpolation).
        matched_sku: String,
        source: PriceSource,
        /// Price from the table or interpolation, before adjustment.
        list_price_cents: i64,
        /// Price written to the export.
        price_cents: i64,
    },
    Unresolved {
        reason: UnresolvedReason,
    },
}

impl Resolution {
    pub fn is_priced(&self) -> bool {
        matches!(self, Self::Priced { .. })
    }

    pub fn price_cents(&self) -> Option<i64> {
        match self {
            Self::Priced { price_cents, .. } => Some(*price_cents),
            Self::Unresolved { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Error log
// ---------------------------------------------------------------------------

pub const ERROR_LOG_BANNER: &str = "SKUs not found in new prices file:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorLogEntry {
    pub sku: String,
    pub reason: UnresolvedReason,
}

/// Unresolved SKUs in first-seen order, each listed once.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Vec<ErrorLogEntry>,
    seen: HashSet<String>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the SKU was already logged.
    pub fn push(&mut self, sku: &str, reason: UnresolvedReason) -> bool {
        if !self.seen.insert(sku.to_string()) {
            return false;
        }
        self.entries.push(ErrorLogEntry {
            sku: sku.to_string(),
            reason,
        });
        true
    }

    pub fn entries(&self) -> &[ErrorLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Banner line, then one SKU per line.
    pub fn render(&self) -> String {
        let mut out = String::from(ERROR_LOG_BANNER);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&entry.sku);
            out.push('\n');
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Data rows in the old export.
    pub rows: usize,
    /// Rows whose SKU carries the brand prefix.
    pub candidate_rows: usize,
    pub priced_rows: usize,
    pub unresolved_rows: usize,
    /// Distinct SKUs in the error log.
    pub unresolved_skus: usize,
    pub corrections_learned: usize,
    pub priced_by_source: BTreeMap<String, usize>,
    pub unresolved_by_reason: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

/// JSON view of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub unresolved: Vec<ErrorLogEntry>,
}

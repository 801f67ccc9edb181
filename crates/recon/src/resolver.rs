//! Old SKU → new price.
//!
//! Rules are tried in a fixed order: business rejections first (pack size,
//! excluded measurements, interpolated sizes), then table lookups by
//! normalized key, original key and learned alias, and finally a
//! [`CorrectionSource`] that may supply a replacement measurement.

use std::collections::HashMap;

use tracing::debug;

use crate::config::RepriceConfig;
use crate::mapping::MeasurementMapping;
use crate::model::{PriceSource, Resolution, UnresolvedReason};
use crate::normalize::normalize_color;
use crate::price::interpolate_cents;
use crate::sku::{Sku, SkuParser};
use crate::table::PriceTable;

// ---------------------------------------------------------------------------
// Corrections
// ---------------------------------------------------------------------------

/// What the resolver knows when it asks for a replacement measurement.
#[derive(Debug, Clone)]
pub struct CorrectionRequest<'a> {
    pub sku: &'a Sku,
    /// Normalized color the replacement will be combined with.
    pub color: &'a str,
    pub measurement_key: &'a str,
    /// 1-based.
    pub attempt: u32,
    /// The previous answer, which did not hit the price table.
    pub rejected: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// Try this measurement text (e.g. `300-48`).
    Replace(String),
    /// Give up on this SKU.
    Skip,
    /// Leave the SKU for a human; the run continues.
    Defer,
}

/// Supplies replacement measurements for SKUs the resolver cannot price.
///
/// A rejected answer is reported back through
/// [`CorrectionRequest::rejected`] and the source is asked again, so an
/// implementation must eventually return `Skip` or `Defer`, or the config must
/// bound the attempts.
pub trait CorrectionSource {
    fn request(&mut self, request: &CorrectionRequest<'_>) -> Correction;
}

/// Never corrects anything; every miss becomes `needs_manual_input`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferAll;

impl CorrectionSource for DeferAll {
    fn request(&mut self, _request: &CorrectionRequest<'_>) -> Correction {
        Correction::Defer
    }
}

/// Scripted answers per MeasurementKey, consumed in order. Once a key runs
/// out of answers it is skipped.
#[derive(Debug, Clone, Default)]
pub struct FixedCorrections {
    answers: HashMap<String, Vec<String>>,
    asked: Vec<String>,
}

impl FixedCorrections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, measurement_key: &str, replacement: &str) -> Self {
        self.answers
            .entry(measurement_key.to_string())
            .or_default()
            .push(replacement.to_string());
        self
    }

    /// SKUs the resolver asked about, in order (one entry per attempt).
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl CorrectionSource for FixedCorrections {
    fn request(&mut self, request: &CorrectionRequest<'_>) -> Correction {
        self.asked.push(request.sku.to_string());
        match self.answers.get_mut(request.measurement_key) {
            Some(queue) if !queue.is_empty() => Correction::Replace(queue.remove(0)),
            _ => Correction::Skip,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct Resolver<'a> {
    config: &'a RepriceConfig,
    parser: SkuParser,
    prices: &'a PriceTable,
    mapping: &'a mut MeasurementMapping,
    corrections: &'a mut dyn CorrectionSource,
    cache: HashMap<String, Resolution>,
    learned: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(
        config: &'a RepriceConfig,
        prices: &'a PriceTable,
        mapping: &'a mut MeasurementMapping,
        corrections: &'a mut dyn CorrectionSource,
    ) -> Self {
        Self {
            config,
            parser: SkuParser::new(&config.prefix),
            prices,
            mapping,
            corrections,
            cache: HashMap::new(),
            learned: 0,
        }
    }

    pub fn parser(&self) -> &SkuParser {
        &self.parser
    }

    /// Aliases learned from corrections during this run.
    pub fn corrections_learned(&self) -> usize {
        self.learned
    }

    /// Resolve one old SKU. A SKU seen before in this run gets its first
    /// outcome back without consulting the correction source again.
    pub fn resolve(&mut self, raw: &str) -> Resolution {
        if let Some(hit) = self.cache.get(raw) {
            return hit.clone();
        }
        let resolution = self.resolve_uncached(raw);
        debug!(sku = raw, ?resolution, "resolved");
        self.cache.insert(raw.to_string(), resolution.clone());
        resolution
    }

    fn resolve_uncached(&mut self, raw: &str) -> Resolution {
        let sku = match self.parser.parse(raw) {
            Ok(sku) => sku,
            Err(_) => return unresolved(UnresolvedReason::InvalidSku),
        };
        let config = self.config;

        if sku.pack_size < config.minimum_pack_size {
            return unresolved(UnresolvedReason::BelowMinimumPack);
        }

        let measurement_key = sku.measurement_key();
        if config.is_excluded(&measurement_key) {
            return unresolved(UnresolvedReason::ExcludedMeasurement);
        }

        let color = normalize_color(&sku.color, &config.colors).to_string();

        if config.is_interpolated_size(sku.pack_size) {
            if !config.interpolation.enabled {
                return unresolved(UnresolvedReason::InterpolationUnsupported);
            }
            return self.interpolate(&sku, &color, &measurement_key);
        }

        let normalized = sku.key_with(&color, &measurement_key);
        if let Some(price) = self.prices.price(&normalized) {
            return self.priced(normalized, PriceSource::Normalized, price);
        }

        if let Some(price) = self.prices.price(raw) {
            return self.priced(raw.to_string(), PriceSource::Original, price);
        }

        if let Some(alias) = self.mapping.get(&measurement_key) {
            let aliased = sku.key_with(&color, alias);
            return match self.prices.price(&aliased) {
                Some(price) => self.priced(aliased, PriceSource::Alias, price),
                None => unresolved(UnresolvedReason::AliasMiss),
            };
        }

        self.ask_for_correction(&sku, &color, &measurement_key)
    }

    fn interpolate(&self, sku: &Sku, color: &str, measurement_key: &str) -> Resolution {
        let interp = &self.config.interpolation;
        let measurement = self.mapping.resolve(measurement_key);

        let lower_sku = sku.key_with_pieces(interp.lower_pieces, color, measurement);
        let upper_sku = sku.key_with_pieces(interp.upper_pieces, color, measurement);

        match (self.prices.price(&lower_sku), self.prices.price(&upper_sku)) {
            (Some(lower), Some(upper)) => {
                match interpolate_cents(
                    interp.lower_pieces,
                    lower,
                    interp.upper_pieces,
                    upper,
                    sku.pack_size,
                ) {
                    Some(price) => self.priced(lower_sku, PriceSource::Interpolated, price),
                    None => unresolved(UnresolvedReason::PriceOutOfRange),
                }
            }
            _ => unresolved(UnresolvedReason::MissingReferencePrice),
        }
    }

    fn ask_for_correction(&mut self, sku: &Sku, color: &str, measurement_key: &str) -> Resolution {
        let limit = self.config.max_correction_attempts;
        let mut rejected: Option<String> = None;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            if limit > 0 && attempt > limit {
                return unresolved(UnresolvedReason::AttemptsExhausted);
            }

            let request = CorrectionRequest {
                sku,
                color,
                measurement_key,
                attempt,
                rejected: rejected.as_deref(),
            };

            match self.corrections.request(&request) {
                Correction::Replace(answer) => {
                    let answer = answer.trim().to_string();
                    let candidate = sku.key_with(color, &answer);
                    if !answer.is_empty() {
                        if let Some(price) = self.prices.price(&candidate) {
                            self.mapping.insert(measurement_key, answer);
                            self.learned += 1;
                            return self.priced(candidate, PriceSource::Correction, price);
                        }
                    }
                    rejected = Some(answer);
                }
                Correction::Skip => return unresolved(UnresolvedReason::Skipped),
                Correction::Defer => return unresolved(UnresolvedReason::NeedsManualInput),
            }
        }
    }

    fn priced(&self, matched_sku: String, source: PriceSource, list_price_cents: i64) -> Resolution {
        match list_price_cents.checked_sub(self.config.price_adjustment_cents) {
            Some(price_cents) => Resolution::Priced {
                matched_sku,
                source,
                list_price_cents,
                price_cents,
            },
            None => unresolved(UnresolvedReason::PriceOutOfRange),
        }
    }
}

fn unresolved(reason: UnresolvedReason) -> Resolution {
    Resolution::Unresolved { reason }
}

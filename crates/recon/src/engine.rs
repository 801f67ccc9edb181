use tracing::info;

use crate::config::RepriceConfig;
use crate::error::ReconError;
use crate::export::OldExport;
use crate::mapping::MeasurementMapping;
use crate::model::{ErrorLog, Resolution, RunMeta, RunReport, RunSummary};
use crate::price::format_price;
use crate::resolver::{CorrectionSource, Resolver};
use crate::table::PriceTable;

/// Everything a reprice run produces. Nothing has been written yet.
#[derive(Debug, Clone)]
pub struct RepriceOutcome {
    pub export: OldExport,
    pub error_log: ErrorLog,
    pub summary: RunSummary,
    pub meta: RunMeta,
}

impl RepriceOutcome {
    pub fn report(&self) -> RunReport {
        RunReport {
            meta: self.meta.clone(),
            summary: self.summary.clone(),
            unresolved: self.error_log.entries().to_vec(),
        }
    }
}

/// Reprice every brand row of `export` against `prices`.
///
/// Rows without the brand prefix pass through untouched. Unresolved rows keep
/// their old price and their SKU goes to the error log; the run itself only
/// fails when the export lacks a required column.
pub fn run(
    config: &RepriceConfig,
    mut export: OldExport,
    source: &str,
    prices: &PriceTable,
    mapping: &mut MeasurementMapping,
    corrections: &mut dyn CorrectionSource,
) -> Result<RepriceOutcome, ReconError> {
    let sku_idx = export.column(source, &config.columns.sku)?;
    let price_idx = export.column(source, &config.columns.price)?;

    let mut resolver = Resolver::new(config, prices, mapping, corrections);
    let mut error_log = ErrorLog::new();
    let mut summary = RunSummary {
        rows: export.len(),
        ..RunSummary::default()
    };

    for row in 0..export.len() {
        let sku = export.cell(row, sku_idx).trim().to_string();
        if !resolver.parser().is_candidate(&sku) {
            continue;
        }
        summary.candidate_rows += 1;

        match resolver.resolve(&sku) {
            Resolution::Priced { source, price_cents, .. } => {
                export.set_cell(row, price_idx, format_price(price_cents));
                summary.priced_rows += 1;
                *summary.priced_by_source.entry(source.to_string()).or_insert(0) += 1;
            }
            Resolution::Unresolved { reason } => {
                summary.unresolved_rows += 1;
                if error_log.push(&sku, reason) {
                    *summary.unresolved_by_reason.entry(reason.to_string()).or_insert(0) += 1;
                }
            }
        }
    }

    summary.unresolved_skus = error_log.len();
    summary.corrections_learned = resolver.corrections_learned();

    info!(
        config = %config.name,
        rows = summary.rows,
        priced = summary.priced_rows,
        unresolved = summary.unresolved_skus,
        learned = summary.corrections_learned,
        "reprice finished"
    );

    Ok(RepriceOutcome {
        export,
        error_log,
        summary,
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
    })
}

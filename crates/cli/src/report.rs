//! `reprice unique` and `reprice compare`: read-only reports over an old export.

use std::path::{Path, PathBuf};

use clap::Args;
use reprice_io::csv::{read_old_export, read_price_table, write_text};
use reprice_io::MappingStore;
use reprice_recon::report::{collect_history, render_comparison, render_unique, PriceHistory};
use reprice_recon::NewPriceFormat;

use crate::{CliError, ConfigArgs};

#[derive(Args, Debug)]
pub struct UniqueArgs {
    /// Old marketplace export
    pub old_export: PathBuf,

    /// Where to write the report
    pub output: PathBuf,

    #[command(flatten)]
    pub settings: ConfigArgs,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Old marketplace export
    pub old_export: PathBuf,

    /// Future price list (`Price;Shipping;Cost;SKU`)
    pub future_prices: PathBuf,

    /// Where to write the report
    pub output: PathBuf,

    #[command(flatten)]
    pub settings: ConfigArgs,
}

pub fn cmd_unique(args: UniqueArgs) -> Result<(), CliError> {
    let history = load_history(&args.old_export, &args.settings)?;
    write_text(&args.output, &render_unique(&history)?)?;
    print_summary(&history, &args.output);
    Ok(())
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    let history = load_history(&args.old_export, &args.settings)?;
    let future = read_price_table(&args.future_prices, Some(NewPriceFormat::Positional))?;

    let matched = history.skus.iter().filter(|s| future.get(&s.sku).is_some()).count();
    write_text(&args.output, &render_comparison(&history, &future)?)?;
    print_summary(&history, &args.output);
    eprintln!(
        "  {matched} of {} SKU(s) have a future price in {}",
        history.skus.len(),
        args.future_prices.display()
    );
    Ok(())
}

/// The mapping is only read here; reports never learn aliases.
fn load_history(path: &Path, settings: &ConfigArgs) -> Result<PriceHistory, CliError> {
    let config = settings.load()?;
    let store = MappingStore::load(&settings.mapping)?;
    let export = read_old_export(path)?;
    Ok(collect_history(&config, &export, &path.display().to_string(), &store.mapping)?)
}

fn print_summary(history: &PriceHistory, output: &Path) {
    eprintln!("wrote {} SKU(s) to {}", history.skus.len(), output.display());
    if !history.broken_item_numbers.is_empty() {
        let items: Vec<&str> = history.broken_item_numbers.iter().map(String::as_str).collect();
        eprintln!(
            "  skipped {} item(s) with malformed SKUs: {}",
            items.len(),
            items.join(", ")
        );
    }
}

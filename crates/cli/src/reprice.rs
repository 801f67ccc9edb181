//! `reprice <input> <new_prices> <output>`: rewrite an old export with new prices.

use std::io;
use std::path::{Path, PathBuf};

use clap::Args;
use reprice_io::csv::{read_old_export, read_price_table, write_text};
use reprice_io::MappingStore;
use reprice_recon::{run, DeferAll, RepriceOutcome};

use crate::exit_codes::{EXIT_ERROR, EXIT_UNRESOLVED};
use crate::prompt::TerminalPrompt;
use crate::{CliError, ConfigArgs, PriceListFormat};

const USAGE: &str = "usage: reprice <input> <new_prices> <output> [options]";

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Old marketplace export (semicolon-delimited, metadata line first)
    pub input: Option<PathBuf>,

    /// New price list (`SKU,Price` or `Price;Shipping;Cost;SKU`)
    pub new_prices: Option<PathBuf>,

    /// Where to write the repriced export
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub settings: ConfigArgs,

    /// Where to write SKUs that could not be priced
    #[arg(long, value_name = "FILE", default_value = "error_log.txt")]
    pub error_log: PathBuf,

    /// Price list layout (detected from the delimiter when omitted)
    #[arg(long, value_enum)]
    pub new_format: Option<PriceListFormat>,

    /// Never prompt; SKUs needing a correction go to the error log
    #[arg(long)]
    pub non_interactive: bool,

    /// Exit with code 61 when any SKU stays unresolved
    #[arg(long)]
    pub strict: bool,

    /// Print the run report as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_reprice(args: RunArgs) -> Result<(), CliError> {
    let (input, new_prices, output) = match (args.input, args.new_prices, args.output) {
        (Some(input), Some(new_prices), Some(output)) => (input, new_prices, output),
        (None, _, _) => return Err(CliError::usage("missing <input>").with_hint(USAGE)),
        (_, None, _) => return Err(CliError::usage("missing <new_prices>").with_hint(USAGE)),
        (_, _, None) => return Err(CliError::usage("missing <output>").with_hint(USAGE)),
    };

    let config = args.settings.load()?;
    let mut store = MappingStore::load(&args.settings.mapping)?;
    let export = read_old_export(&input)?;
    let prices = read_price_table(&new_prices, args.new_format.map(Into::into))?;
    if !prices.rejected.is_empty() {
        eprintln!(
            "note: skipped {} row(s) with unreadable prices in {}",
            prices.rejected.len(),
            new_prices.display()
        );
    }

    let source = input.display().to_string();
    let interactive = !args.non_interactive && atty::is(atty::Stream::Stdin);
    let outcome = if interactive {
        let stdin = io::stdin();
        let mut prompt = TerminalPrompt::new(stdin.lock(), io::stderr());
        run(&config, export, &source, &prices, &mut store.mapping, &mut prompt)?
    } else {
        run(&config, export, &source, &prices, &mut store.mapping, &mut DeferAll)?
    };

    let saved = persist(&mut store, &outcome, &output, &args.error_log)?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome.report())
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    print_summary(&outcome, &output, &args.error_log);
    if saved {
        eprintln!(
            "learned {} measurement alias(es), saved {}",
            outcome.summary.corrections_learned,
            store.path().display()
        );
    }

    let unresolved = outcome.summary.unresolved_skus;
    if args.strict && unresolved > 0 {
        return Err(CliError::new(EXIT_UNRESOLVED, format!("{unresolved} SKU(s) unresolved"))
            .with_hint(format!("see {}", args.error_log.display())));
    }
    Ok(())
}

/// Learned aliases are kept even when an output file cannot be written.
fn persist(
    store: &mut MappingStore,
    outcome: &RepriceOutcome,
    output: &Path,
    error_log: &Path,
) -> Result<bool, CliError> {
    let rendered = outcome.export.render()?;
    let saved = store.save();
    let written = write_text(output, &rendered)
        .and_then(|()| write_text(error_log, &outcome.error_log.render()));
    let saved = saved?;
    written?;
    Ok(saved)
}

fn print_summary(outcome: &RepriceOutcome, output: &Path, error_log: &Path) {
    let s = &outcome.summary;
    eprintln!(
        "{}: repriced {} of {} row(s), {} unresolved, wrote {}",
        outcome.meta.config_name,
        s.priced_rows,
        s.candidate_rows,
        s.unresolved_rows,
        output.display(),
    );
    if !s.unresolved_by_reason.is_empty() {
        let reasons: Vec<String> = s
            .unresolved_by_reason
            .iter()
            .map(|(reason, n)| format!("{reason}: {n}"))
            .collect();
        eprintln!("  unresolved SKUs ({}): {}", s.unresolved_skus, reasons.join(", "));
        eprintln!("  see {}", error_log.display());
    }
}

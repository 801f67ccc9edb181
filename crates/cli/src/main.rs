// reprice CLI - rewrite marketplace price exports against a new price list

mod exit_codes;
mod prompt;
mod report;
mod reprice;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use reprice_io::DEFAULT_MAPPING_FILE;
use reprice_recon::{NewPriceFormat, ReconError, RepriceConfig};

use exit_codes::{exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "reprice")]
#[command(about = "Reprice marketplace exports against a new price list")]
#[command(long_version = long_version())]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "\
Examples:
  reprice old-export.csv new-prices.csv new-export.csv
  reprice old-export.csv new-prices.csv new-export.csv --profile catalog
  reprice old-export.csv new-prices.csv new-export.csv --non-interactive --json
  reprice unique old-export.csv unique-prices.csv
  reprice compare old-export.csv future-prices.csv comparison.csv")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: reprice::RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// List every distinct price each SKU of an old export was sold at
    #[command(after_help = "\
Examples:
  reprice unique old-export.csv unique-prices.csv
  reprice unique old-export.csv unique-prices.csv --mapping shop/measurement_mappings.json")]
    Unique(report::UniqueArgs),

    /// Put historical prices next to a future price list
    #[command(after_help = "\
Examples:
  reprice compare old-export.csv future-prices.csv comparison.csv
  reprice compare old-export.csv future-prices.csv comparison.csv --profile catalog")]
    Compare(report::CompareArgs),

    /// Check a config file without running
    #[command(after_help = "\
Examples:
  reprice validate shop.reprice.toml
  reprice validate shop.reprice.toml --json")]
    Validate {
        /// Path to the .reprice.toml config file
        config: PathBuf,

        /// Print the resolved config (defaults filled in) as JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// Shared arguments
// ============================================================================

/// Built-in configurations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Marketplace: BRA bucket, 300/400 interpolated, 0.15 off
    Maka,
    /// Catalog: COLOR bucket, no interpolation, prices as-is
    Catalog,
}

impl Profile {
    pub fn config(self) -> RepriceConfig {
        match self {
            Profile::Maka => RepriceConfig::maka(),
            Profile::Catalog => RepriceConfig::catalog(),
        }
    }
}

/// New price list layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PriceListFormat {
    /// Comma-delimited with a `SKU,Price` header
    Keyed,
    /// Semicolon-delimited `Price;Shipping;Cost;SKU`
    Positional,
}

impl From<PriceListFormat> for NewPriceFormat {
    fn from(format: PriceListFormat) -> Self {
        match format {
            PriceListFormat::Keyed => NewPriceFormat::Keyed,
            PriceListFormat::Positional => NewPriceFormat::Positional,
        }
    }
}

/// Where the run's configuration and learned aliases come from.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Built-in profile
    #[arg(long, value_enum, default_value_t = Profile::Maka)]
    pub profile: Profile,

    /// TOML config file (replaces --profile)
    #[arg(long, value_name = "FILE", conflicts_with = "profile")]
    pub config: Option<PathBuf>,

    /// Measurement mapping file (created on first learned alias)
    #[arg(long, value_name = "FILE", env = "REPRICE_MAPPING", default_value = DEFAULT_MAPPING_FILE)]
    pub mapping: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<RepriceConfig, CliError> {
        match &self.config {
            Some(path) => load_config_file(path),
            None => Ok(self.profile.config()),
        }
    }
}

fn load_config_file(path: &std::path::Path) -> Result<RepriceConfig, CliError> {
    let text = reprice_io::csv::read_file_as_utf8(path)?;
    RepriceConfig::from_toml(&text).map_err(|e| {
        CliError::from(e).with_hint(format!("fix {} or use --profile", path.display()))
    })
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(path: PathBuf, json: bool) -> Result<(), CliError> {
    let config = load_config_file(&path)?;

    if json {
        let out = serde_json::to_string_pretty(&config)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{out}");
    }

    eprintln!(
        "valid: profile '{}' (prefix {}, generic color {}, interpolation {}, adjustment {} cents)",
        config.name,
        config.prefix,
        config.colors.generic,
        if config.interpolation.enabled { "on" } else { "off" },
        config.price_adjustment_cents,
    );
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::Mapping(_) => Some("fix the JSON or remove the mapping file to start empty".to_string()),
            ReconError::MissingColumn { .. } => {
                Some("column names can be changed in the [columns] section of a config file".to_string())
            }
            _ => None,
        };
        Self { code: exit_code(&err), message: err.to_string(), hint }
    }
}

// ============================================================================
// main
// ============================================================================

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  reprice-recon ", env!("CARGO_PKG_VERSION"),
        "\nbuild:   ", env!("REPRICE_BUILD_PROFILE"),
        "\ntarget:  ", env!("REPRICE_BUILD_TARGET"),
    )
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        None => reprice::cmd_reprice(cli.run),
        Some(Commands::Unique(args)) => report::cmd_unique(args),
        Some(Commands::Compare(args)) => report::cmd_compare(args),
        Some(Commands::Validate { config, json }) => cmd_validate(config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

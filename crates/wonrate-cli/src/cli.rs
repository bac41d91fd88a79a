//! CLI argument definitions for wonrate.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rates` | Run a fetch cycle and print the merged dataset |
//! | `latest` | Latest and previous publish-date groups with deltas |
//! | `chart` | Base-rate series for one currency, oldest first |
//! | `sources` | Show which sources the loaded config can operate |
//! | `cache` | Inspect or clear the on-disk cache |

use clap::{Args, Parser, Subcommand, ValueEnum};

use wonrate_core::{Config, ProviderId};

/// Daily bank FX rates with cache-aware multi-source acquisition.
///
/// Fetches KRW exchange rates for USD, EUR, CNY and JPY from a static
/// snapshot, a proxied daily-quote scrape, or a bank's open rate API,
/// reconciling cached and fresh data into one dataset.
#[derive(Debug, Parser)]
#[command(name = "wonrate", author, version, about = "Daily bank FX rate CLI")]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Which source feeds the fetch cycle.
    #[arg(long, global = true, value_enum, default_value_t = SourceSelector::Auto)]
    pub source: SourceSelector,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object output.
    Json,
    /// ASCII table format for terminal display.
    Table,
}

/// Source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceSelector {
    /// Pick the best-configured source: snapshot, then open-banking,
    /// then the public scrape.
    Auto,
    /// The pre-built JSON snapshot.
    Snapshot,
    /// The proxied daily-quote scrape.
    Scrape,
    /// The bank's open rate-inquiry API.
    OpenBanking,
    /// Deterministic mock data.
    Mock,
}

impl SourceSelector {
    pub fn resolve(self, config: &Config) -> ProviderId {
        match self {
            Self::Auto => {
                if config.snapshot_url.is_some() {
                    ProviderId::Snapshot
                } else if config.openbanking_base.is_some()
                    && config.open_banking_credentials().is_some()
                {
                    ProviderId::OpenBanking
                } else {
                    ProviderId::Scrape
                }
            }
            Self::Snapshot => ProviderId::Snapshot,
            Self::Scrape => ProviderId::Scrape,
            Self::OpenBanking => ProviderId::OpenBanking,
            Self::Mock => ProviderId::Mock,
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a fetch cycle and print the merged, date-descending dataset.
    Rates(RatesArgs),

    /// Print the latest and previous publish-date groups with per-currency deltas.
    Latest,

    /// Print the base-rate chart series for one currency, oldest first.
    Chart(ChartArgs),

    /// Show which sources the loaded configuration can operate.
    Sources,

    /// Cache management commands.
    Cache(CacheArgs),
}

/// Arguments for the `rates` command.
#[derive(Debug, Args)]
pub struct RatesArgs {
    /// Keep only the newest N records.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the `chart` command.
#[derive(Debug, Args)]
pub struct ChartArgs {
    /// Currency code (USD, EUR, CNY, JPY).
    #[arg(default_value = "USD")]
    pub currency: String,
}

/// Arguments for the `cache` command group.
#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Cache management subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Entry count of the configured cache file.
    Stats,
    /// Drop every cached entry.
    Clear,
}

//! Command-line interface for the sales-analytics tool.

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use std::{path::PathBuf, time::Duration};

use crate::{
    analysis::{DEFAULT_LOW_THRESHOLD, DEFAULT_TOP_N},
    catalog::{DEFAULT_CATALOG_URL, DEFAULT_TIMEOUT},
    report::ReportOptions,
    usd::Usd,
    validate::Filters,
};

/// Validates, enriches and reports on a pipe-delimited sales transaction log.
///
/// Reads the log, drops malformed and invalid records, optionally filters by
/// region and amount, attaches product metadata from the catalog service,
/// then writes the enriched data and a formatted analytics report.
#[derive(Debug, Parser, Clone)]
#[command(name = "sales-analytics", version)]
pub struct Args {
    /// The sales log to read. Its first line is a header.
    #[arg(long, short, env = "SALES_INPUT", default_value = "data/sales_data.txt")]
    pub input: PathBuf,

    /// Where to write the enriched transactions.
    #[arg(long, default_value = "data/enriched_sales_data.txt")]
    pub enriched_output: PathBuf,

    /// Where to write the report.
    #[arg(long, default_value = "output/sales_report.txt")]
    pub report: PathBuf,

    /// The product catalog endpoint.
    #[arg(long, env = "SALES_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Read the catalog from this JSON file instead of fetching it.
    #[arg(long, conflicts_with = "catalog_url")]
    pub catalog_file: Option<PathBuf>,

    /// Timeout for the catalog request, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Keep only transactions from this region.
    #[arg(long)]
    pub region: Option<String>,

    /// Keep only transactions worth at least this much.
    #[arg(long)]
    pub min_amount: Option<Usd>,

    /// Keep only transactions worth at most this much.
    #[arg(long)]
    pub max_amount: Option<Usd>,

    /// Ask for filters on the terminal instead of taking them from flags.
    #[arg(long, short = 'I', conflicts_with_all = ["region", "min_amount", "max_amount"])]
    pub interactive: bool,

    /// How many products to list as top sellers.
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top: usize,

    /// Products selling fewer units than this are reported as low performers.
    #[arg(long, default_value_t = DEFAULT_LOW_THRESHOLD)]
    pub low_threshold: i64,

    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    pub log_level: LevelFilter,
}

impl Args {
    #[must_use]
    pub fn filters(&self) -> Filters {
        Filters {
            region: self.region.clone(),
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            top_n: self.top,
            low_threshold: self.low_threshold,
        }
    }
}

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use std::{io, process::ExitCode};

use sales_analytics::{
    args::Args, catalog, enrich_sales_data, parse_transactions, prompt::prompt_filters,
    read_sales_data, save_enriched_data, validate_and_filter, CatalogClient, DataOverview,
    ProductMapping, SalesReport,
};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.log_level);
    debug!("{args:?}");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    println!("Reading sales data...");
    let raw_lines = read_sales_data(&args.input)?;
    println!("Loaded {} rows", raw_lines.len());

    println!("Parsing transactions...");
    let transactions = parse_transactions(&raw_lines);
    println!("Parsed {} records", transactions.len());

    let overview = DataOverview::of(&transactions);
    if !overview.regions.is_empty() {
        println!("Regions: {}", overview.regions.join(", "));
    }
    if let Some((min, max)) = overview.amount_range {
        println!("Amount Range: {} - {}", min.grouped(), max.grouped());
    }

    let filters = if args.interactive {
        prompt_filters(&mut io::stdin().lock(), &mut io::stdout())?
    } else {
        args.filters()
    };

    println!("Validating transactions...");
    let validated = validate_and_filter(&transactions, &filters);
    print_available(&validated.overview);
    let summary = validated.summary;
    if filters.region.as_deref().is_some_and(|r| !r.is_empty()) {
        println!(
            "Records after region filter: {}",
            summary.final_count + summary.filtered_by_amount
        );
    }
    if filters.min_amount.is_some() || filters.max_amount.is_some() {
        println!("Records after amount filter: {}", summary.final_count);
    }
    println!(
        "Valid: {}, Invalid: {}",
        validated.transactions.len(),
        validated.invalid_count
    );
    debug!(?summary, "validation summary");

    println!("Fetching product data from API...");
    let products = match &args.catalog_file {
        Some(path) => catalog::load_products(path).unwrap_or_else(|e| {
            error!("Failed to load catalog file: {e:#}");
            Vec::new()
        }),
        None => CatalogClient::new(args.catalog_url.clone(), args.timeout()).fetch_all_products(),
    };
    let mapping = ProductMapping::from_products(&products);
    let enriched = enrich_sales_data(&validated.transactions, &mapping);
    println!("Enriched {} transactions", enriched.len());

    println!("Saving enriched data...");
    if let Err(e) = save_enriched_data(&enriched, &args.enriched_output) {
        error!("Failed to save enriched data: {e:#}");
    }

    println!("Generating report...");
    let report =
        SalesReport::with_options(&validated.transactions, &enriched, args.report_options());
    match report.write_report(&args.report) {
        Ok(()) => println!("Report saved to {}", args.report.display()),
        Err(e) => error!("Failed to generate report: {e:#}"),
    }

    println!("Process finished.");
    Ok(())
}

fn print_available(overview: &DataOverview) {
    println!("Available regions: {}", overview.regions.join(", "));
    match overview.amount_range {
        Some((min, max)) => println!("Transaction amount range: {min} - {max}"),
        None => println!("Transaction amount range: 0 - 0"),
    }
}

/// Initializes the tracing subscriber.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        // RUST_LOG exists; use it.
        Some(_) => EnvFilter::from_default_env(),
        // Otherwise apply `level` to this crate only.
        None => EnvFilter::new(format!("{}={level}", env!("CARGO_CRATE_NAME"))),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

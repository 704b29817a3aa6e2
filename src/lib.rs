#![doc = include_str!("../README.md")]

pub mod analysis;
pub mod args;
pub mod catalog;
pub mod enrich;
pub mod input;
pub mod prompt;
pub mod report;
pub mod transaction;
pub mod usd;
pub mod validate;

pub use analysis::{
    customer_analysis, daily_sales_trend, find_peak_sales_day, low_performing_products,
    region_wise_sales, top_selling_products, total_revenue,
};
pub use catalog::{CatalogClient, CatalogProduct, ProductMapping, ProductMeta};
pub use enrich::{enrich_sales_data, save_enriched_data, EnrichedTransaction, EnrichmentSummary};
pub use input::{read_sales_data, InputError};
pub use report::{ReportOptions, SalesReport};
pub use transaction::{parse_transactions, Transaction};
pub use usd::Usd;
pub use validate::{validate_and_filter, DataOverview, FilterSummary, Filters, Validated};

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use tracing::debug;

use std::{collections::BTreeSet, fs, io, path::Path};

use crate::{
    catalog::ProductMapping,
    transaction::Transaction,
    usd::Usd,
    validate::PRODUCT_ID_PREFIX,
};

/// Column names of the enriched output file, in order.
pub const ENRICHED_HEADER: [&str; 12] = [
    "TransactionID",
    "Date",
    "ProductID",
    "ProductName",
    "Quantity",
    "UnitPrice",
    "CustomerID",
    "Region",
    "API_Category",
    "API_Brand",
    "API_Rating",
    "API_Match",
];

/// A transaction with catalog metadata attached.
///
/// The metadata fields are `None` unless `api_match` is true.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTransaction {
    pub transaction: Transaction,
    pub api_category: Option<String>,
    pub api_brand: Option<String>,
    pub api_rating: Option<f64>,
    pub api_match: bool,
}

impl EnrichedTransaction {
    fn unmatched(transaction: Transaction) -> Self {
        Self {
            transaction,
            api_category: None,
            api_brand: None,
            api_rating: None,
            api_match: false,
        }
    }
}

/// One row of the enriched output file.
#[derive(Serialize)]
struct EnrichedRow<'a> {
    transaction_id: &'a str,
    date: &'a str,
    product_id: &'a str,
    product_name: &'a str,
    quantity: i64,
    unit_price: Usd,
    customer_id: &'a str,
    region: &'a str,
    api_category: Option<&'a str>,
    api_brand: Option<&'a str>,
    api_rating: Option<f64>,
    #[serde(serialize_with = "capitalized_bool")]
    api_match: bool,
}

/// Writes a flag as `True` or `False`.
fn capitalized_bool<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

impl<'a> From<&'a EnrichedTransaction> for EnrichedRow<'a> {
    fn from(e: &'a EnrichedTransaction) -> Self {
        let t = &e.transaction;
        Self {
            transaction_id: &t.transaction_id,
            date: &t.date,
            product_id: &t.product_id,
            product_name: &t.product_name,
            quantity: t.quantity,
            unit_price: t.unit_price,
            customer_id: &t.customer_id,
            region: &t.region,
            api_category: e.api_category.as_deref(),
            api_brand: e.api_brand.as_deref(),
            api_rating: e.api_rating,
            api_match: e.api_match,
        }
    }
}

/// Extracts the catalog id from a product id such as `P101`.
fn catalog_id(product_id: &str) -> Option<i64> {
    product_id.strip_prefix(PRODUCT_ID_PREFIX)?.parse().ok()
}

/// Attaches catalog metadata to each transaction.
///
/// The numeric part of the product id (`P101` → `101`) is looked up in
/// `mapping`. Transactions whose id has no such part, or has no catalog
/// entry, are kept with `api_match` set to false.
#[must_use]
pub fn enrich_sales_data(
    transactions: &[Transaction],
    mapping: &ProductMapping,
) -> Vec<EnrichedTransaction> {
    transactions
        .iter()
        .map(|tx| {
            match catalog_id(&tx.product_id).and_then(|id| mapping.get(id)) {
                Some(meta) => EnrichedTransaction {
                    transaction: tx.clone(),
                    api_category: Some(meta.category.clone()),
                    api_brand: Some(meta.brand.clone()),
                    api_rating: Some(meta.rating),
                    api_match: true,
                },
                None => EnrichedTransaction::unmatched(tx.clone()),
            }
        })
        .collect()
}

/// Writes enriched transactions as pipe-delimited text, header first.
///
/// Missing values are written as empty fields, and the match flag as `True`
/// or `False`.
///
/// # Errors
///
/// Returns any error from writing to `writer`.
pub fn write_enriched<W: io::Write>(enriched: &[EnrichedTransaction], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'|')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(ENRICHED_HEADER)?;
    for e in enriched {
        wtr.serialize(EnrichedRow::from(e))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Saves enriched transactions to `path`, creating its directory if needed.
///
/// # Errors
///
/// Returns errors if the directory or file cannot be created or written.
pub fn save_enriched_data(enriched: &[EnrichedTransaction], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_enriched(enriched, io::BufWriter::new(file))
        .with_context(|| format!("writing {}", path.display()))?;
    debug!(rows = enriched.len(), path = %path.display(), "saved enriched data");
    Ok(())
}

/// How many transactions found a catalog match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentSummary {
    pub matched: usize,
    pub total: usize,
    /// Matched as a percentage of total, or 0 when there are none.
    pub success_rate: f64,
    /// Distinct names of products with no catalog match, sorted.
    pub unmatched_products: Vec<String>,
}

impl EnrichmentSummary {
    #[must_use]
    pub fn of(enriched: &[EnrichedTransaction]) -> Self {
        let matched = enriched.iter().filter(|e| e.api_match).count();
        let total = enriched.len();
        let unmatched: BTreeSet<&str> = enriched
            .iter()
            .filter(|e| !e.api_match)
            .map(|e| e.transaction.product_name.as_str())
            .collect();
        Self {
            matched,
            total,
            success_rate: if total == 0 {
                0.0
            } else {
                matched as f64 / total as f64 * 100.0
            },
            unmatched_products: unmatched.into_iter().map(String::from).collect(),
        }
    }
}

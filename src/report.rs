use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use std::{
    fmt::{Display, Formatter},
    fs,
    path::Path,
};

use crate::{
    analysis::{
        customer_analysis, daily_sales_trend, find_peak_sales_day, low_performing_products,
        region_wise_sales, top_selling_products, total_revenue, CustomerSummary, DailySales,
        PeakDay, ProductSales, RegionSales, DEFAULT_LOW_THRESHOLD, DEFAULT_TOP_N,
    },
    enrich::{EnrichedTransaction, EnrichmentSummary},
    transaction::Transaction,
    usd::Usd,
};

const RULE_WIDTH: usize = 44;

/// How many customers the report lists.
pub const TOP_CUSTOMERS: usize = 5;

/// Tunable limits for a [`SalesReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub low_threshold: i64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            low_threshold: DEFAULT_LOW_THRESHOLD,
        }
    }
}

/// A sales analytics report.
///
/// To build one from valid transactions and their enriched copies, use
/// [`SalesReport::new`] or [`SalesReport::with_options`]. Every view is
/// computed once, up front.
///
/// To get a printable version of the report, use its [`Display`]
/// implementation. To save it, use [`SalesReport::write_report`].
#[derive(Debug, Clone)]
pub struct SalesReport {
    pub generated_at: DateTime<Local>,
    pub options: ReportOptions,
    pub transaction_count: usize,
    pub total_revenue: Usd,
    pub avg_order_value: Usd,
    /// Earliest and latest date, by string order.
    pub date_range: Option<(String, String)>,
    pub regions: Vec<RegionSales>,
    pub top_products: Vec<ProductSales>,
    pub top_customers: Vec<CustomerSummary>,
    pub daily_trend: Vec<DailySales>,
    pub peak_day: PeakDay,
    pub low_products: Vec<ProductSales>,
    pub enrichment: EnrichmentSummary,
}

impl SalesReport {
    /// Builds a report with the default limits.
    #[must_use]
    pub fn new(transactions: &[Transaction], enriched: &[EnrichedTransaction]) -> Self {
        Self::with_options(transactions, enriched, ReportOptions::default())
    }

    #[must_use]
    pub fn with_options(
        transactions: &[Transaction],
        enriched: &[EnrichedTransaction],
        options: ReportOptions,
    ) -> Self {
        let total = total_revenue(transactions);
        let date_range = transactions
            .iter()
            .map(|t| t.date.as_str())
            .min()
            .zip(transactions.iter().map(|t| t.date.as_str()).max())
            .map(|(first, last)| (first.to_string(), last.to_string()));
        let mut top_customers = customer_analysis(transactions);
        top_customers.truncate(TOP_CUSTOMERS);
        Self {
            generated_at: Local::now(),
            options,
            transaction_count: transactions.len(),
            total_revenue: total,
            avg_order_value: total.mean(transactions.len()),
            date_range,
            regions: region_wise_sales(transactions),
            top_products: top_selling_products(transactions, options.top_n),
            top_customers,
            daily_trend: daily_sales_trend(transactions),
            peak_day: find_peak_sales_day(transactions),
            low_products: low_performing_products(transactions, options.low_threshold),
            enrichment: EnrichmentSummary::of(enriched),
        }
    }

    /// Returns the average transaction value per region, highest first.
    #[must_use]
    pub fn region_averages(&self) -> Vec<(&str, Usd)> {
        let mut averages: Vec<_> = self
            .regions
            .iter()
            .filter(|r| r.transaction_count > 0)
            .map(|r| (r.region.as_str(), r.total_sales.mean(r.transaction_count)))
            .collect();
        averages.sort_by(|a, b| b.1.cmp(&a.1));
        averages
    }

    /// Writes the report to `path`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns errors if the directory or file cannot be created or written.
    pub fn write_report(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(path, self.to_string()).with_context(|| format!("writing {}", path.display()))
    }
}

fn rule(f: &mut Formatter<'_>, ch: char) -> std::fmt::Result {
    writeln!(f, "{}", ch.to_string().repeat(RULE_WIDTH))
}

fn heading(f: &mut Formatter<'_>, title: &str) -> std::fmt::Result {
    writeln!(f, "{title}")?;
    rule(f, '-')
}

impl Display for SalesReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        rule(f, '=')?;
        writeln!(f, "     SALES ANALYTICS REPORT")?;
        writeln!(
            f,
            "     Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "     Records Processed: {}", self.transaction_count)?;
        rule(f, '=')?;
        writeln!(f)?;

        heading(f, "OVERALL SUMMARY")?;
        writeln!(f, "Total Revenue:        {}", self.total_revenue.grouped())?;
        writeln!(f, "Total Transactions:   {}", self.transaction_count)?;
        writeln!(f, "Average Order Value:  {}", self.avg_order_value.grouped())?;
        match &self.date_range {
            Some((first, last)) => writeln!(f, "Date Range:           {first} to {last}")?,
            None => writeln!(f, "Date Range:           N/A")?,
        }
        writeln!(f)?;

        heading(f, "REGION-WISE PERFORMANCE")?;
        writeln!(
            f,
            "{:<10} {:<15} {:<12} {:<12}",
            "Region", "Sales", "% of Total", "Transactions"
        )?;
        rule(f, '-')?;
        for r in &self.regions {
            writeln!(
                f,
                "{:<10} {:<15} {:<12} {}",
                r.region,
                r.total_sales.grouped(),
                format!("{:.2}%", r.percentage),
                r.transaction_count
            )?;
        }
        writeln!(f)?;

        heading(f, &format!("TOP {} PRODUCTS", self.options.top_n))?;
        writeln!(
            f,
            "{:<6} {:<20} {:<6} {:<10}",
            "Rank", "Product Name", "Qty", "Revenue"
        )?;
        rule(f, '-')?;
        for (rank, p) in self.top_products.iter().enumerate() {
            writeln!(
                f,
                "{:<6} {:<20} {:<6} {}",
                rank + 1,
                p.name,
                p.total_quantity,
                p.total_revenue.grouped()
            )?;
        }
        writeln!(f)?;

        heading(f, &format!("TOP {TOP_CUSTOMERS} CUSTOMERS"))?;
        writeln!(
            f,
            "{:<6} {:<15} {:<12} {:<8}",
            "Rank", "Customer ID", "Total Spent", "Orders"
        )?;
        rule(f, '-')?;
        for (rank, c) in self.top_customers.iter().enumerate() {
            writeln!(
                f,
                "{:<6} {:<15} {:<12} {}",
                rank + 1,
                c.customer_id,
                c.total_spent.grouped(),
                c.purchase_count
            )?;
        }
        writeln!(f)?;

        heading(f, "DAILY SALES TREND")?;
        writeln!(
            f,
            "{:<12} {:<12} {:<8} {:<10}",
            "Date", "Revenue", "Txns", "Customers"
        )?;
        rule(f, '-')?;
        for d in &self.daily_trend {
            writeln!(
                f,
                "{:<12} {:<12} {:<8} {}",
                d.date,
                d.revenue.grouped(),
                d.transaction_count,
                d.unique_customers
            )?;
        }
        writeln!(f)?;

        heading(f, "PRODUCT PERFORMANCE ANALYSIS")?;
        writeln!(
            f,
            "Best Selling Day: {} (Revenue: {}, Transactions: {})",
            self.peak_day.date.as_deref().unwrap_or("N/A"),
            self.peak_day.revenue.grouped(),
            self.peak_day.transaction_count
        )?;
        writeln!(f)?;
        if self.low_products.is_empty() {
            writeln!(f, "Low Performing Products: None")?;
        } else {
            writeln!(
                f,
                "Low Performing Products (Quantity < {}):",
                self.options.low_threshold
            )?;
            writeln!(f, "{:<20} {:<6} {:<10}", "Product Name", "Qty", "Revenue")?;
            rule(f, '-')?;
            for p in &self.low_products {
                writeln!(
                    f,
                    "{:<20} {:<6} {}",
                    p.name,
                    p.total_quantity,
                    p.total_revenue.grouped()
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Average Transaction Value per Region:")?;
        writeln!(f, "{:<10} {:<12}", "Region", "Avg Value")?;
        rule(f, '-')?;
        for (region, avg) in self.region_averages() {
            writeln!(f, "{region:<10} {}", avg.grouped())?;
        }
        writeln!(f)?;

        heading(f, "API ENRICHMENT SUMMARY")?;
        writeln!(f, "Total Products Enriched: {}", self.enrichment.matched)?;
        writeln!(
            f,
            "Success Rate:            {:.2}%",
            self.enrichment.success_rate
        )?;
        writeln!(f)?;
        if self.enrichment.unmatched_products.is_empty() {
            writeln!(f, "All products successfully enriched.")?;
        } else {
            writeln!(f, "Products That Couldn't Be Enriched:")?;
            for name in &self.enrichment.unmatched_products {
                writeln!(f, "  - {name}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        catalog::{decode_products, ProductMapping},
        enrich::enrich_sales_data,
        transaction::parse_transactions,
    };

    fn report() -> SalesReport {
        let txs = parse_transactions([
            "T1|2024-12-01|P101|Laptop|2|45000.00|C001|North",
            "T2|2024-12-01|P102|Mouse|10|500.00|C002|South",
            "T3|2024-12-02|P103|Keyboard|3|1500.00|C001|East",
            "T4|2024-12-02|P101|Laptop|1|45000.00|C003|West",
            "T5|2024-12-03|P102|Mouse|5|500.00|C002|South",
        ]);
        let products =
            decode_products(r#"{"products": [{"id": 101, "category": "laptops"}]}"#).unwrap();
        let enriched = enrich_sales_data(&txs, &ProductMapping::from_products(&products));
        SalesReport::new(&txs, &enriched)
    }

    #[test]
    fn new_fn_computes_overall_summary() {
        let report = report();
        assert_eq!(report.transaction_count, 5);
        assert_eq!(report.total_revenue, "147000".parse().unwrap());
        assert_eq!(report.avg_order_value, "29400".parse().unwrap());
        assert_eq!(
            report.date_range,
            Some(("2024-12-01".to_string(), "2024-12-03".to_string()))
        );
        assert_eq!(report.enrichment.matched, 2);
    }

    #[test]
    fn region_averages_fn_sorts_by_average_descending() {
        let report = report();
        let regions: Vec<_> = report.region_averages().into_iter().map(|(r, _)| r).collect();
        assert_eq!(regions, vec!["North", "West", "East", "South"]);
    }

    #[test]
    fn display_renders_every_section() {
        let text = report().to_string();
        for section in [
            "SALES ANALYTICS REPORT",
            "OVERALL SUMMARY",
            "REGION-WISE PERFORMANCE",
            "TOP 5 PRODUCTS",
            "TOP 5 CUSTOMERS",
            "DAILY SALES TREND",
            "PRODUCT PERFORMANCE ANALYSIS",
            "Average Transaction Value per Region:",
            "API ENRICHMENT SUMMARY",
        ] {
            assert!(text.contains(section), "missing {section:?} in:\n{text}");
        }
        assert!(text.contains("Total Revenue:        147,000.00"));
        assert!(text.contains("Date Range:           2024-12-01 to 2024-12-03"));
        assert!(text.contains("Best Selling Day: 2024-12-01 (Revenue: 95,000.00, Transactions: 2)"));
        assert!(text.contains("Low Performing Products (Quantity < 10):"));
        assert!(text.contains("Success Rate:            40.00%"));
        assert!(text.contains("  - Keyboard\n  - Mouse\n"));
    }

    #[test]
    fn display_handles_empty_report() {
        let text = SalesReport::new(&[], &[]).to_string();
        assert!(text.contains("Records Processed: 0"));
        assert!(text.contains("Date Range:           N/A"));
        assert!(text.contains("Best Selling Day: N/A (Revenue: 0.00, Transactions: 0)"));
        assert!(text.contains("Low Performing Products: None"));
        assert!(text.contains("All products successfully enriched."));
    }

    #[test]
    fn write_report_fn_creates_directory_and_writes_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output").join("sales_report.txt");
        let report = report();
        report.write_report(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), report.to_string());
    }
}

//! Derived views over a set of valid transactions.
//!
//! Every function here takes an immutable slice and builds a fresh result,
//! so calling one twice on the same input gives the same answer. Grouped
//! views keep groups in the order their key was first seen, and all sorts
//! are stable, so ties come out in input order.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::{transaction::Transaction, usd::Usd};

/// How many products [`top_selling_products`] returns by default.
pub const DEFAULT_TOP_N: usize = 5;

/// Products selling fewer units than this are low performers by default.
pub const DEFAULT_LOW_THRESHOLD: i64 = 10;

/// Sales for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSales {
    pub region: String,
    pub total_sales: Usd,
    pub transaction_count: usize,
    /// Share of total revenue, from 0 to 100.
    pub percentage: f64,
}

/// Units and revenue for one product name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSales {
    pub name: String,
    pub total_quantity: i64,
    pub total_revenue: Usd,
}

/// Spending summary for one customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub total_spent: Usd,
    pub purchase_count: usize,
    pub avg_order_value: Usd,
    /// Distinct product names, sorted.
    pub products_bought: Vec<String>,
}

/// Sales for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySales {
    pub date: String,
    pub revenue: Usd,
    pub transaction_count: usize,
    pub unique_customers: usize,
}

/// The date with the highest revenue.
///
/// `date` is `None` when there were no sales at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeakDay {
    pub date: Option<String>,
    pub revenue: Usd,
    pub transaction_count: usize,
}

/// Groups keyed by a borrowed string, kept in first-seen order.
struct Grouped<'a, V> {
    index: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, V)>,
}

impl<'a, V: Default> Grouped<'a, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: &'a str) -> &mut V {
        let entries = &mut self.entries;
        let i = *self.index.entry(key).or_insert_with(|| {
            entries.push((key, V::default()));
            entries.len() - 1
        });
        &mut self.entries[i].1
    }

    fn into_entries(self) -> Vec<(&'a str, V)> {
        self.entries
    }
}

/// Groups `transactions` by `key`, folding each into its group with `add`.
fn group_by<'a, V: Default>(
    transactions: &'a [Transaction],
    key: impl Fn(&'a Transaction) -> &'a str,
    mut add: impl FnMut(&mut V, &'a Transaction),
) -> Vec<(&'a str, V)> {
    let mut groups = Grouped::new();
    for tx in transactions {
        add(groups.entry(key(tx)), tx);
    }
    groups.into_entries()
}

#[derive(Default)]
struct Totals {
    quantity: i64,
    revenue: Usd,
    count: usize,
}

fn product_totals(transactions: &[Transaction]) -> Vec<ProductSales> {
    group_by(
        transactions,
        |t| t.product_name.as_str(),
        |acc: &mut Totals, t| {
            acc.quantity += t.quantity;
            acc.revenue += t.amount();
        },
    )
    .into_iter()
    .map(|(name, acc)| ProductSales {
        name: name.to_string(),
        total_quantity: acc.quantity,
        total_revenue: acc.revenue,
    })
    .collect()
}

/// Returns the sum of every transaction's amount.
#[must_use]
pub fn total_revenue(transactions: &[Transaction]) -> Usd {
    transactions.iter().map(Transaction::amount).sum()
}

/// Returns sales per region, highest total first.
#[must_use]
pub fn region_wise_sales(transactions: &[Transaction]) -> Vec<RegionSales> {
    let total = total_revenue(transactions);
    let mut regions: Vec<RegionSales> = group_by(
        transactions,
        |t| t.region.as_str(),
        |acc: &mut Totals, t| {
            acc.revenue += t.amount();
            acc.count += 1;
        },
    )
    .into_iter()
    .map(|(region, acc)| RegionSales {
        region: region.to_string(),
        total_sales: acc.revenue,
        transaction_count: acc.count,
        percentage: acc.revenue.percent_of(total),
    })
    .collect();
    regions.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));
    regions
}

/// Returns the `n` products with the most units sold, highest first.
#[must_use]
pub fn top_selling_products(transactions: &[Transaction], n: usize) -> Vec<ProductSales> {
    let mut products = product_totals(transactions);
    products.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    products.truncate(n);
    products
}

/// Returns per-customer spending, biggest spender first.
#[must_use]
pub fn customer_analysis<'a>(transactions: &'a [Transaction]) -> Vec<CustomerSummary> {
    #[derive(Default)]
    struct Acc<'t> {
        spent: Usd,
        count: usize,
        products: BTreeSet<&'t str>,
    }

    let mut customers: Vec<CustomerSummary> = group_by(
        transactions,
        |t| t.customer_id.as_str(),
        |acc: &mut Acc<'a>, t| {
            acc.spent += t.amount();
            acc.count += 1;
            acc.products.insert(t.product_name.as_str());
        },
    )
    .into_iter()
    .map(|(customer_id, acc)| CustomerSummary {
        customer_id: customer_id.to_string(),
        total_spent: acc.spent,
        purchase_count: acc.count,
        avg_order_value: acc.spent.mean(acc.count),
        products_bought: acc.products.into_iter().map(String::from).collect(),
    })
    .collect();
    customers.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
    customers
}

/// Returns sales per date, in ascending (string) order of date.
#[must_use]
pub fn daily_sales_trend(transactions: &[Transaction]) -> Vec<DailySales> {
    #[derive(Default)]
    struct Acc<'t> {
        revenue: Usd,
        count: usize,
        customers: HashSet<&'t str>,
    }

    let mut days: BTreeMap<&str, Acc> = BTreeMap::new();
    for tx in transactions {
        let day = days.entry(tx.date.as_str()).or_default();
        day.revenue += tx.amount();
        day.count += 1;
        day.customers.insert(tx.customer_id.as_str());
    }
    days.into_iter()
        .map(|(date, acc)| DailySales {
            date: date.to_string(),
            revenue: acc.revenue,
            transaction_count: acc.count,
            unique_customers: acc.customers.len(),
        })
        .collect()
}

/// Returns the date with the highest revenue.
///
/// Dates are compared in the order they first appear, and a later date only
/// replaces the current peak if its revenue is strictly greater. On a tie the
/// earlier date wins.
#[must_use]
pub fn find_peak_sales_day(transactions: &[Transaction]) -> PeakDay {
    let days = group_by(
        transactions,
        |t| t.date.as_str(),
        |acc: &mut Totals, t| {
            acc.revenue += t.amount();
            acc.count += 1;
        },
    );
    let mut peak = PeakDay::default();
    for (date, acc) in days {
        if acc.revenue > peak.revenue {
            peak = PeakDay {
                date: Some(date.to_string()),
                revenue: acc.revenue,
                transaction_count: acc.count,
            };
        }
    }
    peak
}

/// Returns products that sold fewer than `threshold` units, fewest first.
#[must_use]
pub fn low_performing_products(transactions: &[Transaction], threshold: i64) -> Vec<ProductSales> {
    let mut products: Vec<_> = product_totals(transactions)
        .into_iter()
        .filter(|p| p.total_quantity < threshold)
        .collect();
    products.sort_by_key(|p| p.total_quantity);
    products
}

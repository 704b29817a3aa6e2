use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::{transaction::Transaction, usd::Usd};

pub const TRANSACTION_ID_PREFIX: char = 'T';
pub const PRODUCT_ID_PREFIX: char = 'P';
pub const CUSTOMER_ID_PREFIX: char = 'C';

/// Optional filters applied to records that pass validation.
///
/// The region filter runs first, then the amount filter. Both amount bounds
/// are inclusive. An empty region string means "no region filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub region: Option<String>,
    pub min_amount: Option<Usd>,
    pub max_amount: Option<Usd>,
}

impl Filters {
    fn region(&self) -> Option<&str> {
        self.region.as_deref().filter(|r| !r.is_empty())
    }

    fn has_amount_range(&self) -> bool {
        self.min_amount.is_some() || self.max_amount.is_some()
    }

    fn amount_in_range(&self, amount: Usd) -> bool {
        self.min_amount.is_none_or(|min| amount >= min)
            && self.max_amount.is_none_or(|max| amount <= max)
    }
}

/// Why a record was rejected. Only the first failing rule is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingField,
    NonPositiveQuantityOrPrice,
    BadTransactionId,
    BadProductId,
    BadCustomerId,
}

/// Counts from one validation and filtering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub total_input: usize,
    pub invalid: usize,
    pub filtered_by_region: usize,
    pub filtered_by_amount: usize,
    pub final_count: usize,
}

/// What the data looks like, for an operator choosing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataOverview {
    /// Distinct non-empty regions, sorted.
    pub regions: Vec<String>,
    /// Smallest and largest positive transaction amount, if any.
    pub amount_range: Option<(Usd, Usd)>,
}

impl DataOverview {
    #[must_use]
    pub fn of(transactions: &[Transaction]) -> Self {
        let regions: BTreeSet<&str> = transactions
            .iter()
            .map(|t| t.region.as_str())
            .filter(|r| !r.is_empty())
            .collect();
        let amount_range = transactions
            .iter()
            .filter(|t| t.quantity > 0 && t.unit_price.is_positive())
            .map(Transaction::amount)
            .fold(None, |range, amount| match range {
                None => Some((amount, amount)),
                Some((min, max)) => Some((min.min(amount), max.max(amount))),
            });
        Self {
            regions: regions.into_iter().map(String::from).collect(),
            amount_range,
        }
    }
}

/// The outcome of [`validate_and_filter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validated {
    /// Records that passed validation and every requested filter.
    pub transactions: Vec<Transaction>,
    pub invalid_count: usize,
    pub summary: FilterSummary,
    /// Overview of the valid records before filtering.
    pub overview: DataOverview,
}

/// Checks one record against the business rules, in order.
///
/// # Errors
///
/// Returns the first rule the record breaks.
pub fn validate(tx: &Transaction) -> Result<(), Rejection> {
    let required = [
        &tx.transaction_id,
        &tx.date,
        &tx.product_id,
        &tx.product_name,
        &tx.customer_id,
        &tx.region,
    ];
    if required.iter().any(|field| field.is_empty()) {
        return Err(Rejection::MissingField);
    }
    if tx.quantity <= 0 || !tx.unit_price.is_positive() {
        return Err(Rejection::NonPositiveQuantityOrPrice);
    }
    if !tx.transaction_id.starts_with(TRANSACTION_ID_PREFIX) {
        return Err(Rejection::BadTransactionId);
    }
    if !tx.product_id.starts_with(PRODUCT_ID_PREFIX) {
        return Err(Rejection::BadProductId);
    }
    if !tx.customer_id.starts_with(CUSTOMER_ID_PREFIX) {
        return Err(Rejection::BadCustomerId);
    }
    Ok(())
}

/// Drops invalid records, then applies `filters` to what is left.
///
/// Every rejected record adds one to the invalid count, whichever rule it
/// broke. Filter removals are counted per stage and are independent of the
/// invalid count. The input is left untouched.
#[must_use]
pub fn validate_and_filter(transactions: &[Transaction], filters: &Filters) -> Validated {
    let total_input = transactions.len();
    let mut invalid_count = 0;
    let mut valid = Vec::with_capacity(total_input);
    for tx in transactions {
        match validate(tx) {
            Ok(()) => valid.push(tx.clone()),
            Err(reason) => {
                debug!(transaction = %tx.transaction_id, ?reason, "rejected record");
                invalid_count += 1;
            }
        }
    }
    let overview = DataOverview::of(&valid);

    let mut filtered = valid;
    let mut filtered_by_region = 0;
    if let Some(region) = filters.region() {
        let before = filtered.len();
        filtered.retain(|t| t.region == region);
        filtered_by_region = before - filtered.len();
        info!(region, remaining = filtered.len(), "applied region filter");
    }
    let mut filtered_by_amount = 0;
    if filters.has_amount_range() {
        let before = filtered.len();
        filtered.retain(|t| filters.amount_in_range(t.amount()));
        filtered_by_amount = before - filtered.len();
        info!(remaining = filtered.len(), "applied amount filter");
    }

    let summary = FilterSummary {
        total_input,
        invalid: invalid_count,
        filtered_by_region,
        filtered_by_amount,
        final_count: filtered.len(),
    };
    Validated {
        transactions: filtered,
        invalid_count,
        summary,
        overview,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::transaction::parse_transactions;

    fn records() -> Vec<Transaction> {
        parse_transactions([
            "T1|2024-01-01|P101|Widget|5|10.00|C1|North",
            "T2|2024-01-01|X101|Widget|5|10.00|C1|North",
            "T3|2024-01-02|P102|Gadget|2|100.00|C2|South",
            "T4|2024-01-02|P103|Gizmo|0|100.00|C3|South",
            "T5|2024-01-03|P102|Gadget|1|100.00|C2|East",
            "T6|2024-01-03|P104|Doohickey|10|2.50|C4|North",
        ])
    }

    fn tx(line: &str) -> Transaction {
        parse_transactions([line]).remove(0)
    }

    #[rstest]
    #[case::valid("T1|d|P1|n|1|1.00|C1|r", Ok(()))]
    #[case::empty_date("T1||P1|n|1|1.00|C1|r", Err(Rejection::MissingField))]
    #[case::empty_region("T1|d|P1|n|1|1.00|C1|", Err(Rejection::MissingField))]
    #[case::zero_quantity("T1|d|P1|n|0|1.00|C1|r", Err(Rejection::NonPositiveQuantityOrPrice))]
    #[case::negative_price("T1|d|P1|n|1|-1.00|C1|r", Err(Rejection::NonPositiveQuantityOrPrice))]
    #[case::transaction_prefix("X1|d|P1|n|1|1.00|C1|r", Err(Rejection::BadTransactionId))]
    #[case::product_prefix("T1|d|X1|n|1|1.00|C1|r", Err(Rejection::BadProductId))]
    #[case::customer_prefix("T1|d|P1|n|1|1.00|X1|r", Err(Rejection::BadCustomerId))]
    #[case::first_rule_wins("X1|d|X1|n|0|1.00|X1|", Err(Rejection::MissingField))]
    #[case::sign_before_prefix("X1|d|P1|n|0|1.00|C1|r", Err(Rejection::NonPositiveQuantityOrPrice))]
    fn validate_fn_applies_rules_in_order(
        #[case] line: &str,
        #[case] expected: Result<(), Rejection>,
    ) {
        assert_eq!(validate(&tx(line)), expected);
    }

    #[test]
    fn validate_and_filter_fn_counts_invalid_records_once() {
        let input = records();
        let result = validate_and_filter(&input, &Filters::default());
        assert_eq!(result.invalid_count, 2);
        assert_eq!(
            result.summary,
            FilterSummary {
                total_input: 6,
                invalid: 2,
                filtered_by_region: 0,
                filtered_by_amount: 0,
                final_count: 4,
            }
        );
        assert_eq!(
            result.summary.invalid + result.transactions.len(),
            result.summary.total_input
        );
    }

    #[test]
    fn validate_and_filter_fn_filters_by_region_then_amount() {
        let input = records();
        let filters = Filters {
            region: Some("North".into()),
            min_amount: Some("25".parse().unwrap()),
            max_amount: Some("50".parse().unwrap()),
        };
        let result = validate_and_filter(&input, &filters);
        let ids: Vec<_> = result
            .transactions
            .iter()
            .map(|t| t.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T1", "T6"]);
        assert_eq!(result.summary.filtered_by_region, 2);
        assert_eq!(result.summary.filtered_by_amount, 0);
        assert_eq!(result.summary.final_count, 2);
    }

    #[test]
    fn validate_and_filter_fn_amount_bounds_are_inclusive() {
        let input = records();
        let filters = Filters {
            min_amount: Some("50".parse().unwrap()),
            max_amount: Some("100".parse().unwrap()),
            ..Filters::default()
        };
        let result = validate_and_filter(&input, &filters);
        let ids: Vec<_> = result
            .transactions
            .iter()
            .map(|t| t.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T1", "T5"]);
        assert_eq!(result.summary.filtered_by_amount, 2);
    }

    #[test]
    fn validate_and_filter_fn_ignores_empty_region_filter() {
        let input = records();
        let filters = Filters {
            region: Some(String::new()),
            ..Filters::default()
        };
        let result = validate_and_filter(&input, &filters);
        assert_eq!(result.summary.filtered_by_region, 0);
        assert_eq!(result.summary.final_count, 4);
    }

    #[test]
    fn validate_and_filter_fn_reports_overview_of_valid_records() {
        let input = records();
        let filters = Filters {
            region: Some("East".into()),
            ..Filters::default()
        };
        let result = validate_and_filter(&input, &filters);
        assert_eq!(result.overview.regions, vec!["East", "North", "South"]);
        assert_eq!(
            result.overview.amount_range,
            Some(("25".parse().unwrap(), "200".parse().unwrap()))
        );
    }

    #[test]
    fn validate_and_filter_fn_handles_empty_input() {
        let result = validate_and_filter(&[], &Filters::default());
        assert!(result.transactions.is_empty());
        assert_eq!(result.summary, FilterSummary::default());
        assert_eq!(result.overview, DataOverview::default());
    }

    #[test]
    fn validate_and_filter_fn_survives_totals_beyond_decimal_range() {
        let parsed = parse_transactions([
            "T1|2024-01-01|P1|Big|1000000000000000|100000000000000|C1|North",
            "T2|2024-01-01|P1|Huge|1|70000000000000000000000000000|C1|North",
            "T3|2024-01-02|P1|Huge|1|70000000000000000000000000000|C2|North",
        ]);
        assert_eq!(parsed.len(), 2);
        let validated = validate_and_filter(&parsed, &Filters::default());
        assert_eq!(validated.transactions.len(), 2);
        let total = crate::analysis::total_revenue(&validated.transactions);
        assert!(total > validated.transactions[0].amount());
    }

    #[test]
    fn overview_of_fn_skips_non_positive_amounts() {
        let input = records();
        let overview = DataOverview::of(&input);
        assert_eq!(
            overview.amount_range,
            Some(("25".parse().unwrap(), "200".parse().unwrap()))
        );
    }
}

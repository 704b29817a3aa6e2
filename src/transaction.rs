use tracing::debug;

use crate::usd::Usd;

/// Field separator in sales transaction logs.
pub const DELIMITER: char = '|';

/// Number of fields in a transaction line.
pub const FIELD_COUNT: usize = 8;

/// A single sales transaction, as parsed from one line of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub transaction_id: String,
    pub date: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Usd,
    pub customer_id: String,
    pub region: String,
}

impl Transaction {
    /// Returns the revenue of this transaction: quantity times unit price.
    #[must_use]
    pub fn amount(&self) -> Usd {
        self.unit_price * self.quantity
    }
}

/// Parses raw transaction lines (header already removed) into records.
///
/// Each line must hold exactly [`FIELD_COUNT`] fields separated by
/// [`DELIMITER`]. Fields are trimmed, and commas are removed from the product
/// name and from both numeric fields, so that `1,500.00` reads as `1500.00`.
///
/// Parsing is best-effort: blank lines, lines with the wrong number of
/// fields, and lines whose quantity or unit price is empty or not a number
/// are skipped without any error. Callers that need to know how many rows
/// were dropped should compare the input and output lengths.
///
/// # Examples
///
/// ```
/// # use sales_analytics::parse_transactions;
/// let records = parse_transactions(["T1|2024-01-01|P101|Widget|5|10.00|C1|North"]);
/// assert_eq!(records[0].quantity, 5);
/// assert_eq!(records[0].amount().to_string(), "50.00");
/// ```
pub fn parse_transactions<I, S>(lines: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = 0;
    let records: Vec<_> = lines
        .into_iter()
        .inspect(|_| seen += 1)
        .filter_map(|line| parse_line(line.as_ref()))
        .collect();
    debug!(
        lines = seen,
        parsed = records.len(),
        skipped = seen - records.len(),
        "parsed transaction lines"
    );
    records
}

fn parse_line(line: &str) -> Option<Transaction> {
    if line.trim().is_empty() {
        return None;
    }
    let fields: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
    let [transaction_id, date, product_id, product_name, quantity, unit_price, customer_id, region] =
        fields[..]
    else {
        return None;
    };
    let quantity = quantity.replace(',', "");
    let unit_price = unit_price.replace(',', "");
    if quantity.is_empty() || unit_price.is_empty() {
        return None;
    }
    let quantity: i64 = quantity.parse().ok()?;
    let unit_price: Usd = unit_price.parse().ok()?;
    unit_price.checked_mul(quantity)?;
    Some(Transaction {
        transaction_id: transaction_id.to_string(),
        date: date.to_string(),
        product_id: product_id.to_string(),
        product_name: product_name.replace(',', ""),
        quantity,
        unit_price,
        customer_id: customer_id.to_string(),
        region: region.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fn_reads_well_formed_line() {
        let records = parse_transactions(["T1|2024-01-01|P101|Widget|5|10.00|C1|North"]);
        assert_eq!(
            records,
            vec![Transaction {
                transaction_id: "T1".into(),
                date: "2024-01-01".into(),
                product_id: "P101".into(),
                product_name: "Widget".into(),
                quantity: 5,
                unit_price: "10.00".parse().unwrap(),
                customer_id: "C1".into(),
                region: "North".into(),
            }]
        );
        assert_eq!(records[0].amount(), "50".parse().unwrap());
    }

    #[test]
    fn parse_fn_trims_fields_and_strips_commas() {
        let records =
            parse_transactions([" T2 | 2024-01-02 | P102 |Key,board, Deluxe| 1,200 | 1,500.50 | C2 | East "]);
        let tx = &records[0];
        assert_eq!(tx.transaction_id, "T2");
        assert_eq!(tx.product_name, "Keyboard Deluxe");
        assert_eq!(tx.quantity, 1200);
        assert_eq!(tx.unit_price, "1500.50".parse().unwrap());
        assert_eq!(tx.region, "East");
    }

    #[test]
    fn parse_fn_skips_rows_with_wrong_field_count() {
        let records = parse_transactions([
            "T1|2024-01-01|P101|Widget|5|10.00|C1",
            "T1|2024-01-01|P101|Widget|5|10.00|C1|North|extra",
            "",
            "   ",
        ]);
        assert!(records.is_empty());
    }

    #[test]
    fn parse_fn_skips_rows_with_empty_or_bad_numbers() {
        let records = parse_transactions([
            "T1|2024-01-01|P101|Widget|,|10.00|C1|North",
            "T2|2024-01-01|P101|Widget|5||C1|North",
            "T3|2024-01-01|P101|Widget|five|10.00|C1|North",
            "T4|2024-01-01|P101|Widget|5|ten|C1|North",
            "T5|2024-01-01|P101|Widget|2.5|10.00|C1|North",
        ]);
        assert!(records.is_empty());
    }

    #[test]
    fn parse_fn_skips_rows_whose_amount_overflows() {
        let records = parse_transactions([
            "T1|2024-01-01|P1|Big|1000000000000000|100000000000000|C1|North",
            "T2|2024-01-01|P1|Small|1|100000000000000|C1|North",
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction_id, "T2");
    }

    #[test]
    fn parse_fn_keeps_rows_that_will_fail_validation() {
        let records = parse_transactions([
            "T2|2024-01-01|X101|Widget|5|10.00|C1|North",
            "T3|2024-01-01|P101|Widget|-1|10.00|C1|North",
            "T4|2024-01-01|P101|Widget|1|10.00|C1|",
        ]);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].quantity, -1);
        assert_eq!(records[2].region, "");
    }
}

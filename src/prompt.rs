use tracing::warn;

use std::io::{self, BufRead, Write};

use crate::{usd::Usd, validate::Filters};

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn ask_amount<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<Option<Usd>> {
    let answer = ask(input, output, question)?;
    if answer.is_empty() {
        return Ok(None);
    }
    match answer.parse() {
        Ok(amount) => Ok(Some(amount)),
        Err(e) => {
            warn!("ignoring amount {answer:?}: {e}");
            writeln!(output, "Not a number, skipping: {answer}")?;
            Ok(None)
        }
    }
}

/// Asks the operator, on `output`, whether and how to filter the data.
///
/// Any answer other than `y` to the first question means no filtering.
/// Empty answers skip that filter, as do amounts that are not numbers.
///
/// # Errors
///
/// Returns any error from reading `input` or writing `output`.
pub fn prompt_filters<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Filters> {
    let choice = ask(input, output, "Filter data? [y/n]: ")?;
    if !choice.eq_ignore_ascii_case("y") {
        return Ok(Filters::default());
    }
    let region = ask(input, output, "Region (Enter to skip): ")?;
    let min_amount = ask_amount(input, output, "Min amount (Enter to skip): ")?;
    let max_amount = ask_amount(input, output, "Max amount (Enter to skip): ")?;
    Ok(Filters {
        region: Some(region).filter(|r| !r.is_empty()),
        min_amount,
        max_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(answers: &str) -> (Filters, String) {
        let mut output = Vec::new();
        let filters = prompt_filters(&mut answers.as_bytes(), &mut output).unwrap();
        (filters, String::from_utf8(output).unwrap())
    }

    #[test]
    fn prompt_filters_fn_returns_no_filters_unless_asked() {
        let (filters, output) = run("n\n");
        assert_eq!(filters, Filters::default());
        assert_eq!(output, "Filter data? [y/n]: ");
        assert_eq!(run("").0, Filters::default());
    }

    #[test]
    fn prompt_filters_fn_collects_every_filter() {
        let (filters, _) = run("Y\nNorth\n1,000\n5000.50\n");
        assert_eq!(
            filters,
            Filters {
                region: Some("North".into()),
                min_amount: Some("1000".parse().unwrap()),
                max_amount: Some("5000.50".parse().unwrap()),
            }
        );
    }

    #[test]
    fn prompt_filters_fn_skips_blank_and_bad_answers() {
        let (filters, output) = run("y\n\nlots\n\n");
        assert_eq!(filters, Filters::default());
        assert!(output.contains("Not a number, skipping: lots"));
    }
}

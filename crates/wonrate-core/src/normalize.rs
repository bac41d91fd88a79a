//! Raw payload → canonical record conversion.
//!
//! Every source funnels its numbers through [`parse_rate`] and its tabular
//! rows through [`row_to_record`], so the composite id stays injective on
//! (date, currency) regardless of which upstream produced the row.

use crate::{Currency, RateDate, RateKind, RateRecord};

/// Parses a locale-formatted quote cell.
///
/// Thousands separators and any other non-numeric decoration are
/// stripped; an empty or unparseable cell yields `0.0`, never an error and
/// never NaN.
pub fn parse_rate(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Converts one daily-quote table row into a record.
///
/// Positional contract with the upstream table layout: cell 0 is the date
/// (`YYYY.MM.DD`), 1 the base rate, 3 cash buy, 4 cash sell, 5 remit-send
/// (TT sell), 6 remit-receive (TT buy). Rows with fewer than 7 cells, an
/// empty date cell, or an unparseable date are skipped silently.
pub fn row_to_record(cells: &[String], currency: Currency) -> Option<RateRecord> {
    if cells.len() < 7 {
        return None;
    }

    let raw_date = cells[0].trim();
    if raw_date.is_empty() {
        return None;
    }

    let compact: String = raw_date.chars().filter(|ch| ch.is_ascii_digit()).collect();
    let date = RateDate::parse_compact(&compact).ok()?;

    Some(
        RateRecord::new(currency, date, parse_rate(&cells[1]), RateKind::Bank).with_quotes(
            Some(parse_rate(&cells[3])),
            Some(parse_rate(&cells[4])),
            Some(parse_rate(&cells[6])),
            Some(parse_rate(&cells[5])),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| (*cell).to_owned()).collect()
    }

    #[test]
    fn normalizes_a_full_daily_quote_row() {
        let cells = row(&[
            "2024.03.01",
            "1,330.50",
            "",
            "1,345.00",
            "1,316.00",
            "1,320.00",
            "1,341.00",
        ]);

        let record = row_to_record(&cells, Currency::Usd).expect("row should normalize");
        assert_eq!(record.id, "20240301-USD");
        assert_eq!(record.date.dashed(), "2024-03-01");
        assert_eq!(record.rate, 1330.5);
        assert_eq!(record.cash_buy, Some(1345.0));
        assert_eq!(record.cash_sell, Some(1316.0));
        assert_eq!(record.tt_sell, Some(1320.0));
        assert_eq!(record.tt_buy, Some(1341.0));
        assert_eq!(record.kind, RateKind::Bank);
    }

    #[test]
    fn skips_short_rows_and_empty_dates() {
        let short = row(&["2024.03.01", "1,330.50", "", "1,345.00"]);
        assert!(row_to_record(&short, Currency::Usd).is_none());

        let empty_date = row(&["  ", "1,330.50", "", "1,345.00", "1,316.00", "1,320.00", "1,341.00"]);
        assert!(row_to_record(&empty_date, Currency::Usd).is_none());
    }

    #[test]
    fn non_numeric_rate_cell_becomes_zero() {
        let cells = row(&["2024.03.01", "n/a", "", "-", "-", "-", "-"]);
        let record = row_to_record(&cells, Currency::Eur).expect("row should normalize");
        assert_eq!(record.rate, 0.0);
        assert_eq!(record.cash_buy, Some(0.0));
    }

    #[test]
    fn parse_rate_strips_thousands_separators() {
        assert_eq!(parse_rate("1,330.50"), 1330.5);
        assert_eq!(parse_rate(" 190.12 "), 190.12);
        assert_eq!(parse_rate(""), 0.0);
        assert_eq!(parse_rate("abc"), 0.0);
    }
}

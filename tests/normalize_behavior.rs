//! Behavior tests for raw-row normalization and date spelling.

use wonrate_core::normalize::{parse_rate, row_to_record};
use wonrate_core::{Currency, RateDate, RateKind};

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| (*cell).to_owned()).collect()
}

#[test]
fn a_full_daily_quote_row_normalizes_to_the_canonical_record() {
    // Given: one raw row in the upstream's positional column layout
    let cells = row(&[
        "2024.03.01",
        "1,330.50",
        "",
        "1,345.00",
        "1,316.00",
        "1,320.00",
        "1,341.00",
    ]);

    // When: it is normalized for USD
    let record = row_to_record(&cells, Currency::Usd).expect("row should normalize");

    // Then: every quote variant lands in its canonical field
    assert_eq!(record.id, "20240301-USD");
    assert_eq!(record.date.dashed(), "2024-03-01");
    assert_eq!(record.rate, 1330.5);
    assert_eq!(record.cash_buy, Some(1345.0));
    assert_eq!(record.cash_sell, Some(1316.0));
    assert_eq!(record.tt_sell, Some(1320.0));
    assert_eq!(record.tt_buy, Some(1341.0));
    assert_eq!(record.kind, RateKind::Bank);
    assert_eq!(record.currency_name, "미국 달러");
}

#[test]
fn rows_with_fewer_than_seven_cells_are_excluded() {
    let cells = row(&["2024.03.01", "1,330.50", "", "1,345.00", "1,316.00", "1,320.00"]);
    assert!(row_to_record(&cells, Currency::Usd).is_none());
}

#[test]
fn rows_with_an_empty_date_cell_are_excluded() {
    let cells = row(&["", "1,330.50", "", "1,345.00", "1,316.00", "1,320.00", "1,341.00"]);
    assert!(row_to_record(&cells, Currency::Usd).is_none());
}

#[test]
fn a_non_numeric_rate_cell_normalizes_to_zero_not_an_error() {
    let cells = row(&["2024.03.01", "—", "", "N/A", "", "-", ""]);
    let record = row_to_record(&cells, Currency::Cny).expect("row should normalize");
    assert_eq!(record.rate, 0.0);
    assert_eq!(record.cash_buy, Some(0.0));
    assert_eq!(record.tt_buy, Some(0.0));
}

#[test]
fn parse_rate_strips_locale_decoration() {
    assert_eq!(parse_rate("1,330.50"), 1330.5);
    assert_eq!(parse_rate("1,330.50원"), 1330.5);
    assert_eq!(parse_rate("  905.18  "), 905.18);
    assert_eq!(parse_rate(""), 0.0);
    assert_eq!(parse_rate("n/a"), 0.0);
}

#[test]
fn eight_digit_dates_round_trip_through_both_spellings() {
    for compact in ["20240101", "20241231", "20240229", "20000301"] {
        let date = RateDate::parse_compact(compact).expect("valid 8-digit date");
        assert_eq!(date.compact(), compact);

        let reparsed = RateDate::parse_dashed(&date.dashed()).expect("dashed form reparses");
        assert_eq!(reparsed, date);
    }
}

#[test]
fn record_ids_are_injective_on_date_and_currency() {
    let date_a = RateDate::parse("2024-03-01").expect("must parse");
    let date_b = RateDate::parse("2024-03-08").expect("must parse");

    let mut ids = std::collections::HashSet::new();
    for date in [date_a, date_b] {
        for currency in Currency::ALL {
            let record = wonrate_core::RateRecord::new(currency, date, 1.0, RateKind::Bank);
            assert!(ids.insert(record.id.clone()), "duplicate id {}", record.id);
        }
    }
    assert_eq!(ids.len(), 8);
}

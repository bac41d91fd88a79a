//! Merging and derived views over normalized rate records.
//!
//! The record id is the only merge key: applying cached/static records
//! first and freshly fetched records second means a fresh fetch always
//! overwrites what was remembered for the same (date, currency).

use std::collections::HashMap;

use serde::Serialize;

use crate::{Currency, RateDate, RateRecord};

/// Merges two record sets by id, `fresh` winning on collisions.
///
/// The result is sorted date-descending with ties broken by currency
/// code, the order the snapshot job publishes.
pub fn merge_records(base: Vec<RateRecord>, fresh: Vec<RateRecord>) -> Vec<RateRecord> {
    let mut by_id: HashMap<String, RateRecord> = HashMap::with_capacity(base.len() + fresh.len());
    for record in base.into_iter().chain(fresh) {
        by_id.insert(record.id.clone(), record);
    }

    let mut merged: Vec<RateRecord> = by_id.into_values().collect();
    sort_descending(&mut merged);
    merged
}

/// Newest-first ordering: date descending, then currency code ascending.
pub fn sort_descending(records: &mut [RateRecord]) {
    records.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.currency_code.cmp(&b.currency_code))
    });
}

/// The two most recent publish dates' record groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateBoard {
    pub latest: Vec<RateRecord>,
    pub previous: Vec<RateRecord>,
}

/// Groups a merged dataset by date and returns the groups for the two
/// most recent distinct dates. Either group may be empty when the
/// dataset holds fewer than two dates.
pub fn latest_and_previous(records: &[RateRecord]) -> RateBoard {
    let mut by_date: HashMap<RateDate, Vec<RateRecord>> = HashMap::new();
    for record in records {
        by_date.entry(record.date).or_default().push(record.clone());
    }

    let mut dates: Vec<RateDate> = by_date.keys().copied().collect();
    dates.sort_by(|a, b| b.cmp(a));

    let mut board = RateBoard::default();
    if let Some(date) = dates.first() {
        if let Some(mut group) = by_date.remove(date) {
            group.sort_by(|a, b| a.currency_code.cmp(&b.currency_code));
            board.latest = group;
        }
    }
    if let Some(date) = dates.get(1) {
        if let Some(mut group) = by_date.remove(date) {
            group.sort_by(|a, b| a.currency_code.cmp(&b.currency_code));
            board.previous = group;
        }
    }

    board
}

/// One chart sample: publish date and base rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: RateDate,
    pub rate: f64,
}

/// Base-rate series for one currency, oldest first, ready for chart
/// rendering.
pub fn chart_series(records: &[RateRecord], currency: Currency) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = records
        .iter()
        .filter(|record| record.currency_code == currency.code())
        .map(|record| ChartPoint {
            date: record.date,
            rate: record.rate,
        })
        .collect();

    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RateKind;

    fn record(currency: Currency, date: &str, rate: f64) -> RateRecord {
        RateRecord::new(
            currency,
            RateDate::parse(date).expect("must parse"),
            rate,
            RateKind::Bank,
        )
    }

    #[test]
    fn merge_is_union_of_ids_and_fresh_wins() {
        let base = vec![
            record(Currency::Usd, "2024-03-01", 1330.5),
            record(Currency::Eur, "2024-03-01", 1448.0),
        ];
        let fresh = vec![
            record(Currency::Usd, "2024-03-01", 1333.0),
            record(Currency::Usd, "2024-03-08", 1340.0),
        ];

        let merged = merge_records(base, fresh);
        assert_eq!(merged.len(), 3);

        let usd_old = merged
            .iter()
            .find(|r| r.id == "20240301-USD")
            .expect("shared id survives");
        assert_eq!(usd_old.rate, 1333.0);
    }

    #[test]
    fn merged_output_is_date_descending_then_code() {
        let merged = merge_records(
            vec![
                record(Currency::Jpy, "2024-03-01", 900.0),
                record(Currency::Usd, "2024-03-08", 1340.0),
            ],
            vec![record(Currency::Eur, "2024-03-08", 1450.0)],
        );

        let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["20240308-EUR", "20240308-USD", "20240301-JPY"]);
    }

    #[test]
    fn latest_and_previous_take_the_two_newest_date_groups() {
        let mut records = Vec::new();
        for date in ["2024-03-01", "2024-03-08", "2024-02-23"] {
            for currency in Currency::ALL {
                records.push(record(currency, date, 1000.0));
            }
        }

        let board = latest_and_previous(&records);
        assert_eq!(board.latest.len(), 4);
        assert_eq!(board.previous.len(), 4);
        assert!(board.latest.iter().all(|r| r.date.dashed() == "2024-03-08"));
        assert!(board.previous.iter().all(|r| r.date.dashed() == "2024-03-01"));
    }

    #[test]
    fn single_date_leaves_previous_empty() {
        let records = vec![record(Currency::Usd, "2024-03-01", 1330.5)];
        let board = latest_and_previous(&records);
        assert_eq!(board.latest.len(), 1);
        assert!(board.previous.is_empty());
    }

    #[test]
    fn chart_series_is_ascending_and_single_currency() {
        let records = vec![
            record(Currency::Usd, "2024-03-08", 1340.0),
            record(Currency::Jpy, "2024-03-08", 905.0),
            record(Currency::Usd, "2024-03-01", 1330.5),
        ];

        let series = chart_series(&records, Currency::Usd);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date.dashed(), "2024-03-01");
        assert_eq!(series[1].rate, 1340.0);
    }
}

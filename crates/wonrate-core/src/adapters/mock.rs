use std::future::Future;
use std::pin::Pin;

use crate::source::{ProviderId, RateQuery, RateSource, SourceError};
use crate::{Currency, RateDate, RateKind, RateRecord};

/// Deterministic fallback data for when no real source is reachable.
///
/// The perturbation is a function of the date alone, so charts over a
/// window look plausible and repeated runs agree. Mock records are never
/// written to the cache.
pub struct MockAdapter;

const BASE_RATES: [(Currency, f64); 4] = [
    (Currency::Usd, 1350.0),
    (Currency::Eur, 1450.0),
    (Currency::Cny, 190.0),
    (Currency::Jpy, 900.0),
];

impl MockAdapter {
    pub fn records_for_date(date: RateDate) -> Vec<RateRecord> {
        let seed = (date.compact().parse::<u64>().unwrap_or(0) % 100) as f64;
        let noise = |base: f64| base + seed.sin() * base * 0.05;

        BASE_RATES
            .iter()
            .map(|(currency, base)| {
                RateRecord::new(*currency, date, noise(*base), RateKind::Bank)
            })
            .collect()
    }
}

impl RateSource for MockAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Mock
    }

    fn fetch<'a>(
        &'a self,
        query: RateQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RateRecord>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(date) = query.date else {
                return Err(SourceError::parse("mock data requires a target date"));
            };

            let records = Self::records_for_date(date)
                .into_iter()
                .filter(|record| {
                    query
                        .currency
                        .is_none_or(|currency| record.currency_code == currency.code())
                })
                .collect();
            Ok(records)
        })
    }
}

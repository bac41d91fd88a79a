use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::http::{HttpClient, HttpRequest};
use crate::source::{ProviderId, RateQuery, RateSource, SourceError};
use crate::{Currency, RateDate, RateKind, RateRecord};

/// Reads the pre-built JSON snapshot published out-of-band.
///
/// The document is loaded lazily and memoized for the process lifetime:
/// a successful load hits the network exactly once no matter how many
/// times the source is queried. A failed load is not pinned, so a later
/// query may retry.
pub struct SnapshotAdapter {
    url: String,
    http: Arc<dyn HttpClient>,
    loaded: OnceCell<Vec<RateRecord>>,
}

impl SnapshotAdapter {
    pub fn new(url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            url: url.into(),
            http,
            loaded: OnceCell::new(),
        }
    }

    async fn load(&self) -> Result<&Vec<RateRecord>, SourceError> {
        self.loaded
            .get_or_try_init(|| async {
                let request = HttpRequest::get(&self.url);
                let response = self.http.execute(request).await.map_err(|error| {
                    SourceError::network(format!("snapshot fetch failed: {}", error.message()))
                })?;

                if !response.is_success() {
                    return Err(SourceError::upstream_status(format!(
                        "snapshot endpoint returned status {}",
                        response.status
                    )));
                }

                let rows: Vec<SnapshotRow> =
                    serde_json::from_slice(&response.body).map_err(|error| {
                        SourceError::parse(format!("snapshot document is not valid JSON: {error}"))
                    })?;

                let total = rows.len();
                let records: Vec<RateRecord> =
                    rows.into_iter().filter_map(SnapshotRow::into_record).collect();
                if records.len() < total {
                    debug!(
                        "snapshot: skipped {} row(s) outside the quoted currency set",
                        total - records.len()
                    );
                }

                Ok(records)
            })
            .await
    }
}

impl RateSource for SnapshotAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Snapshot
    }

    fn fetch<'a>(
        &'a self,
        query: RateQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RateRecord>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let records = self.load().await?;

            Ok(records
                .iter()
                .filter(|record| {
                    query.date.is_none_or(|date| record.date == date)
                        && query
                            .currency
                            .is_none_or(|currency| record.currency_code == currency.code())
                })
                .cloned()
                .collect())
        })
    }
}

/// Wire shape of one snapshot row.
///
/// The snapshot job writes both `rate` and `baseRate` for compatibility;
/// `baseRate` wins when both are present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRow {
    currency_code: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    rate: Option<f64>,
    #[serde(default)]
    base_rate: Option<f64>,
    #[serde(default)]
    cash_buy: Option<f64>,
    #[serde(default)]
    cash_sell: Option<f64>,
    #[serde(default)]
    tt_buy: Option<f64>,
    #[serde(default)]
    tt_sell: Option<f64>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl SnapshotRow {
    fn into_record(self) -> Option<RateRecord> {
        let currency = Currency::from_str(&self.currency_code).ok()?;
        let date = RateDate::parse(&self.date).ok()?;
        let rate = self.base_rate.or(self.rate).unwrap_or(0.0).max(0.0);
        let kind = self
            .kind
            .as_deref()
            .and_then(|raw| RateKind::from_str(raw).ok())
            .unwrap_or(RateKind::Bank);

        Some(
            RateRecord::new(currency, date, rate, kind).with_quotes(
                self.cash_buy,
                self.cash_sell,
                self.tt_buy,
                self.tt_sell,
            ),
        )
    }
}

use serde::Serialize;

use wonrate_core::reconcile;
use wonrate_core::{Config, Currency, ProviderId, RateBoard};

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyDelta {
    currency_code: &'static str,
    rate: f64,
    previous_rate: f64,
    delta: f64,
}

#[derive(Debug, Serialize)]
struct LatestResponseData {
    board: RateBoard,
    changes: Vec<CurrencyDelta>,
}

pub async fn run(config: &Config, provider: ProviderId) -> Result<CommandResult, CliError> {
    let (outcome, latency_ms) = super::fetch_cycle(config, provider).await?;

    let board = reconcile::latest_and_previous(&outcome.records);
    let changes = Currency::ALL
        .iter()
        .map(|currency| {
            let rate = rate_for(&board.latest, *currency);
            let previous_rate = rate_for(&board.previous, *currency);
            CurrencyDelta {
                currency_code: currency.code(),
                rate,
                previous_rate,
                delta: rate - previous_rate,
            }
        })
        .collect();

    let data = serde_json::to_value(LatestResponseData { board, changes })?;

    let mut result = CommandResult::ok(data, outcome.source_chain);
    result.warnings = outcome.warnings;
    result.errors = outcome.errors;
    result.latency_ms = latency_ms;
    result.cache_hit = outcome.cache_hit;
    Ok(result)
}

fn rate_for(records: &[wonrate_core::RateRecord], currency: Currency) -> f64 {
    records
        .iter()
        .find(|record| record.currency_code == currency.code())
        .map(|record| record.rate)
        .unwrap_or(0.0)
}

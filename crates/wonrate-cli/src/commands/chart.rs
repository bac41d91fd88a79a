use std::str::FromStr;

use serde::Serialize;

use wonrate_core::reconcile;
use wonrate_core::{ChartPoint, Config, Currency, ProviderId};

use crate::cli::ChartArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartResponseData {
    currency_code: &'static str,
    points: Vec<ChartPoint>,
}

pub async fn run(
    args: &ChartArgs,
    config: &Config,
    provider: ProviderId,
) -> Result<CommandResult, CliError> {
    let currency = Currency::from_str(&args.currency)?;

    let (outcome, latency_ms) = super::fetch_cycle(config, provider).await?;
    let points = reconcile::chart_series(&outcome.records, currency);

    let data = serde_json::to_value(ChartResponseData {
        currency_code: currency.code(),
        points,
    })?;

    let mut result = CommandResult::ok(data, outcome.source_chain);
    result.warnings = outcome.warnings;
    result.errors = outcome.errors;
    result.latency_ms = latency_ms;
    result.cache_hit = outcome.cache_hit;
    Ok(result)
}

use serde::Serialize;

use wonrate_core::{Config, ProviderId, RateRecord};

use crate::cli::RatesArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct RatesResponseData {
    count: usize,
    records: Vec<RateRecord>,
}

pub async fn run(
    args: &RatesArgs,
    config: &Config,
    provider: ProviderId,
) -> Result<CommandResult, CliError> {
    let (outcome, latency_ms) = super::fetch_cycle(config, provider).await?;

    let mut records = outcome.records;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    let data = serde_json::to_value(RatesResponseData {
        count: records.len(),
        records,
    })?;

    let mut result = CommandResult::ok(data, outcome.source_chain);
    result.warnings = outcome.warnings;
    result.errors = outcome.errors;
    result.latency_ms = latency_ms;
    result.cache_hit = outcome.cache_hit;
    Ok(result)
}

mod cache;
mod chart;
mod latest;
mod rates;
mod sources;

use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

use wonrate_core::{
    Config, Envelope, EnvelopeError, EnvelopeMeta, FetchOutcome, ProviderId, RateService,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub source_chain: Vec<ProviderId>,
}

impl CommandResult {
    pub fn ok(data: Value, source_chain: Vec<ProviderId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            cache_hit: false,
            source_chain,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let config = Config::from_env();
    let provider = cli.source.resolve(&config);

    let command_result = match &cli.command {
        Command::Rates(args) => rates::run(args, &config, provider).await?,
        Command::Latest => latest::run(&config, provider).await?,
        Command::Chart(args) => chart::run(args, &config, provider).await?,
        Command::Sources => sources::run(&config, provider)?,
        Command::Cache(args) => cache::run(args, &config, provider).await?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
        cache_hit,
        source_chain,
    } = command_result;

    let mut meta = EnvelopeMeta::new(
        Uuid::new_v4().to_string(),
        source_chain,
        latency_ms,
        cache_hit,
    );
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope::new(meta, data, errors))
}

/// Runs one timed fetch cycle for the selected provider.
pub(crate) async fn fetch_cycle(
    config: &Config,
    provider: ProviderId,
) -> Result<(FetchOutcome, u64), CliError> {
    let service = RateService::from_config(config, provider)?;

    let started = Instant::now();
    let outcome = service.fetch_cycle().await;
    let latency_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;

    Ok((outcome, latency_ms))
}

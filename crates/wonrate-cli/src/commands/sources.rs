use serde::Serialize;

use wonrate_core::{Config, ProviderId};

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SourceStatus {
    source: ProviderId,
    configured: bool,
    selected: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct SourcesResponseData {
    sources: Vec<SourceStatus>,
}

pub fn run(config: &Config, selected: ProviderId) -> Result<CommandResult, CliError> {
    let sources = ProviderId::ALL
        .iter()
        .map(|provider| {
            let (configured, detail) = match provider {
                ProviderId::Snapshot => (
                    config.snapshot_url.is_some(),
                    config
                        .snapshot_url
                        .clone()
                        .unwrap_or_else(|| "WONRATE_SNAPSHOT_URL is not set".to_owned()),
                ),
                ProviderId::Scrape => (true, config.proxy_base.clone()),
                ProviderId::OpenBanking => {
                    let ready = config.openbanking_base.is_some()
                        && config.open_banking_credentials().is_some();
                    let detail = if ready {
                        config.openbanking_base.clone().unwrap_or_default()
                    } else {
                        "endpoint or credentials missing".to_owned()
                    };
                    (ready, detail)
                }
                ProviderId::Mock => (
                    config.allow_mock,
                    if config.allow_mock {
                        "fallback enabled".to_owned()
                    } else {
                        "disabled by WONRATE_ALLOW_MOCK".to_owned()
                    },
                ),
            };

            SourceStatus {
                source: *provider,
                configured,
                selected: *provider == selected,
                detail,
            }
        })
        .collect();

    let data = serde_json::to_value(SourcesResponseData { sources })?;
    Ok(CommandResult::ok(data, vec![selected]))
}

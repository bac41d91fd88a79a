use serde_json::json;

use wonrate_core::{CacheStore, Config, ProviderId};

use crate::cli::{CacheArgs, CacheCommand};
use crate::error::CliError;

use super::CommandResult;

pub async fn run(
    args: &CacheArgs,
    config: &Config,
    selected: ProviderId,
) -> Result<CommandResult, CliError> {
    let Some(path) = &config.cache_file else {
        let data = json!({ "entries": 0, "file": null });
        return Ok(CommandResult::ok(data, vec![selected])
            .with_warning("WONRATE_CACHE_FILE is not set; the cache lives only in memory"));
    };

    let store = CacheStore::with_file(path);

    let data = match args.command {
        CacheCommand::Stats => {
            json!({ "entries": store.len().await, "file": path.display().to_string() })
        }
        CacheCommand::Clear => {
            let evicted = store.len().await;
            store.clear().await;
            json!({ "evicted": evicted, "file": path.display().to_string() })
        }
    };

    let mut result = CommandResult::ok(data, vec![selected]);
    result.cache_hit = true;
    Ok(result)
}

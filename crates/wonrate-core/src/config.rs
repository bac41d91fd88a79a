//! One-shot configuration resolution.
//!
//! Everything the sources need arrives through environment variables,
//! resolved exactly once at startup into an immutable [`Config`].
//! Credentials are only ever injected here; nothing in the adapters
//! carries a default secret.

use std::env;
use std::path::PathBuf;

use crate::adapters::OpenBankingCredentials;

pub const DEFAULT_PROXY_BASE: &str = "https://finance.naver.com";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;

/// Immutable runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL for the daily-quote scrape proxy.
    pub proxy_base: String,
    /// URL of the pre-built JSON snapshot, when one is published.
    pub snapshot_url: Option<String>,
    /// Base URL of the open-banking rate inquiry endpoint.
    pub openbanking_base: Option<String>,
    pub access_token: Option<String>,
    pub institution_code: Option<String>,
    pub fintech_app_no: Option<String>,
    pub api_service_code: Option<String>,
    /// Whether deterministic mock data may stand in when no real source
    /// is reachable.
    pub allow_mock: bool,
    /// JSON file backing the cache; in-memory only when unset.
    pub cache_file: Option<PathBuf>,
    /// History window for the daily-quote scrape.
    pub lookback_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_base: DEFAULT_PROXY_BASE.to_owned(),
            snapshot_url: None,
            openbanking_base: None,
            access_token: None,
            institution_code: None,
            fintech_app_no: None,
            api_service_code: None,
            allow_mock: true,
            cache_file: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl Config {
    /// Resolves configuration from `WONRATE_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            proxy_base: env_opt("WONRATE_PROXY_BASE").unwrap_or(defaults.proxy_base),
            snapshot_url: env_opt("WONRATE_SNAPSHOT_URL"),
            openbanking_base: env_opt("WONRATE_OPENBANKING_BASE"),
            access_token: env_opt("WONRATE_ACCESS_TOKEN"),
            institution_code: env_opt("WONRATE_INSTITUTION_CODE"),
            fintech_app_no: env_opt("WONRATE_FINTECH_APP_NO"),
            api_service_code: env_opt("WONRATE_API_SERVICE_CODE"),
            allow_mock: env_opt("WONRATE_ALLOW_MOCK")
                .map(|raw| parse_flag(&raw))
                .unwrap_or(defaults.allow_mock),
            cache_file: env_opt("WONRATE_CACHE_FILE").map(PathBuf::from),
            lookback_days: env_opt("WONRATE_LOOKBACK_DAYS")
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .filter(|days| *days > 0)
                .unwrap_or(defaults.lookback_days),
        }
    }

    /// Complete open-banking credential set, or `None` when any part is
    /// missing; the adapter treats that as a config failure and the
    /// service falls back.
    pub fn open_banking_credentials(&self) -> Option<OpenBankingCredentials> {
        Some(OpenBankingCredentials {
            access_token: self.access_token.clone()?,
            institution_code: self.institution_code.clone()?,
            fintech_app_no: self.fintech_app_no.clone()?,
            api_service_code: self.api_service_code.clone()?,
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Currency, RateDate, RateRecord, ValidationError};

/// Canonical identifiers for the interchangeable rate sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Snapshot,
    Scrape,
    OpenBanking,
    Mock,
}

impl ProviderId {
    pub const ALL: [Self; 4] = [Self::Snapshot, Self::Scrape, Self::OpenBanking, Self::Mock];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Scrape => "scrape",
            Self::OpenBanking => "open_banking",
            Self::Mock => "mock",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "scrape" => Ok(Self::Scrape),
            "open_banking" => Ok(Self::OpenBanking),
            "mock" => Ok(Self::Mock),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

/// Source-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The request never completed.
    Network,
    /// Non-2xx HTTP status or a non-success status code in the payload.
    UpstreamStatus,
    /// A payload that cannot yield records.
    Parse,
    /// Required credentials or endpoints are not configured.
    Config,
}

/// Structured error raised by a source adapter.
///
/// Per-currency and per-date failures are caught at the adapter boundary
/// and collected; they degrade the batch to an omission instead of
/// aborting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Network,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn upstream_status(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::UpstreamStatus,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Parse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Config,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Network => "source.network",
            SourceErrorKind::UpstreamStatus => "source.upstream_status",
            SourceErrorKind::Parse => "source.parse",
            SourceErrorKind::Config => "source.config",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// What a source is asked to produce.
///
/// Both fields are optional because the sources interpret them
/// differently: the snapshot ignores both and returns everything it
/// holds, the scrape needs only a currency (its payload already spans the
/// lookback window), and the open-banking inquiry needs both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateQuery {
    pub date: Option<RateDate>,
    pub currency: Option<Currency>,
}

impl RateQuery {
    pub const fn new(date: Option<RateDate>, currency: Option<Currency>) -> Self {
        Self { date, currency }
    }

    pub const fn all() -> Self {
        Self::new(None, None)
    }

    pub const fn for_currency(currency: Currency) -> Self {
        Self::new(None, Some(currency))
    }

    pub const fn for_date(date: RateDate) -> Self {
        Self::new(Some(date), None)
    }

    pub const fn unit(date: RateDate, currency: Currency) -> Self {
        Self::new(Some(date), Some(currency))
    }
}

/// Source adapter contract.
///
/// Implementations must tolerate upstream partial failure by omitting
/// only the affected unit; an error returned here covers the whole query,
/// and the reconciliation layer fans queries out per currency so one
/// failure cannot take the batch down.
pub trait RateSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn fetch<'a>(
        &'a self,
        query: RateQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RateRecord>, SourceError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_ids_with_dash_or_underscore() {
        assert_eq!(
            ProviderId::from_str("open-banking").expect("must parse"),
            ProviderId::OpenBanking
        );
        assert_eq!(
            ProviderId::from_str("OPEN_BANKING").expect("must parse"),
            ProviderId::OpenBanking
        );
        assert!(ProviderId::from_str("warehouse").is_err());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(SourceError::network("boom").code(), "source.network");
        assert_eq!(SourceError::config("missing").code(), "source.config");
        assert!(SourceError::network("boom").retryable());
        assert!(!SourceError::parse("bad row").retryable());
    }
}

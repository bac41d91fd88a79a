use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

use super::{Currency, RateDate};

/// Tariff/source regime that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateKind {
    Export,
    Import,
    Bank,
}

impl RateKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::Import => "import",
            Self::Bank => "bank",
        }
    }
}

impl Display for RateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "export" => Ok(Self::Export),
            "import" => Ok(Self::Import),
            "bank" => Ok(Self::Bank),
            other => Err(ValidationError::InvalidKind {
                value: other.to_owned(),
            }),
        }
    }
}

/// Canonical per-date, per-currency rate record.
///
/// The `id` is `{YYYYMMDD}-{CODE}` and is the only dedup/merge key a
/// reconciled dataset uses: later writes for the same id overwrite earlier
/// ones. `rate` is the quoted base rate in KRW per foreign unit; the cash
/// and telegraphic-transfer variants are absent when a source does not
/// publish them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRecord {
    pub id: String,
    pub country_code: String,
    pub currency_code: String,
    pub currency_name: String,
    pub date: RateDate,
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_buy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_sell: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tt_buy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tt_sell: Option<f64>,
    pub kind: RateKind,
}

impl RateRecord {
    /// Composite id shared by every source: compact date plus currency code.
    pub fn record_id(date: RateDate, currency_code: &str) -> String {
        format!("{}-{}", date.compact(), currency_code)
    }

    pub fn new(currency: Currency, date: RateDate, rate: f64, kind: RateKind) -> Self {
        Self {
            id: Self::record_id(date, currency.code()),
            country_code: currency.country_code().to_owned(),
            currency_code: currency.code().to_owned(),
            currency_name: currency.name().to_owned(),
            date,
            rate,
            cash_buy: None,
            cash_sell: None,
            tt_buy: None,
            tt_sell: None,
            kind,
        }
    }

    pub fn with_quotes(
        mut self,
        cash_buy: Option<f64>,
        cash_sell: Option<f64>,
        tt_buy: Option<f64>,
        tt_sell: Option<f64>,
    ) -> Self {
        self.cash_buy = cash_buy;
        self.cash_sell = cash_sell;
        self.tt_buy = tt_buy;
        self.tt_sell = tt_sell;
        self
    }
}

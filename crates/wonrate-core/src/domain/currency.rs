use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ValidationError;

/// The fixed currency set quoted by the daily rate board.
///
/// Each variant carries the identity columns the upstreams publish: the
/// ISO code, the country code, the display name as the institution prints
/// it, and the daily-quote market index code used by the scrape endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Currency {
    Usd,
    Eur,
    Cny,
    Jpy,
}

impl Currency {
    pub const ALL: [Self; 4] = [Self::Usd, Self::Eur, Self::Cny, Self::Jpy];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Cny => "CNY",
            Self::Jpy => "JPY",
        }
    }

    pub const fn country_code(self) -> &'static str {
        match self {
            Self::Usd => "US",
            Self::Eur => "EU",
            Self::Cny => "CN",
            Self::Jpy => "JP",
        }
    }

    /// Display name as published by the upstream quote board.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Usd => "미국 달러",
            Self::Eur => "유로",
            Self::Cny => "중국 위안",
            Self::Jpy => "일본 엔",
        }
    }

    /// Market index code for the daily-quote scrape endpoint.
    pub const fn market_index_code(self) -> &'static str {
        match self {
            Self::Usd => "FX_USDKRW",
            Self::Eur => "FX_EURKRW",
            Self::Cny => "FX_CNYKRW",
            Self::Jpy => "FX_JPYKRW",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "CNY" => Ok(Self::Cny),
            "JPY" => Ok(Self::Jpy),
            other => Err(ValidationError::InvalidCurrency {
                value: other.to_owned(),
            }),
        }
    }
}

impl Serialize for Currency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_str(&value).map_err(D::Error::custom)
    }
}

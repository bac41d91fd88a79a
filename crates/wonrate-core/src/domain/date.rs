use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use crate::ValidationError;

const DASHED: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const COMPACT: &[BorrowedFormatItem<'static>] = format_description!("[year][month][day]");

/// A business/publish date, not a timestamp.
///
/// Upstreams speak two spellings of the same date: the compact `YYYYMMDD`
/// used in request parameters and record ids, and the dashed `YYYY-MM-DD`
/// used everywhere a human reads it. Both parse; the dashed form is the
/// serialized representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RateDate(Date);

impl RateDate {
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    /// Accepts either the dashed or the compact spelling.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Self::parse_dashed(input).or_else(|_| Self::parse_compact(input))
    }

    pub fn parse_dashed(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), DASHED)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    pub fn parse_compact(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), COMPACT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// `YYYYMMDD`, the id and request-parameter spelling.
    pub fn compact(self) -> String {
        self.0
            .format(COMPACT)
            .expect("calendar dates are always formattable")
    }

    /// `YYYY-MM-DD`, the display and wire spelling.
    pub fn dashed(self) -> String {
        self.0
            .format(DASHED)
            .expect("calendar dates are always formattable")
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }
}

impl Display for RateDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.dashed())
    }
}

impl Serialize for RateDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.dashed())
    }
}

impl<'de> Deserialize<'de> for RateDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

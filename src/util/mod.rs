//! Utilities. OBVIOUSLY.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

pub(crate) mod ser;
pub(crate) mod sign;

/// A library-local representation of a time, with whole-second precision.
///
/// Claims are signed over their timestamp, so the timestamp has to survive a
/// trip through the persisted format unchanged. Sub-second precision would
/// not, so we never carry it: anything converted into a `Timestamp` is
/// truncated to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(#[serde(with = "chrono::serde::ts_seconds")] DateTime<Utc>);

impl Timestamp {
    /// Create a new Timestamp from the current date/time.
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// Build a timestamp from seconds since the unix epoch.
    pub fn from_unix(secs: i64) -> Result<Self> {
        let date = DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| Error::Deserialize(format!("timestamp out of range: {}", secs)))?;
        Ok(Self(date))
    }

    /// Seconds since the unix epoch.
    pub fn unix(&self) -> i64 {
        self.0.timestamp()
    }
}

impl Deref for Timestamp {
    type Target = DateTime<Utc>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(date: DateTime<Utc>) -> Self {
        // from_timestamp only fails outside chrono's range, and `date` is
        // already inside it.
        Self(DateTime::<Utc>::from_timestamp(date.timestamp(), 0).unwrap_or(date))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::format::ParseError;
    fn from_str(s: &str) -> std::result::Result<Timestamp, Self::Err> {
        let datetime: DateTime<Utc> = s.parse()?;
        Ok(Timestamp::from(datetime))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

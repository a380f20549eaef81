//! Timestamp model
//!
//! All instants inside the engine are milliseconds since the Unix epoch.
//! Raw values arriving from documents or requests are parsed once through
//! [`RawTimestamp`].

use std::fmt;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use crate::utils::errors::{LotteryError, Result};

/// Serializes as integer millis; deserializes from anything [`RawTimestamp`] accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimestamp", into = "i64")]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_millis())
    }
}

impl From<Timestamp> for i64 {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Timestamp as it appears at the ingestion boundary: integer millis or an
/// ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl TryFrom<RawTimestamp> for Timestamp {
    type Error = LotteryError;

    fn try_from(raw: RawTimestamp) -> Result<Self> {
        match raw {
            RawTimestamp::Millis(millis) => Ok(Timestamp(millis)),
            RawTimestamp::Text(text) => parse_text(&text),
        }
    }
}

fn parse_text(text: &str) -> Result<Timestamp> {
    let trimmed = text.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Ok(Timestamp(millis));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Timestamp(dt.timestamp_millis()));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Timestamp(Utc.from_utc_datetime(&naive).timestamp_millis()));
    }
    Err(LotteryError::InvalidInput(format!("Unrecognized timestamp: {}", text)))
}

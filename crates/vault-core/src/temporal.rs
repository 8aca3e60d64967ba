//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp with seconds precision.
//!
//! ## Security Invariant
//!
//! A timestamp inside a disclosure payload is covered by the signature. If
//! the same instant could serialize as `+00:00` on one side and `Z` on the
//! other, or with and without milliseconds, the verifier would reject a
//! genuine payload. `Timestamp` has exactly one textual form,
//! `YYYY-MM-DDTHH:MM:SSZ`. Serialization emits it and deserialization
//! accepts nothing else, so a decoded payload re-serializes to the bytes
//! that were received.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VaultError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Parse a timestamp from its canonical text, `YYYY-MM-DDTHH:MM:SSZ`.
    ///
    /// Only the exact form produced by [`Timestamp::to_iso8601()`] is
    /// accepted. `+00:00` offsets and fractional seconds are rejected even
    /// though they name a valid instant: a payload carrying them could not
    /// be re-serialized to the bytes that were signed.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::SchemaValidation` if the string is not RFC 3339,
    /// carries a non-`Z` offset, or has sub-second precision.
    pub fn parse(s: &str) -> Result<Self, VaultError> {
        if !s.ends_with('Z') {
            return Err(VaultError::SchemaValidation(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }

        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            VaultError::SchemaValidation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        if dt.nanosecond() != 0 {
            return Err(VaultError::SchemaValidation(format!(
                "timestamp must have whole-second precision, got: {s:?}"
            )));
        }

        let ts = Self(dt.with_timezone(&Utc));
        if ts.to_iso8601() != s {
            return Err(VaultError::SchemaValidation(format!(
                "timestamp is not in canonical form {:?}, got: {s:?}",
                ts.to_iso8601()
            )));
        }
        Ok(ts)
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, VaultError> {
        let dt = DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            VaultError::SchemaValidation(format!("invalid Unix timestamp: {secs}"))
        })?;
        Ok(Self(dt))
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

//! Wall-clock timestamps for records.
//!
//! Records carry the moment a line was *read*, not the time the probe may
//! have printed, so every dialect gets the same clock.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Milliseconds since the Unix epoch.
///
/// Rendered as seconds with a three digit fraction (`1700000000.123`), which
/// parses back to the identical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(pub u64);

/// A timestamp string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timestamp {0:?}")]
pub struct TimestampError(pub String);

impl Timestamp {
    /// The current wall-clock time.
    ///
    /// A clock set before 1970 yields the epoch itself.
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(Self::from)
            .unwrap_or_default()
    }

    /// Create from milliseconds since the epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Fractional seconds elapsed since `earlier`, negative if `earlier` is later.
    pub fn seconds_since(&self, earlier: Timestamp) -> f64 {
        (self.0 as f64 - earlier.0 as f64) / 1000.0
    }
}

impl From<Duration> for Timestamp {
    fn from(since_epoch: Duration) -> Self {
        Self(since_epoch.as_millis() as u64)
    }
}

impl From<Timestamp> for SystemTime {
    fn from(ts: Timestamp) -> Self {
        UNIX_EPOCH + Duration::from_millis(ts.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    /// Accepts `secs` or `secs.fraction`. Digits past milliseconds are truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimestampError(s.to_string());
        let (secs, frac) = s.trim().split_once('.').unwrap_or((s.trim(), ""));

        if secs.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let secs: u64 = secs.parse().map_err(|_| invalid())?;

        let mut millis = 0u64;
        for i in 0..3 {
            let digit = frac.as_bytes().get(i).map_or(0, |b| u64::from(b - b'0'));
            millis = millis * 10 + digit;
        }

        secs.checked_mul(1000)
            .and_then(|ms| ms.checked_add(millis))
            .map(Self)
            .ok_or_else(invalid)
    }
}

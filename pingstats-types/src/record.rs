//! The typed unit of ping telemetry.

use crate::Timestamp;

/// Round-trip value stored for an attempt that produced no measurement.
///
/// Out of range on purpose: no real reply has a negative latency, so readers
/// never need a null check.
pub const FAILED_ROUND_TRIP_MS: f64 = -10.0;

/// Value a failed attempt is drawn at on a latency chart.
///
/// Far enough below zero that a failure reads as a visible gap.
pub const PLOT_GAP_MS: f64 = -100.0;

/// One parsed observation from the probe.
///
/// Build records with [`Record::success`] or [`Record::failure`]; they keep
/// `succeeded` and `round_trip_ms` consistent with each other.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    /// When the line was read.
    pub observed_at: Timestamp,

    /// Payload size in bytes, if the probe reported it.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub size: Option<u32>,

    /// Target host or IP; constant for a run.
    pub address: String,

    /// Attempt order within the run.
    pub sequence: u64,

    /// Time-to-live of the reply, if reported.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub ttl: Option<u32>,

    /// Latency in milliseconds, or [`FAILED_ROUND_TRIP_MS`].
    pub round_trip_ms: f64,

    /// True iff `round_trip_ms` is a real measurement.
    pub succeeded: bool,
}

impl Record {
    /// A reply with a measured latency.
    ///
    /// A negative or non-finite latency is not a measurement; such input
    /// produces a failed record instead.
    pub fn success(
        observed_at: Timestamp,
        address: impl Into<String>,
        sequence: u64,
        round_trip_ms: f64,
    ) -> Self {
        if !is_measurement(round_trip_ms) {
            return Self::failure(observed_at, address, sequence);
        }
        Self {
            observed_at,
            size: None,
            address: address.into(),
            sequence,
            ttl: None,
            round_trip_ms,
            succeeded: true,
        }
    }

    /// An attempt that failed or timed out.
    pub fn failure(observed_at: Timestamp, address: impl Into<String>, sequence: u64) -> Self {
        Self {
            observed_at,
            size: None,
            address: address.into(),
            sequence,
            ttl: None,
            round_trip_ms: FAILED_ROUND_TRIP_MS,
            succeeded: false,
        }
    }

    /// Set the payload size.
    pub fn with_size(mut self, size: Option<u32>) -> Self {
        self.size = size;
        self
    }

    /// Set the reply TTL.
    pub fn with_ttl(mut self, ttl: Option<u32>) -> Self {
        self.ttl = ttl;
        self
    }

    /// The measured latency, if any.
    pub fn latency_ms(&self) -> Option<f64> {
        self.succeeded.then_some(self.round_trip_ms)
    }

    /// The y value to chart: the latency, or [`PLOT_GAP_MS`] for failures.
    pub fn plot_value(&self) -> f64 {
        self.latency_ms().unwrap_or(PLOT_GAP_MS)
    }
}

/// True for values that can stand as a measured latency.
pub fn is_measurement(round_trip_ms: f64) -> bool {
    round_trip_ms.is_finite() && round_trip_ms >= 0.0
}

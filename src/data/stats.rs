//! Running statistics and link health.
//!
//! Unlike the window, these cover every record of the run.

use std::time::Duration;

use pingstats_types::Record;
use serde::Serialize;

/// Thresholds for health status computation.
///
/// A link is in warning or critical state when either the most recent
/// latency or the loss ratio crosses the corresponding limit.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Latency that triggers a warning.
    pub latency_warning: Duration,
    /// Latency that triggers critical status.
    pub latency_critical: Duration,
    /// Loss percentage that triggers a warning.
    pub loss_warning_pct: f64,
    /// Loss percentage that triggers critical status.
    pub loss_critical_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            latency_warning: Duration::from_millis(100),
            latency_critical: Duration::from_millis(500),
            loss_warning_pct: 1.0,
            loss_critical_pct: 10.0,
        }
    }
}

/// Health status for the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }
}

impl Thresholds {
    /// Health of a single record.
    pub fn classify(&self, record: &Record) -> HealthStatus {
        match record.latency_ms() {
            None => HealthStatus::Critical,
            Some(ms) => self.latency_status(ms),
        }
    }

    fn latency_status(&self, ms: f64) -> HealthStatus {
        let ms = Duration::from_secs_f64(ms / 1000.0);
        if ms >= self.latency_critical {
            HealthStatus::Critical
        } else if ms >= self.latency_warning {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    fn loss_status(&self, loss_pct: f64) -> HealthStatus {
        if loss_pct >= self.loss_critical_pct {
            HealthStatus::Critical
        } else if loss_pct >= self.loss_warning_pct {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Counts and latency aggregates over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Attempts observed, successful or not.
    pub sent: u64,
    pub received: u64,
    pub failed: u64,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    #[serde(skip)]
    sum_ms: f64,
    /// Latency of the most recent reply.
    pub last_ms: Option<f64>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the totals.
    pub fn record(&mut self, record: &Record) {
        self.sent += 1;
        match record.latency_ms() {
            Some(ms) => {
                self.received += 1;
                self.sum_ms += ms;
                self.min_ms = Some(self.min_ms.map_or(ms, |m| m.min(ms)));
                self.max_ms = Some(self.max_ms.map_or(ms, |m| m.max(ms)));
                self.last_ms = Some(ms);
            }
            None => self.failed += 1,
        }
    }

    /// Build stats from a sequence of records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut stats = Self::new();
        for record in records {
            stats.record(record);
        }
        stats
    }

    /// Mean latency of successful replies.
    pub fn avg_ms(&self) -> Option<f64> {
        (self.received > 0).then(|| self.sum_ms / self.received as f64)
    }

    /// Percentage of attempts that failed.
    pub fn loss_pct(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.failed as f64 / self.sent as f64 * 100.0
        }
    }

    /// Overall link health: the worse of latency and loss.
    pub fn health(&self, thresholds: &Thresholds) -> HealthStatus {
        if self.sent == 0 {
            return HealthStatus::Healthy;
        }
        let loss = thresholds.loss_status(self.loss_pct());
        let latency = match self.last_ms {
            Some(ms) => thresholds.latency_status(ms),
            None => HealthStatus::Critical,
        };
        loss.max(latency)
    }

    /// JSON form including the derived fields.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "sent": self.sent,
            "received": self.received,
            "failed": self.failed,
            "loss_pct": self.loss_pct(),
            "min_ms": self.min_ms,
            "avg_ms": self.avg_ms(),
            "max_ms": self.max_ms,
        })
    }
}

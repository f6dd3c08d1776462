//! Bounded recent-history buffer for charting.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use pingstats_types::{Record, Timestamp};

use crate::error::ConfigError;

/// Default number of records kept for display.
pub const DEFAULT_WINDOW_LENGTH: usize = 250;

/// The most recent `capacity` records, oldest first.
///
/// Appending past capacity evicts from the front. The x axis is seconds
/// since the first record the window ever saw, so it keeps counting up after
/// that record has been evicted.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    records: VecDeque<Record>,
    origin: Option<Timestamp>,
}

/// Chart-ready copy of a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSnapshot {
    /// Seconds since the window's origin.
    pub x: Vec<f64>,
    /// Latency in milliseconds, failures at the plot gap value.
    pub y: Vec<f64>,
}

impl SlidingWindow {
    /// Create a window holding at most `capacity` records.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidWindowLength(0));
        }
        Ok(Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
            origin: None,
        })
    }

    /// Append a record, evicting the oldest if full.
    pub fn append(&mut self, record: Record) {
        debug_assert!(
            record.round_trip_ms.is_finite(),
            "non-finite round trip in record {}",
            record.sequence
        );

        self.origin.get_or_insert(record.observed_at);
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Copy out the x and y series.
    pub fn snapshot(&self) -> WindowSnapshot {
        let Some(origin) = self.origin else {
            return WindowSnapshot::default();
        };
        let (x, y) = self
            .records
            .iter()
            .map(|r| (r.observed_at.seconds_since(origin), r.plot_value()))
            .unzip();
        WindowSnapshot { x, y }
    }

    /// Records in arrival order.
    pub fn records(&self) -> impl DoubleEndedIterator<Item = &Record> + ExactSizeIterator {
        self.records.iter()
    }

    /// The newest record.
    pub fn latest(&self) -> Option<&Record> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Timestamp the x axis counts from.
    pub fn origin(&self) -> Option<Timestamp> {
        self.origin
    }
}

impl WindowSnapshot {
    /// `(x, y)` pairs, the shape chart datasets take.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Smallest and largest x, or `[0, 1]` when empty.
    pub fn x_bounds(&self) -> [f64; 2] {
        match (self.x.first(), self.x.last()) {
            (Some(&lo), Some(&hi)) if hi > lo => [lo, hi],
            (Some(&lo), Some(_)) => [lo, lo + 1.0],
            _ => [0.0, 1.0],
        }
    }
}

/// A window shared between the ingestion loop and readers.
///
/// Every access takes the lock for the duration of one call; snapshots are
/// copies, so rendering never holds it.
#[derive(Debug, Clone)]
pub struct SharedWindow(Arc<Mutex<SlidingWindow>>);

impl SharedWindow {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Ok(Self::from(SlidingWindow::new(capacity)?))
    }

    pub fn append(&self, record: Record) {
        self.0.lock().append(record);
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.0.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Run `f` with the window locked.
    pub fn with<R>(&self, f: impl FnOnce(&SlidingWindow) -> R) -> R {
        f(&self.0.lock())
    }
}

impl From<SlidingWindow> for SharedWindow {
    fn from(window: SlidingWindow) -> Self {
        Self(Arc::new(Mutex::new(window)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pingstats_types::PLOT_GAP_MS;

    fn ok(seq: u64, rtt: f64) -> Record {
        Record::success(Timestamp::from_millis(10_000 + seq * 1000), "h", seq, rtt)
    }

    #[test]
    fn zero_length_is_rejected() {
        assert!(matches!(
            SlidingWindow::new(0),
            Err(ConfigError::InvalidWindowLength(0))
        ));
        assert!(SharedWindow::new(0).is_err());
    }

    #[test]
    fn keeps_last_n_in_order() {
        for n in [1usize, 2, 5, 250] {
            let mut w = SlidingWindow::new(n).unwrap();
            let k = n * 2 + 3;
            for seq in 1..=k as u64 {
                w.append(ok(seq, seq as f64));
            }
            assert_eq!(w.len(), n);
            let seqs: Vec<u64> = w.records().map(|r| r.sequence).collect();
            let expected: Vec<u64> = ((k - n + 1) as u64..=k as u64).collect();
            assert_eq!(seqs, expected);
        }
    }

    #[test]
    fn below_capacity_keeps_everything() {
        let mut w = SlidingWindow::new(10).unwrap();
        for seq in 1..=3 {
            w.append(ok(seq, 1.0));
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.latest().unwrap().sequence, 3);
    }

    #[test]
    fn snapshot_series() {
        let mut w = SlidingWindow::new(5).unwrap();
        w.append(ok(1, 12.0));
        w.append(Record::failure(Timestamp::from_millis(12_500), "h", 2));
        w.append(ok(3, 15.5));

        let snap = w.snapshot();
        assert_eq!(snap.x, vec![0.0, 1.5, 2.0]);
        assert_eq!(snap.y, vec![12.0, PLOT_GAP_MS, 15.5]);
        assert_eq!(snap.points()[1], (1.5, PLOT_GAP_MS));
    }

    #[test]
    fn origin_survives_eviction() {
        let mut w = SlidingWindow::new(1).unwrap();
        w.append(ok(1, 1.0));
        w.append(ok(2, 1.0));
        assert_eq!(w.snapshot().x, vec![1.0]);
        assert_eq!(w.origin(), Some(Timestamp::from_millis(11_000)));
    }

    #[test]
    fn empty_snapshot() {
        let w = SlidingWindow::new(3).unwrap();
        let snap = w.snapshot();
        assert!(snap.is_empty());
        assert_eq!(snap.x_bounds(), [0.0, 1.0]);
    }

    #[test]
    fn x_bounds_span_the_points() {
        let snap = WindowSnapshot {
            x: vec![0.0, 2.0],
            y: vec![10.0, PLOT_GAP_MS],
        };
        assert_eq!(snap.x_bounds(), [0.0, 2.0]);
    }

    #[test]
    fn shared_window_is_consistent_across_threads() {
        let shared = SharedWindow::new(50).unwrap();
        let writer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for seq in 1..=500 {
                    shared.append(ok(seq, 1.0));
                }
            })
        };
        for _ in 0..100 {
            let snap = shared.snapshot();
            assert_eq!(snap.x.len(), snap.y.len());
            assert!(snap.len() <= 50);
        }
        writer.join().unwrap();
        assert_eq!(shared.len(), 50);
        assert_eq!(shared.with(|w| w.latest().map(|r| r.sequence)), Some(500));
    }

    #[test]
    #[should_panic(expected = "non-finite")]
    #[cfg(debug_assertions)]
    fn non_finite_latency_panics_in_debug() {
        let mut w = SlidingWindow::new(2).unwrap();
        let mut r = ok(1, 1.0);
        r.round_trip_ms = f64::NAN;
        w.append(r);
    }
}

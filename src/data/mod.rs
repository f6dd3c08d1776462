//! In-memory views of the record stream.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "30s", "500ms")
//! - [`stats`]: Whole-run counts, latency aggregates and link health
//! - [`window`]: The bounded [`SlidingWindow`] the chart draws from
//!
//! ## Data Flow
//!
//! ```text
//! Record
//!    │
//!    ├──▶ SharedWindow::append() (last N, for the chart)
//!    │
//!    └──▶ RunStats::record() (totals, for the header and summary)
//! ```

pub mod duration;
pub mod stats;
pub mod window;

pub use stats::{HealthStatus, RunStats, Thresholds};
pub use window::{SharedWindow, SlidingWindow, WindowSnapshot, DEFAULT_WINDOW_LENGTH};

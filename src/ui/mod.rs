//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`chart`]: Latency over time, with lost replies marked
//! - [`table`]: The most recent replies
//! - [`common`]: Header, status bar and help overlay
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├────────────────────────┬─────────────┤
//! │                        │             │
//! │ chart::render          │ table::     │
//! │                        │ render      │
//! │                        │             │
//! ├────────────────────────┴─────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    common::render_help on top
//! ```

pub mod chart;
pub mod common;
pub mod table;
pub mod theme;

pub use theme::Theme;

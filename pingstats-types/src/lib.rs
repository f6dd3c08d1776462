//! # pingstats-types
//!
//! The record model shared by the `pingstats` probe runner and anything that
//! reads the logs it leaves behind.
//!
//! ## Design Goals
//!
//! - **Small**: no runtime, no I/O, only the types and the row codec
//! - **Optional serialization**: enable the `serde` feature for JSON and friends
//! - **Stable rows**: the persisted column order is part of the public contract
//!
//! ## Example
//!
//! ```rust
//! use pingstats_types::{row, Record, Timestamp};
//!
//! let record = Record::success(Timestamp::from_millis(1_700_000_000_123), "127.0.0.1", 1, 0.045)
//!     .with_size(Some(64))
//!     .with_ttl(Some(64));
//!
//! let line = row::encode(&record);
//! assert_eq!(line, "1700000000.123,64,127.0.0.1,1,64,0.045");
//! assert_eq!(row::decode(&line).unwrap(), record);
//! ```
//!
//! ## Row Format
//!
//! One line per record, columns in the order given by [`row::COLUMNS`]:
//! `observed_at, size, address, sequence, ttl, round_trip_ms`. Absent values
//! are written as empty fields so that column positions never shift.

mod record;
pub mod row;
mod timestamp;

pub use record::*;
pub use row::RowError;
pub use timestamp::*;

//! The persisted row format.
//!
//! Rows are comma separated, one record per line, no header. Column position
//! is load-bearing: readers index fields, so absent values are written as
//! empty fields rather than left out.

use thiserror::Error;

use crate::{is_measurement, Record, Timestamp};

/// Column names in persisted order.
pub const COLUMNS: [&str; 6] = [
    "observed_at",
    "size",
    "address",
    "sequence",
    "ttl",
    "round_trip_ms",
];

/// Errors decoding a persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// The row does not have exactly [`COLUMNS`]`.len()` fields.
    #[error("expected {expected} fields, found {found}")]
    ColumnCount { expected: usize, found: usize },

    /// A field could not be decoded.
    #[error("invalid {column} field {value:?}")]
    Field { column: &'static str, value: String },

    /// A quoted field was never closed.
    #[error("unterminated quoted field")]
    UnterminatedQuote,
}

/// Encode a record as one row, without the trailing newline.
pub fn encode(record: &Record) -> String {
    format!(
        "{},{},{},{},{},{}",
        record.observed_at,
        optional(record.size),
        escape(&record.address),
        record.sequence,
        optional(record.ttl),
        record.round_trip_ms,
    )
}

/// Decode one row back into a record.
///
/// `succeeded` is derived from `round_trip_ms`, so a row decodes to exactly
/// the record that [`encode`] was given.
pub fn decode(line: &str) -> Result<Record, RowError> {
    let fields = split(line.trim_end_matches(['\r', '\n']))?;
    if fields.len() != COLUMNS.len() {
        return Err(RowError::ColumnCount {
            expected: COLUMNS.len(),
            found: fields.len(),
        });
    }

    let observed_at: Timestamp = fields[0]
        .parse()
        .map_err(|_| invalid("observed_at", &fields[0]))?;
    let size = parse_optional("size", &fields[1])?;
    let address = fields[2].clone();
    if address.is_empty() {
        return Err(invalid("address", &fields[2]));
    }
    let sequence: u64 = fields[3].parse().map_err(|_| invalid("sequence", &fields[3]))?;
    let ttl = parse_optional("ttl", &fields[4])?;
    let round_trip_ms: f64 = fields[5]
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| invalid("round_trip_ms", &fields[5]))?;

    Ok(Record {
        observed_at,
        size,
        address,
        sequence,
        ttl,
        round_trip_ms,
        succeeded: is_measurement(round_trip_ms),
    })
}

fn optional(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_optional(column: &'static str, value: &str) -> Result<Option<u32>, RowError> {
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| invalid(column, value))
}

fn invalid(column: &'static str, value: &str) -> RowError {
    RowError::Field {
        column,
        value: value.to_string(),
    }
}

/// Quote a field if it contains a comma, quote or newline.
fn escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Split a row into unescaped fields.
fn split(line: &str) -> Result<Vec<String>, RowError> {
    let mut fields = Vec::with_capacity(COLUMNS.len());
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(RowError::UnterminatedQuote);
    }
    fields.push(field);
    Ok(fields)
}

//! Turning probe output lines into records.
//!
//! Each run picks one [`Dialect`], which supplies a [`LineClassifier`]. The
//! classifier decides what a single line is; the [`Parser`] adds the
//! run-scoped pieces (address, clock, sequence counter) and builds the
//! [`Record`].
//!
//! ```text
//! raw line ──▶ LineClassifier::classify ──▶ Classified
//!                                              │
//!              Parser (address, counter) ◀─────┘
//!                     │
//!                     ▼
//!              Option<Record>
//! ```
//!
//! Nothing here returns an error. Lines that cannot be understood are
//! non-data; replies without a usable latency become failed records.

mod fields;
mod posix;
mod windows;

pub use posix::PosixClassifier;
pub use windows::WindowsClassifier;

use std::fmt::Debug;

use pingstats_types::{Record, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Minimum number of extracted fields for a line to count as a reply.
const MIN_FIELDS: usize = 2;

/// The output format of the probe binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// iputils and BSD `ping`.
    Posix,
    /// Windows `ping.exe`.
    Windows,
}

impl Dialect {
    /// The dialect of the platform's own `ping`.
    pub fn for_host() -> Self {
        if cfg!(windows) {
            Dialect::Windows
        } else {
            Dialect::Posix
        }
    }

    /// The classifier implementing this dialect.
    pub fn classifier(self) -> Box<dyn LineClassifier> {
        match self {
            Dialect::Posix => Box::new(PosixClassifier),
            Dialect::Windows => Box::new(WindowsClassifier),
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::for_host()
    }
}

/// What a single line of probe output turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// Banner, summary or noise.
    NonData,
    /// A failed attempt, with the probe's own sequence number if it printed one.
    Failed { sequence: Option<u64> },
    /// A candidate reply.
    Reply(ReplyFields),
}

/// Fields pulled out of a reply line. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyFields {
    pub size: Option<u32>,
    pub responder: Option<String>,
    pub sequence: Option<u64>,
    pub ttl: Option<u32>,
    pub latency_ms: Option<f64>,
}

impl ReplyFields {
    /// Number of fields that were found.
    pub fn extracted(&self) -> usize {
        [
            self.size.is_some(),
            self.responder.is_some(),
            self.sequence.is_some(),
            self.ttl.is_some(),
            self.latency_ms.is_some(),
        ]
        .into_iter()
        .filter(|found| *found)
        .count()
    }
}

/// Classifies one line of one probe dialect.
///
/// Implementations are stateless; anything that depends on earlier lines
/// lives in the [`Parser`].
pub trait LineClassifier: Send + Debug {
    /// Classify a single line, without its trailing newline.
    fn classify(&self, line: &str) -> Classified;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;
}

/// Hands out sequence numbers for one run.
///
/// Tracks the highest number seen so far, whether the probe printed it or
/// the counter made it up, so numbers only ever increase.
#[derive(Debug, Clone, Default)]
pub struct SequenceCounter {
    last: Option<u64>,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next synthesized number. The first is 1.
    pub fn next(&mut self) -> u64 {
        let next = self.last.map_or(1, |last| last.saturating_add(1));
        self.last = Some(next);
        next
    }

    /// Use the probe's number if it moves forward, otherwise synthesize one.
    pub fn accept(&mut self, observed: Option<u64>) -> u64 {
        match observed {
            Some(seq) if self.last.map_or(true, |last| seq > last) => {
                self.last = Some(seq);
                seq
            }
            _ => self.next(),
        }
    }

    /// The most recent number handed out.
    pub fn last(&self) -> Option<u64> {
        self.last
    }
}

/// Stateful line parser for one run.
#[derive(Debug)]
pub struct Parser {
    classifier: Box<dyn LineClassifier>,
    counter: SequenceCounter,
    address: String,
}

impl Parser {
    /// Create a parser for `address` using the given dialect.
    pub fn new(dialect: Dialect, address: impl Into<String>) -> Self {
        Self::with_classifier(dialect.classifier(), address)
    }

    /// Create a parser around any classifier.
    pub fn with_classifier(classifier: Box<dyn LineClassifier>, address: impl Into<String>) -> Self {
        Self {
            classifier,
            counter: SequenceCounter::new(),
            address: address.into(),
        }
    }

    /// Parse a line observed now.
    pub fn parse(&mut self, line: &str) -> Option<Record> {
        self.parse_at(line, Timestamp::now())
    }

    /// Parse a line observed at `observed_at`.
    pub fn parse_at(&mut self, line: &str, observed_at: Timestamp) -> Option<Record> {
        let line = line.trim_end_matches(['\r', '\n']);

        match self.classifier.classify(line) {
            Classified::NonData => {
                trace!(dialect = self.classifier.name(), line, "non-data line");
                None
            }
            Classified::Failed { sequence } => {
                let sequence = self.counter.accept(sequence);
                debug!(sequence, line, "failed attempt");
                Some(Record::failure(observed_at, self.address.as_str(), sequence))
            }
            Classified::Reply(fields) if fields.extracted() < MIN_FIELDS => {
                trace!(dialect = self.classifier.name(), line, "too few fields");
                None
            }
            Classified::Reply(fields) => {
                let sequence = self.counter.accept(fields.sequence);
                let record = match fields.latency_ms {
                    Some(rtt) => Record::success(observed_at, self.address.as_str(), sequence, rtt),
                    None => {
                        debug!(sequence, line, "reply without latency");
                        Record::failure(observed_at, self.address.as_str(), sequence)
                    }
                };
                Some(record.with_size(fields.size).with_ttl(fields.ttl))
            }
        }
    }

    /// The target every record is attributed to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The name of the active dialect.
    pub fn dialect_name(&self) -> &'static str {
        self.classifier.name()
    }
}

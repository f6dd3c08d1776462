//! Windows `ping.exe` output.
//!
//! ```text
//! Pinging 8.8.8.8 with 32 bytes of data:
//! Reply from 8.8.8.8: bytes=32 time=14ms TTL=117
//! Request timed out.
//! ```
//!
//! Replies carry no sequence number; the parser's counter supplies one.
//! Only the English wording is recognised.

use super::fields::{parse_latency, parse_number, split_key_value};
use super::{Classified, LineClassifier, ReplyFields};

const FAILURE_MARKERS: &[&str] = &[
    "request timed out",
    "destination host unreachable",
    "could not find host",
    "general failure",
    "transmit failed",
];

const SUMMARY_MARKERS: &[&str] = &[
    "pinging",
    "statistics",
    "packets:",
    "approximate",
    "minimum",
    "control-",
];

/// Classifier for Windows `ping`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsClassifier;

impl LineClassifier for WindowsClassifier {
    fn classify(&self, line: &str) -> Classified {
        let lower = line.to_lowercase();

        if FAILURE_MARKERS.iter().any(|m| lower.contains(m)) {
            return Classified::Failed { sequence: None };
        }
        if SUMMARY_MARKERS.iter().any(|m| lower.contains(m)) {
            return Classified::NonData;
        }

        let mut fields = ReplyFields::default();
        for token in line.split_whitespace() {
            if token.eq_ignore_ascii_case("reply")
                || token.eq_ignore_ascii_case("from")
                || token.contains('\0')
            {
                continue;
            }

            match split_key_value(token) {
                Some((key, value)) => match key.to_ascii_lowercase().as_str() {
                    "bytes" => fields.size = parse_number(value),
                    "time" => fields.latency_ms = parse_latency(value),
                    "ttl" => fields.ttl = parse_number(value),
                    _ => {}
                },
                None if fields.responder.is_none() => {
                    fields.responder = Some(token.trim_end_matches(':').to_string());
                }
                None => {}
            }
        }

        Classified::Reply(fields)
    }

    fn name(&self) -> &'static str {
        "windows"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(line: &str) -> ReplyFields {
        match WindowsClassifier.classify(line) {
            Classified::Reply(fields) => fields,
            other => panic!("expected reply for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn reply_line() {
        let f = reply("Reply from 8.8.8.8: bytes=32 time=14ms TTL=117");
        assert_eq!(f.responder.as_deref(), Some("8.8.8.8"));
        assert_eq!(f.size, Some(32));
        assert_eq!(f.latency_ms, Some(14.0));
        assert_eq!(f.ttl, Some(117));
        assert_eq!(f.sequence, None);
    }

    #[test]
    fn sub_millisecond_reply_records_the_bound() {
        let f = reply("Reply from 127.0.0.1: bytes=32 time<1ms TTL=128");
        assert_eq!(f.latency_ms, Some(1.0));
    }

    #[test]
    fn ipv6_reply_without_size() {
        let f = reply("Reply from ::1: time<1ms");
        assert_eq!(f.responder.as_deref(), Some("::1"));
        assert_eq!(f.extracted(), 2);
    }

    #[test]
    fn failures() {
        for line in [
            "Request timed out.",
            "Reply from 192.168.1.1: Destination host unreachable.",
            "Ping request could not find host nowhere.invalid. Please check the name and try again.",
            "General failure.",
            "PING: transmit failed. General failure.",
        ] {
            assert_eq!(
                WindowsClassifier.classify(line),
                Classified::Failed { sequence: None },
                "{line}"
            );
        }
    }

    #[test]
    fn banner_and_summary_are_not_data() {
        for line in [
            "Pinging 8.8.8.8 with 32 bytes of data:",
            "Ping statistics for 8.8.8.8:",
            "    Packets: Sent = 4, Received = 4, Lost = 0 (0% loss),",
            "Approximate round trip times in milli-seconds:",
            "    Minimum = 13ms, Maximum = 15ms, Average = 14ms",
            "Control-C",
        ] {
            assert_eq!(WindowsClassifier.classify(line), Classified::NonData, "{line}");
        }
    }

    #[test]
    fn blank_line_extracts_nothing() {
        assert_eq!(reply("").extracted(), 0);
        assert_eq!(reply("\r").extracted(), 0);
    }
}

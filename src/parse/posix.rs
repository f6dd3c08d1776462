//! iputils / BSD style ping output.
//!
//! ```text
//! PING 127.0.0.1 (127.0.0.1): 56 data bytes
//! 64 bytes from 127.0.0.1: icmp_seq=0 ttl=64 time=0.045 ms
//! Request timeout for icmp_seq 1
//! --- 127.0.0.1 ping statistics ---
//! ```

use super::fields::{parse_latency, parse_number, split_key_value, trailing_sequence};
use super::{Classified, LineClassifier, ReplyFields};

/// Lower-case fragments that mark a failed attempt.
const FAILURE_MARKERS: &[&str] = &[
    "cannot resolve",
    "unknown host",
    "name or service not known",
    "temporary failure in name resolution",
    "request timeout",
    "no answer yet",
    "unreachable",
];

/// Lower-case fragments of the trailing summary block.
const SUMMARY_MARKERS: &[&str] = &["statistics", "transmitted", "round-trip", "rtt min"];

/// Tokens carrying no data of their own.
const NOISE: &[&str] = &["bytes", "from", "ms"];

/// Classifier for POSIX `ping`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixClassifier;

impl LineClassifier for PosixClassifier {
    fn classify(&self, line: &str) -> Classified {
        let lower = line.to_lowercase();

        if FAILURE_MARKERS.iter().any(|m| lower.contains(m)) {
            return Classified::Failed {
                sequence: trailing_sequence(line),
            };
        }

        // The banner is matched case-sensitively: "ping:" prefixes error
        // lines, "PING" opens the run.
        if line.contains("PING")
            || line.contains("DUP!")
            || SUMMARY_MARKERS.iter().any(|m| lower.contains(m))
        {
            return Classified::NonData;
        }

        let mut fields = ReplyFields::default();
        let tokens = line
            .split_whitespace()
            .filter(|t| !NOISE.contains(t) && !t.contains('\0'));

        for (position, token) in tokens.enumerate() {
            match position {
                0 => fields.size = parse_number(token),
                1 => fields.responder = Some(token.trim_end_matches(':').to_string()),
                _ => {
                    let Some((key, value)) = split_key_value(token) else {
                        continue;
                    };
                    match key.to_ascii_lowercase().as_str() {
                        "icmp_seq" | "seq" => fields.sequence = parse_number(value),
                        "ttl" | "hlim" => fields.ttl = parse_number(value),
                        "time" => fields.latency_ms = parse_latency(value),
                        _ => {}
                    }
                }
            }
        }

        Classified::Reply(fields)
    }

    fn name(&self) -> &'static str {
        "posix"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(line: &str) -> ReplyFields {
        match PosixClassifier.classify(line) {
            Classified::Reply(fields) => fields,
            other => panic!("expected reply for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn bsd_reply() {
        let f = reply("64 bytes from 127.0.0.1: icmp_seq=0 ttl=64 time=0.045 ms");
        assert_eq!(f.size, Some(64));
        assert_eq!(f.responder.as_deref(), Some("127.0.0.1"));
        assert_eq!(f.sequence, Some(0));
        assert_eq!(f.ttl, Some(64));
        assert_eq!(f.latency_ms, Some(0.045));
        assert_eq!(f.extracted(), 5);
    }

    #[test]
    fn iputils_reply_with_hostname() {
        let f = reply("64 bytes from localhost (127.0.0.1): icmp_seq=3 ttl=64 time=0.031 ms");
        assert_eq!(f.responder.as_deref(), Some("localhost"));
        assert_eq!(f.sequence, Some(3));
        assert_eq!(f.latency_ms, Some(0.031));
    }

    #[test]
    fn ipv6_hop_limit() {
        let f = reply("16 bytes from ::1, icmp_seq=2 hlim=64 time=0.081 ms");
        assert_eq!(f.ttl, Some(64));
        assert_eq!(f.size, Some(16));
    }

    #[test]
    fn failures() {
        for (line, seq) in [
            ("ping: cannot resolve nowhere.invalid: Unknown host", None),
            ("ping: nowhere.invalid: Name or service not known", None),
            ("ping: nowhere: Temporary failure in name resolution", None),
            ("Request timeout for icmp_seq 4", Some(4)),
            ("no answer yet for icmp_seq=9", Some(9)),
            ("From 10.0.0.1 icmp_seq=2 Destination Host Unreachable", Some(2)),
        ] {
            assert_eq!(
                PosixClassifier.classify(line),
                Classified::Failed { sequence: seq },
                "{line}"
            );
        }
    }

    #[test]
    fn banner_and_summary_are_not_data() {
        for line in [
            "PING 127.0.0.1 (127.0.0.1): 56 data bytes",
            "--- 127.0.0.1 ping statistics ---",
            "3 packets transmitted, 3 packets received, 0.0% packet loss",
            "round-trip min/avg/max/stddev = 0.045/0.061/0.080/0.014 ms",
            "rtt min/avg/max/mdev = 0.031/0.040/0.052/0.008 ms",
            "64 bytes from 10.0.0.255: icmp_seq=1 ttl=64 time=0.3 ms (DUP!)",
        ] {
            assert_eq!(PosixClassifier.classify(line), Classified::NonData, "{line}");
        }
    }

    #[test]
    fn garbage_extracts_too_little() {
        assert!(reply("").extracted() < 2);
        assert!(reply("hello").extracted() < 2);
        assert!(reply("Warning: something odd").extracted() < 2);
    }

    #[test]
    fn nul_tokens_are_skipped() {
        let f = reply("\0\0 64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=1.5 ms");
        assert_eq!(f.size, Some(64));
        assert_eq!(f.latency_ms, Some(1.5));
    }

    #[test]
    fn malformed_time_is_absent() {
        let f = reply("64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=fast ms");
        assert_eq!(f.latency_ms, None);
        assert_eq!(f.sequence, Some(1));
    }
}

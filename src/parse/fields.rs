//! Token-level helpers shared by both dialects.

/// Split a `key=value` (or `key<value`) token on the first separator.
///
/// Returns `None` for tokens with neither separator.
pub(crate) fn split_key_value(token: &str) -> Option<(&str, &str)> {
    let at = token.find(['=', '<'])?;
    Some((&token[..at], &token[at + 1..]))
}

/// Parse a latency value such as `14.2`, `14ms` or `1ms`.
///
/// Anything that is not a finite, non-negative number of milliseconds is
/// treated as absent.
pub(crate) fn parse_latency(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value.strip_suffix("ms").unwrap_or(value);
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parse an unsigned integer field, tolerating trailing punctuation.
pub(crate) fn parse_number<T: std::str::FromStr>(value: &str) -> Option<T> {
    value
        .trim_end_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .ok()
}

/// Recover the probe's attempt number from a failure line.
///
/// Prefers a bare trailing number (`Request timeout for icmp_seq 7`) and
/// falls back to an `icmp_seq=N` token anywhere on the line.
pub(crate) fn trailing_sequence(line: &str) -> Option<u64> {
    let last = line.split_whitespace().next_back()?;
    let last = last.strip_prefix("icmp_seq=").unwrap_or(last);
    if let Ok(seq) = last.parse() {
        return Some(seq);
    }

    line.split_whitespace()
        .filter_map(|token| token.strip_prefix("icmp_seq="))
        .find_map(parse_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_separator() {
        assert_eq!(split_key_value("time=0.045"), Some(("time", "0.045")));
        assert_eq!(split_key_value("time<1ms"), Some(("time", "1ms")));
        assert_eq!(split_key_value("a=b=c"), Some(("a", "b=c")));
        assert_eq!(split_key_value("127.0.0.1:"), None);
    }

    #[test]
    fn latency_strips_unit() {
        assert_eq!(parse_latency("14ms"), Some(14.0));
        assert_eq!(parse_latency("0.045"), Some(0.045));
        assert_eq!(parse_latency(""), None);
        assert_eq!(parse_latency("abc"), None);
        assert_eq!(parse_latency("-1"), None);
        assert_eq!(parse_latency("inf"), None);
    }

    #[test]
    fn number_ignores_trailing_punctuation() {
        assert_eq!(parse_number::<u32>("64"), Some(64));
        assert_eq!(parse_number::<u32>("64,"), Some(64));
        assert_eq!(parse_number::<u32>("x64"), None);
        assert_eq!(parse_number::<u32>(""), None);
    }

    #[test]
    fn sequence_from_trailing_token() {
        assert_eq!(trailing_sequence("Request timeout for icmp_seq 7"), Some(7));
        assert_eq!(trailing_sequence("no answer yet for icmp_seq=3"), Some(3));
        assert_eq!(
            trailing_sequence("From 10.0.0.1 icmp_seq=12 Destination Host Unreachable"),
            Some(12)
        );
        assert_eq!(trailing_sequence("ping: cannot resolve nowhere: Unknown host"), None);
        assert_eq!(trailing_sequence(""), None);
    }
}

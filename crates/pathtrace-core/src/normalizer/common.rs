use crate::Hop;
use regex::Regex;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::OnceLock;

/// Millisecond latency values such as `12.3 ms`, `12.3ms` and `<1 ms`.
fn latency_regex() -> &'static Regex {
    static LATENCY: OnceLock<Regex> = OnceLock::new();
    LATENCY.get_or_init(|| Regex::new(r"<?(\d+(?:\.\d+)?)\s*ms\b").expect("valid regex"))
}

/// Every millisecond latency value in `text`, in order.
pub(super) fn latencies(text: &str) -> Vec<f64> {
    latency_regex()
        .captures_iter(text)
        .filter_map(|caps| f64::from_str(&caps[1]).ok())
        .collect()
}

/// The arithmetic mean of `samples`, if there are any.
pub(super) fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

/// Parse an address token, ignoring surrounding brackets and trailing punctuation.
///
/// Accepts `10.0.0.1`, `(10.0.0.1)`, `[10.0.0.1]` and `10.0.0.1:`.
pub(super) fn parse_addr(token: &str) -> Option<IpAddr> {
    let token = token
        .trim_start_matches(['(', '['])
        .trim_end_matches([')', ']', ':', ',']);
    IpAddr::from_str(token).ok()
}

/// The first address token in `text`.
pub(super) fn first_addr(text: &str) -> Option<IpAddr> {
    text.split_whitespace().find_map(parse_addr)
}

/// Parse a leading hop index token such as `3`, `3:` or `3?:`.
///
/// Hop indices are 1-based, zero is not a valid index.
pub(super) fn parse_index(token: &str) -> Option<usize> {
    usize::from_str(token.trim_end_matches([':', '?']))
        .ok()
        .filter(|index| *index > 0)
}

/// Append `hop` if its index is greater than that of the last hop.
///
/// Tools may report the same hop more than once, only the first is kept.
pub(super) fn push_ascending(hops: &mut Vec<Hop>, hop: Hop) {
    if hops.last().map_or(true, |last| hop.index() > last.index()) {
        hops.push(hop);
    }
}

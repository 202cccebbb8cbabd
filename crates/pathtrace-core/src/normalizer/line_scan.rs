//! A tool agnostic line scanner for output the structured parsers reject.
//!
//! Each line may hold a hop index, then an address or a timeout marker, then
//! latency values anywhere on the line. Lines without an index are numbered
//! after the previous hop, lines whose index does not advance are dropped.
use super::common::{first_addr, latencies, mean, parse_index, push_ascending};
use crate::Hop;

const HEADERS: [&str; 3] = ["traceroute to", "tracepath to", "tracing route to"];

const TIMEOUT_MARKERS: [&str; 2] = ["no reply", "timed out"];

pub(super) fn parse(text: &str) -> Vec<Hop> {
    let mut hops: Vec<Hop> = vec![];
    for line in text.lines() {
        let line = line.trim();
        let lowercase = line.to_ascii_lowercase();
        if line.is_empty() || HEADERS.iter().any(|header| lowercase.contains(header)) {
            continue;
        }
        let previous = hops.last().map_or(0, Hop::index);
        let (explicit, rest) = match line.split_once(char::is_whitespace) {
            Some((first, rest)) => match parse_index(first) {
                Some(index) => (Some(index), rest),
                None => (None, line),
            },
            None => (None, line),
        };
        let index = explicit.unwrap_or(previous + 1);
        if let Some(addr) = first_addr(rest) {
            push_ascending(&mut hops, Hop::responded(index, addr, mean(&latencies(rest))));
        } else if is_timeout(rest) {
            push_ascending(&mut hops, Hop::timeout(index));
        }
    }
    hops
}

fn is_timeout(text: &str) -> bool {
    let lowercase = text.to_ascii_lowercase();
    text.split_whitespace().any(|token| token.starts_with('*'))
        || TIMEOUT_MARKERS
            .iter()
            .any(|marker| lowercase.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn indices(hops: &[Hop]) -> Vec<usize> {
        hops.iter().map(Hop::index).collect()
    }

    #[test]
    fn test_unindexed_lines() {
        let text = "hop 192.168.1.1 rtt 1.5 ms\nhop 10.0.0.1 rtt 4.5 ms\nhop * timed out\n";
        let hops = parse(text);
        assert_eq!(vec![1, 2, 3], indices(&hops));
        assert_eq!(Some(IpAddr::from([192, 168, 1, 1])), hops[0].addr());
        assert_eq!(Some(1.5), hops[0].rtt());
        assert!(hops[2].is_timeout());
    }

    #[test]
    fn test_mixed_indices() {
        let text = "3 -> 10.0.0.3 (7.0 ms)\n-> 10.0.0.4\n2 -> 10.0.0.5\n-> 10.0.0.6";
        let hops = parse(text);
        assert_eq!(vec![3, 4, 5], indices(&hops));
        assert_eq!(Some(7.0), hops[0].rtt());
        assert_eq!(None, hops[1].rtt());
        assert_eq!(Some(IpAddr::from([10, 0, 0, 6])), hops[2].addr());
    }

    #[test]
    fn test_non_advancing_index_dropped() {
        let text = "7 -> 10.0.0.7\n5 -> 10.0.0.5\n7 -> 10.0.0.8\n-> 10.0.0.9";
        let hops = parse(text);
        assert_eq!(vec![7, 8], indices(&hops));
        assert_eq!(Some(IpAddr::from([10, 0, 0, 7])), hops[0].addr());
        assert_eq!(Some(IpAddr::from([10, 0, 0, 9])), hops[1].addr());
    }

    #[test]
    fn test_headers_skipped() {
        let text = "Traceroute to 10.0.0.9 (10.0.0.9), 30 hops max\n\n1 | 10.0.0.1 | 2.0ms | 3.0ms";
        let hops = parse(text);
        assert_eq!(1, hops.len());
        assert_eq!(1, hops[0].index());
        assert_eq!(Some(2.5), hops[0].rtt());
    }

    #[test]
    fn test_no_reply_marker() {
        let hops = parse("1: no reply\n2: 10.0.0.2 5.0ms");
        assert!(hops[0].is_timeout());
        assert_eq!(Some(5.0), hops[1].rtt());
    }

    #[test]
    fn test_unrelated_lines_ignored() {
        assert!(parse("connecting...\ndone").is_empty());
    }
}

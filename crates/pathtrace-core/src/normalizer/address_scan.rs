use crate::Hop;
use itertools::Itertools;
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ops::Range;
use std::str::FromStr;
use std::sync::OnceLock;

/// Dotted quads, octet ranges are checked when parsed.
fn ipv4_regex() -> &'static Regex {
    static IPV4: OnceLock<Regex> = OnceLock::new();
    IPV4.get_or_init(|| Regex::new(r"\d{1,3}(?:\.\d{1,3}){3}").expect("valid regex"))
}

/// Runs of characters which may hold an IPv6 address.
fn ipv6_regex() -> &'static Regex {
    static IPV6: OnceLock<Regex> = OnceLock::new();
    IPV6.get_or_init(|| Regex::new(r"[0-9A-Fa-f:.]*:[0-9A-Fa-f:.]*").expect("valid regex"))
}

/// Every literal address in `text`, one hop per distinct address in order of first appearance.
pub(super) fn parse(text: &str) -> Vec<Hop> {
    let ipv6 = ipv6_addrs(text);
    let ipv4 = ipv4_addrs(text)
        .filter(|(start, _)| !ipv6.iter().any(|(span, _)| span.contains(start)));
    ipv6.iter()
        .map(|(span, addr)| (span.start, *addr))
        .chain(ipv4)
        .sorted_by_key(|(start, _)| *start)
        .map(|(_, addr)| addr)
        .unique()
        .enumerate()
        .map(|(position, addr)| Hop::responded(position + 1, addr, None))
        .collect()
}

/// IPv4 addresses with their offset in `text`.
fn ipv4_addrs(text: &str) -> impl Iterator<Item = (usize, IpAddr)> + '_ {
    ipv4_regex()
        .find_iter(text)
        .filter(|found| is_standalone(text.as_bytes(), found.start(), found.end()))
        .filter_map(|found| {
            let addr = Ipv4Addr::from_str(found.as_str()).ok()?;
            Some((found.start(), IpAddr::V4(addr)))
        })
}

/// Is the dotted quad at `start..end` free of adjoining digits and dotted digits?
///
/// Letters, colons and other punctuation may adjoin an address, as in
/// `via10.0.0.1` or `10.0.0.1:33434`, but `1.10.0.0.1` is not an address.
fn is_standalone(bytes: &[u8], start: usize, end: usize) -> bool {
    let extends = |neighbour: Option<&u8>, beyond: Option<&u8>| match neighbour {
        Some(byte) if byte.is_ascii_digit() => true,
        Some(b'.') => beyond.is_some_and(u8::is_ascii_digit),
        _ => false,
    };
    let before = &bytes[..start];
    let after = &bytes[end..];
    !extends(before.last(), before.iter().rev().nth(1)) && !extends(after.first(), after.get(1))
}

/// IPv6 addresses with the span of the text they were found in.
fn ipv6_addrs(text: &str) -> Vec<(Range<usize>, IpAddr)> {
    ipv6_regex()
        .find_iter(text)
        .filter_map(|found| {
            let addr = trimmed_ipv6(found.as_str().trim_matches('.'))?;
            Some((found.range(), IpAddr::V6(addr)))
        })
        .collect()
}

/// The longest IPv6 address ending `candidate`, with or without a trailing `:port`.
///
/// Leading characters are dropped until an address parses, so `hop:2606:4700::1`
/// and `a2606:4700::1` both yield `2606:4700::1`.
fn trimmed_ipv6(candidate: &str) -> Option<Ipv6Addr> {
    let portless = candidate
        .rsplit_once(':')
        .filter(|(_, port)| port.bytes().all(|byte| byte.is_ascii_digit()))
        .map(|(addr, _)| addr);
    (0..candidate.len()).find_map(|start| {
        [Some(candidate), portless]
            .into_iter()
            .flatten()
            .filter_map(|text| text.get(start..))
            .filter_map(|text| Ipv6Addr::from_str(text).ok())
            .find(|addr| !addr.is_unspecified())
    })
}

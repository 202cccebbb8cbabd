//! Parse the output of `traceroute` and `tracert`.
//!
//! A hop line starts with the hop index followed by latency samples, `*`
//! placeholders and the responding address in either order:
//!
//! ```text
//!  1  192.168.1.1  1.234 ms  1.456 ms  1.678 ms
//!  2  router.example.com (10.0.0.1)  5.1 ms *  5.3 ms
//!  3  * * *
//!   4    <1 ms    <1 ms    <1 ms  192.168.1.1
//!   5     *        *        *     Request timed out.
//! ```
use super::common::{first_addr, latencies, mean, parse_index, push_ascending};
use crate::Hop;

const TIMED_OUT: &str = "request timed out";

pub(super) fn parse(text: &str) -> Vec<Hop> {
    let mut hops = vec![];
    for line in text.lines() {
        if let Some(hop) = parse_line(line) {
            push_ascending(&mut hops, hop);
        }
    }
    hops
}

fn parse_line(line: &str) -> Option<Hop> {
    let line = line.trim();
    let (index, rest) = line.split_once(char::is_whitespace)?;
    let index = parse_index(index)?;
    if let Some(addr) = first_addr(rest) {
        Some(Hop::responded(index, addr, mean(&latencies(rest))))
    } else if rest.split_whitespace().any(|token| token == "*")
        || rest.to_ascii_lowercase().contains(TIMED_OUT)
    {
        Some(Hop::timeout(index))
    } else {
        None
    }
}

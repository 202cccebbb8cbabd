//! Parse the output of `tracepath`.
//!
//! ```text
//!  1?: [LOCALHOST]                      pmtu 1500
//!  1:  192.168.1.1                                           0.753ms
//!  1:  192.168.1.1                                           0.601ms
//!  2:  10.0.0.1                                              5.212ms asymm  3
//!  3:  no reply
//!      Resume: pmtu 1500 hops 3 back 3
//! ```
use super::common::{latencies, mean, parse_addr, parse_index, push_ascending};
use crate::Hop;

const NO_REPLY: &str = "no reply";

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
    let (index, rest) = line.trim().split_once(char::is_whitespace)?;
    if !index.ends_with(':') || index.ends_with("?:") {
        return None;
    }
    let index = parse_index(index)?;
    let rest = rest.trim_start();
    if rest.starts_with(NO_REPLY) {
        return Some(Hop::timeout(index));
    }
    let mut tokens = rest.split_whitespace();
    let addr = tokens.next().and_then(|host| {
        parse_addr(host).or_else(|| {
            tokens
                .next()
                .filter(|token| token.starts_with('('))
                .and_then(parse_addr)
        })
    })?;
    Some(Hop::responded(index, addr, mean(&latencies(rest))))
}

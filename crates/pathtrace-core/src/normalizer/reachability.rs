//! Parse the output of `ping`.
//!
//! Every echo reply contributes one latency sample to a single hop which
//! represents the destination.
use super::common::{mean, parse_addr};
use crate::Hop;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

/// Matches the echo replies of `ping` on Unix and Windows:
///
/// ```text
/// 64 bytes from 93.184.216.34: icmp_seq=1 ttl=56 time=30.0 ms
/// 64 bytes from example.com (93.184.216.34): icmp_seq=1 ttl=56 time=30.0 ms
/// Reply from 93.184.216.34: bytes=32 time=30ms TTL=56
/// Reply from 192.168.1.1: bytes=32 time<1ms TTL=64
/// ```
fn reply_regex() -> &'static Regex {
    static REPLY: OnceLock<Regex> = OnceLock::new();
    REPLY.get_or_init(|| {
        Regex::new(
            r"(?i)(?:bytes from|reply from)\s+(?:\S+\s+\()?([0-9a-f:.]+)\)?:?\s.*?time\s*[=<]\s*(\d+(?:\.\d+)?)\s*ms",
        )
        .expect("valid regex")
    })
}

pub(super) fn parse(text: &str) -> Vec<Hop> {
    let mut addr = None;
    let mut samples = vec![];
    for caps in text.lines().filter_map(|line| reply_regex().captures(line)) {
        let Some(reply_addr) = parse_addr(&caps[1]) else {
            continue;
        };
        let Ok(rtt) = f64::from_str(&caps[2]) else {
            continue;
        };
        addr.get_or_insert(reply_addr);
        samples.push(rtt);
    }
    addr.map(|addr| Hop::responded(1, addr, mean(&samples)))
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use test_case::test_case;

    #[test]
    fn test_linux_ping() {
        let text = r"PING 93.184.216.34 (93.184.216.34) 56(84) bytes of data.
64 bytes from 93.184.216.34: icmp_seq=1 ttl=56 time=30.0 ms
64 bytes from 93.184.216.34: icmp_seq=2 ttl=56 time=32.0 ms
64 bytes from 93.184.216.34: icmp_seq=3 ttl=56 time=28.0 ms

--- 93.184.216.34 ping statistics ---
3 packets transmitted, 3 received, 0% packet loss, time 2003ms
rtt min/avg/max/mdev = 28.0/30.0/32.0/1.6 ms";
        let hops = parse(text);
        assert_eq!(1, hops.len());
        assert_eq!(1, hops[0].index());
        assert_eq!(Some(IpAddr::from([93, 184, 216, 34])), hops[0].addr());
        assert_eq!(Some(30.0), hops[0].rtt());
    }

    #[test]
    fn test_windows_ping() {
        let text = r"
Pinging 192.168.1.1 with 32 bytes of data:
Reply from 192.168.1.1: bytes=32 time<1ms TTL=64
Reply from 192.168.1.1: bytes=32 time=3ms TTL=64
Request timed out.

Ping statistics for 192.168.1.1:";
        let hops = parse(text);
        assert_eq!(Some(IpAddr::from([192, 168, 1, 1])), hops[0].addr());
        assert_eq!(Some(2.0), hops[0].rtt());
    }

    #[test_case("64 bytes from example.com (93.184.216.34): icmp_seq=1 ttl=56 time=30.0 ms", "93.184.216.34"; "named")]
    #[test_case("16 bytes from 2606:2800:220:1::1: icmp_seq=1 hlim=56 time=30.0 ms", "2606:2800:220:1::1"; "ipv6")]
    #[test_case("64 bytes from 93.184.216.34: icmp_seq=1 ttl=56 time=30 ms", "93.184.216.34"; "macos")]
    fn test_reply_variants(line: &str, expected: &str) {
        let hops = parse(line);
        assert_eq!(Some(expected.parse::<IpAddr>().unwrap()), hops[0].addr());
        assert_eq!(Some(30.0), hops[0].rtt());
    }

    #[test]
    fn test_no_replies() {
        let text = "PING 10.9.9.9 (10.9.9.9) 56(84) bytes of data.\n\n--- 10.9.9.9 ping statistics ---\n5 packets transmitted, 0 received, 100% packet loss";
        assert!(parse(text).is_empty());
    }

    #[test]
    fn test_unreachable_replies_ignored() {
        assert!(parse("Reply from 10.0.0.1: Destination host unreachable.").is_empty());
    }
}

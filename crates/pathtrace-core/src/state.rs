use crate::normalizer::ParseOutcome;
use crate::{CommandFamily, ProbeMethod};
use pathtrace_geoip::Location;
use std::net::IpAddr;

/// A single hop along the path to a destination.
///
/// A hop either responded, in which case it has an address and possibly a
/// round-trip time, or it timed out and has neither.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    index: usize,
    addr: Option<IpAddr>,
    rtt: Option<f64>,
    location: Option<Location>,
    location_error: Option<String>,
    hostname: Option<String>,
}

impl Hop {
    /// A hop which responded from `addr`, with the mean `rtt` in milliseconds if known.
    #[must_use]
    pub const fn responded(index: usize, addr: IpAddr, rtt: Option<f64>) -> Self {
        Self {
            index,
            addr: Some(addr),
            rtt,
            location: None,
            location_error: None,
            hostname: None,
        }
    }

    /// A hop for which no probe received a response.
    #[must_use]
    pub const fn timeout(index: usize) -> Self {
        Self {
            index,
            addr: None,
            rtt: None,
            location: None,
            location_error: None,
            hostname: None,
        }
    }

    /// The 1-based position of this hop in the path.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The address of the responding host.
    #[must_use]
    pub const fn addr(&self) -> Option<IpAddr> {
        self.addr
    }

    /// The mean round-trip time in milliseconds.
    #[must_use]
    pub const fn rtt(&self) -> Option<f64> {
        self.rtt
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        self.addr.is_none()
    }

    #[must_use]
    pub const fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Why the location of this hop could not be determined, if it failed.
    #[must_use]
    pub fn location_error(&self) -> Option<&str> {
        self.location_error.as_deref()
    }

    /// The reverse DNS hostname of the hop, if looked up.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = Some(location);
        self.location_error = None;
    }

    pub(crate) fn set_location_error(&mut self, error: String) {
        self.location = None;
        self.location_error = Some(error);
    }

    pub(crate) fn set_hostname(&mut self, hostname: String) {
        self.hostname = Some(hostname);
    }
}

/// The result of tracing the path to a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceResult {
    destination: String,
    addr: IpAddr,
    method: ProbeMethod,
    family: CommandFamily,
    fallback_used: bool,
    parse: ParseOutcome,
    hops: Vec<Hop>,
}

impl TraceResult {
    /// Create a `TraceResult`.
    ///
    /// The `hops` must be in ascending index order.
    #[must_use]
    pub const fn new(
        destination: String,
        addr: IpAddr,
        method: ProbeMethod,
        family: CommandFamily,
        fallback_used: bool,
        parse: ParseOutcome,
        hops: Vec<Hop>,
    ) -> Self {
        Self {
            destination,
            addr,
            method,
            family,
            fallback_used,
            parse,
            hops,
        }
    }

    /// The destination as given by the caller.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The resolved destination address.
    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        self.addr
    }

    /// The requested probe method.
    #[must_use]
    pub const fn method(&self) -> ProbeMethod {
        self.method
    }

    /// The family of tool which produced the output.
    #[must_use]
    pub const fn family(&self) -> CommandFamily {
        self.family
    }

    /// Was the trace re-run in UDP mode after a privilege failure?
    #[must_use]
    pub const fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    /// Which parse tier produced the hops.
    #[must_use]
    pub const fn parse(&self) -> ParseOutcome {
        self.parse
    }

    /// The output of the tool could not be interpreted at all.
    ///
    /// This is distinct from a trace which legitimately discovered no hops.
    #[must_use]
    pub fn is_uninterpretable(&self) -> bool {
        self.parse == ParseOutcome::Uninterpretable
    }

    /// The hops, in ascending index order.
    #[must_use]
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responded() {
        let hop = Hop::responded(2, IpAddr::from([10, 0, 0, 1]), Some(5.0));
        assert_eq!(2, hop.index());
        assert_eq!(Some(IpAddr::from([10, 0, 0, 1])), hop.addr());
        assert_eq!(Some(5.0), hop.rtt());
        assert!(!hop.is_timeout());
    }

    #[test]
    fn test_timeout() {
        let hop = Hop::timeout(3);
        assert_eq!(3, hop.index());
        assert_eq!(None, hop.addr());
        assert_eq!(None, hop.rtt());
        assert!(hop.is_timeout());
    }

    #[test]
    fn test_location_error_clears_location() {
        let mut hop = Hop::responded(1, IpAddr::from([1, 1, 1, 1]), None);
        hop.set_location(Location::private_network());
        assert!(hop.location().is_some());
        hop.set_location_error(String::from("rate limited"));
        assert!(hop.location().is_none());
        assert_eq!(Some("rate limited"), hop.location_error());
    }
}

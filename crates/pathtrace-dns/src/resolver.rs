use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use thiserror::Error;

/// A DNS resolver.
///
/// All lookups are blocking, async callers should run them on a blocking
/// thread pool.
pub trait Resolver: Send + Sync {
    /// Perform a blocking DNS hostname lookup and return the resolved IPv4 or IPv6 addresses.
    fn lookup(&self, hostname: &str) -> Result<ResolvedIpAddrs>;

    /// Perform a blocking reverse DNS lookup of `IpAddr` and return a `DnsEntry`.
    #[must_use]
    fn reverse_lookup(&self, addr: IpAddr) -> DnsEntry;
}

/// A DNS resolver error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A DNS resolver error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("DNS lookup failed: {0}")]
    LookupFailed(Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// The output of a successful DNS lookup.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedIpAddrs(pub(super) Vec<IpAddr>);

impl ResolvedIpAddrs {
    pub fn iter(&self) -> impl Iterator<Item = &'_ IpAddr> {
        self.0.iter()
    }

    /// The first resolved address, if any.
    #[must_use]
    pub fn first(&self) -> Option<IpAddr> {
        self.0.first().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<IpAddr>> for ResolvedIpAddrs {
    fn from(addrs: Vec<IpAddr>) -> Self {
        Self(addrs)
    }
}

impl IntoIterator for ResolvedIpAddrs {
    type Item = IpAddr;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The state of reverse DNS resolution.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DnsEntry {
    /// The reverse DNS resolution of `IpAddr` has resolved.
    Resolved(IpAddr, Vec<String>),
    /// The `IpAddr` could not be resolved.
    NotFound(IpAddr),
    /// The reverse DNS resolution of `IpAddr` failed.
    Failed(IpAddr),
    /// The reverse DNS resolution of `IpAddr` timed out.
    Timeout(IpAddr),
}

/// The resolved hostnames of a `DnsEntry`.
#[derive(Debug, Clone)]
pub struct ResolvedHostnames<'a>(pub(super) std::slice::Iter<'a, String>);

impl<'a> Iterator for ResolvedHostnames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(String::as_str)
    }
}

impl DnsEntry {
    /// The resolved hostnames.
    #[must_use]
    pub fn hostnames(&self) -> ResolvedHostnames<'_> {
        match self {
            Self::Resolved(_, hosts) => ResolvedHostnames(hosts.iter()),
            Self::NotFound(_) | Self::Failed(_) | Self::Timeout(_) =>
            {
                #[allow(clippy::iter_on_empty_collections)]
                ResolvedHostnames([].iter())
            }
        }
    }
}

impl Display for DnsEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved(_, hosts) => write!(f, "{}", hosts.join(" ")),
            Self::NotFound(ip) => write!(f, "{ip}"),
            Self::Failed(ip) => write!(f, "Failed: {ip}"),
            Self::Timeout(ip) => write!(f, "Timeout: {ip}"),
        }
    }
}

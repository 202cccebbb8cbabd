use crate::config::Config;
use crate::resolver::{DnsEntry, ResolvedIpAddrs, Resolver, Result};
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::sync::Arc;

/// How DNS queries will be resolved.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResolveMethod {
    /// Resolve using the OS resolver.
    System,
    /// Resolve using the `/etc/resolv.conf` DNS configuration.
    Resolv,
    /// Resolve using the Google `8.8.8.8` DNS service.
    Google,
    /// Resolve using the Cloudflare `1.1.1.1` DNS service.
    Cloudflare,
}

/// How to resolve IP addresses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IpAddrFamily {
    /// Lookup IPv4 only.
    Ipv4Only,
    /// Lookup IPv6 only.
    Ipv6Only,
    /// Lookup IPv6 with a fallback to IPv4.
    Ipv6thenIpv4,
    /// Lookup IPv4 with a fallback to IPv6.
    Ipv4thenIpv6,
    /// Use the first IP address returned by the OS resolver when using `ResolveMethod::System`,
    /// otherwise lookup IPv4 with a fallback to IPv6.
    System,
}

impl Display for IpAddrFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ipv4Only => write!(f, "Ipv4Only"),
            Self::Ipv6Only => write!(f, "Ipv6Only"),
            Self::Ipv6thenIpv4 => write!(f, "Ipv6thenIpv4"),
            Self::Ipv4thenIpv6 => write!(f, "Ipv4thenIpv6"),
            Self::System => write!(f, "System"),
        }
    }
}

/// A cheaply cloneable, blocking, forward and reverse DNS resolver.
#[derive(Clone)]
pub struct DnsResolver {
    inner: Arc<inner::DnsResolver>,
}

impl DnsResolver {
    /// Create and start a new `DnsResolver`.
    pub fn start(config: Config) -> std::io::Result<Self> {
        Ok(Self {
            inner: Arc::new(inner::DnsResolver::start(config)?),
        })
    }

    /// Get the `Config`.
    #[must_use]
    pub fn config(&self) -> &Config {
        self.inner.config()
    }
}

impl Resolver for DnsResolver {
    fn lookup(&self, hostname: &str) -> Result<ResolvedIpAddrs> {
        self.inner.lookup(hostname)
    }

    fn reverse_lookup(&self, addr: IpAddr) -> DnsEntry {
        self.inner.reverse_lookup(addr)
    }
}

/// Select the addresses of the requested family from the full set returned by the OS resolver.
pub(crate) fn select_family(all: Vec<IpAddr>, addr_family: IpAddrFamily) -> Vec<IpAddr> {
    use itertools::{Either, Itertools};
    fn partition(all: Vec<IpAddr>) -> (Vec<IpAddr>, Vec<IpAddr>) {
        all.into_iter().partition_map(|ip| match ip {
            IpAddr::V4(_) => Either::Left(ip),
            IpAddr::V6(_) => Either::Right(ip),
        })
    }
    match addr_family {
        IpAddrFamily::Ipv4Only => partition(all).0,
        IpAddrFamily::Ipv6Only => partition(all).1,
        IpAddrFamily::Ipv6thenIpv4 => {
            let (ipv4, ipv6) = partition(all);
            if ipv6.is_empty() {
                ipv4
            } else {
                ipv6
            }
        }
        IpAddrFamily::Ipv4thenIpv6 => {
            let (ipv4, ipv6) = partition(all);
            if ipv4.is_empty() {
                ipv6
            } else {
                ipv4
            }
        }
        IpAddrFamily::System => all,
    }
}

/// Private impl of resolver.
mod inner {
    use super::{select_family, Config, IpAddrFamily, ResolveMethod};
    use crate::resolver::{DnsEntry, Error, ResolvedIpAddrs, Result};
    use hickory_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
    use hickory_resolver::error::ResolveErrorKind;
    use hickory_resolver::system_conf::read_system_conf;
    use hickory_resolver::Resolver;
    use std::net::IpAddr;
    use tracing::instrument;

    enum DnsProvider {
        Hickory(Resolver),
        DnsLookup,
    }

    /// Resolver implementation.
    pub(super) struct DnsResolver {
        config: Config,
        provider: DnsProvider,
    }

    impl DnsResolver {
        pub(super) fn start(config: Config) -> std::io::Result<Self> {
            let provider = if matches!(config.resolve_method, ResolveMethod::System) {
                DnsProvider::DnsLookup
            } else {
                let mut options = ResolverOpts::default();
                #[allow(clippy::match_same_arms)]
                let ip_strategy = match config.addr_family {
                    IpAddrFamily::Ipv4Only => LookupIpStrategy::Ipv4Only,
                    IpAddrFamily::Ipv6Only => LookupIpStrategy::Ipv6Only,
                    IpAddrFamily::Ipv6thenIpv4 => LookupIpStrategy::Ipv6thenIpv4,
                    IpAddrFamily::Ipv4thenIpv6 => LookupIpStrategy::Ipv4thenIpv6,
                    IpAddrFamily::System => LookupIpStrategy::Ipv4thenIpv6,
                };
                options.timeout = config.timeout;
                options.ip_strategy = ip_strategy;
                let resolver = match config.resolve_method {
                    ResolveMethod::Resolv => {
                        let (resolver_cfg, mut options) = read_system_conf()?;
                        options.timeout = config.timeout;
                        options.ip_strategy = ip_strategy;
                        Resolver::new(resolver_cfg, options)
                    }
                    ResolveMethod::Google => Resolver::new(ResolverConfig::google(), options),
                    ResolveMethod::Cloudflare | ResolveMethod::System => {
                        Resolver::new(ResolverConfig::cloudflare(), options)
                    }
                }?;
                DnsProvider::Hickory(resolver)
            };
            Ok(Self { config, provider })
        }

        pub(super) const fn config(&self) -> &Config {
            &self.config
        }

        #[instrument(skip(self), level = "debug")]
        pub(super) fn lookup(&self, hostname: &str) -> Result<ResolvedIpAddrs> {
            match &self.provider {
                DnsProvider::Hickory(resolver) => Ok(resolver
                    .lookup_ip(hostname)
                    .map_err(|err| Error::LookupFailed(Box::new(err)))?
                    .iter()
                    .collect::<Vec<_>>()),
                DnsProvider::DnsLookup => {
                    let all = dns_lookup::lookup_host(hostname)
                        .map_err(|err| Error::LookupFailed(Box::new(err)))?;
                    Ok(select_family(all, self.config.addr_family))
                }
            }
            .map(ResolvedIpAddrs)
        }

        #[instrument(skip(self), level = "trace")]
        pub(super) fn reverse_lookup(&self, addr: IpAddr) -> DnsEntry {
            match &self.provider {
                // we can't distinguish between a failed lookup or a genuine error, and so we just
                // assume all failures are `DnsEntry::NotFound`.
                DnsProvider::DnsLookup => match dns_lookup::lookup_addr(&addr) {
                    Ok(dns) => DnsEntry::Resolved(addr, vec![dns]),
                    Err(_) => DnsEntry::NotFound(addr),
                },
                DnsProvider::Hickory(resolver) => match resolver.reverse_lookup(addr) {
                    Ok(name) => {
                        let hostnames = name
                            .into_iter()
                            .map(|mut s| {
                                s.0.set_fqdn(false);
                                s
                            })
                            .map(|s| s.to_string())
                            .collect();
                        DnsEntry::Resolved(addr, hostnames)
                    }
                    Err(err) => match err.kind() {
                        ResolveErrorKind::NoRecordsFound { .. } => DnsEntry::NotFound(addr),
                        ResolveErrorKind::Timeout => DnsEntry::Timeout(addr),
                        _ => DnsEntry::Failed(addr),
                    },
                },
            }
        }
    }
}

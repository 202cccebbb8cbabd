//! This crate provides a cheaply cloneable, blocking, forward and reverse DNS
//! resolver used to resolve trace destinations and, optionally, the hostnames
//! of the hops along the path.
//!
//! Lookups may be performed with the OS resolver or with the `hickory`
//! resolver using either the `/etc/resolv.conf` configuration or one of the
//! Google or Cloudflare public DNS services.
//!
//! # Example
//!
//! The following example resolves a hostname to an IPv4 address using the
//! Cloudflare 1.1.1.1 public DNS service and then performs a reverse lookup
//! of the first address found.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! # use std::time::Duration;
//! use pathtrace_dns::{Config, DnsResolver, IpAddrFamily, ResolveMethod, Resolver};
//!
//! let config = Config::new(
//!     ResolveMethod::Cloudflare,
//!     IpAddrFamily::Ipv4Only,
//!     Duration::from_secs(5),
//! );
//! let resolver = DnsResolver::start(config)?;
//! let addrs = resolver.lookup("example.com")?;
//! if let Some(addr) = addrs.first() {
//!     println!("{addr} is {}", resolver.reverse_lookup(addr));
//! }
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod config;
mod dns_resolver;
mod resolver;

pub use config::{Builder, Config};
pub use dns_resolver::{DnsResolver, IpAddrFamily, ResolveMethod};
pub use resolver::{DnsEntry, Error, ResolvedIpAddrs, Resolver, Result};

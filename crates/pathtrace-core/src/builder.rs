use crate::config::{defaults, CommandConfig, MAX_PROBES_PER_HOP};
use crate::enrich::Enricher;
use crate::error::{Error, Result};
use crate::runner::{Executor, ProcessExecutor, Runner};
use crate::selector::{CapabilityCheck, CommandSelector, PathToolLocator, SystemCapability, ToolLocator};
use crate::{Os, Tracer};
use pathtrace_dns::{Config, DnsResolver, Resolver};
use pathtrace_geoip::Locator;
use std::sync::Arc;
use std::time::Duration;

/// Build a tracer.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use pathtrace_core::Builder;
/// use std::time::Duration;
///
/// let tracer = Builder::new()
///     .max_hops(20)
///     .probe_timeout(Duration::from_secs(2))
///     .reverse_dns(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
///
/// # See Also
///
/// - [`Tracer`] - Trace the path to a destination.
pub struct Builder {
    os: Os,
    max_hops: u8,
    probe_timeout: Duration,
    probes_per_hop: u8,
    tcp_port: u16,
    ping_count: u16,
    deadline_margin: Duration,
    reverse_dns: bool,
    resolver: Option<Arc<dyn Resolver>>,
    locator: Option<Arc<dyn Locator>>,
    tools: Arc<dyn ToolLocator>,
    capability: Arc<dyn CapabilityCheck>,
    executor: Arc<dyn Executor>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            os: Os::current(),
            max_hops: CommandConfig::default().max_hops,
            probe_timeout: CommandConfig::default().probe_timeout,
            probes_per_hop: CommandConfig::default().probes_per_hop,
            tcp_port: CommandConfig::default().tcp_port,
            ping_count: CommandConfig::default().ping_count,
            deadline_margin: CommandConfig::default().deadline_margin,
            reverse_dns: defaults::DEFAULT_REVERSE_DNS,
            resolver: None,
            locator: None,
            tools: Arc::new(PathToolLocator),
            capability: Arc::new(SystemCapability),
            executor: Arc::new(ProcessExecutor),
        }
    }
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of hops.
    #[must_use]
    pub fn max_hops(self, max_hops: u8) -> Self {
        Self { max_hops, ..self }
    }

    /// Set how long each probe waits for a response.
    ///
    /// Tools which only accept whole seconds round this up.
    #[must_use]
    pub fn probe_timeout(self, probe_timeout: Duration) -> Self {
        Self {
            probe_timeout,
            ..self
        }
    }

    #[must_use]
    pub fn probes_per_hop(self, probes_per_hop: u8) -> Self {
        Self {
            probes_per_hop,
            ..self
        }
    }

    /// Set the destination port used for TCP tracing.
    #[must_use]
    pub fn tcp_port(self, tcp_port: u16) -> Self {
        Self { tcp_port, ..self }
    }

    /// Set the number of echo requests sent if falling back to `ping`.
    #[must_use]
    pub fn ping_count(self, ping_count: u16) -> Self {
        Self { ping_count, ..self }
    }

    /// Set the time allowed beyond the tool's own ceiling before it is killed.
    #[must_use]
    pub fn deadline_margin(self, deadline_margin: Duration) -> Self {
        Self {
            deadline_margin,
            ..self
        }
    }

    /// Look up the hostname of each hop.
    #[must_use]
    pub fn reverse_dns(self, reverse_dns: bool) -> Self {
        Self {
            reverse_dns,
            ..self
        }
    }

    /// Set the resolver used for destinations and reverse DNS.
    ///
    /// If not set a system resolver is started when the tracer is built.
    #[must_use]
    pub fn resolver(self, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver: Some(resolver),
            ..self
        }
    }

    /// Set the geolocation provider, if any.
    #[must_use]
    pub fn locator(self, locator: Option<Arc<dyn Locator>>) -> Self {
        Self { locator, ..self }
    }

    /// Override the detected operating system.
    #[must_use]
    pub fn os(self, os: Os) -> Self {
        Self { os, ..self }
    }

    #[must_use]
    pub fn tool_locator(self, tools: Arc<dyn ToolLocator>) -> Self {
        Self { tools, ..self }
    }

    #[must_use]
    pub fn capability_check(self, capability: Arc<dyn CapabilityCheck>) -> Self {
        Self { capability, ..self }
    }

    #[must_use]
    pub fn executor(self, executor: Arc<dyn Executor>) -> Self {
        Self { executor, ..self }
    }

    /// Build the [`Tracer`].
    pub fn build(self) -> Result<Tracer> {
        if self.max_hops == 0 {
            return Err(Error::BadConfig(String::from("max_hops must be greater than zero")));
        }
        if self.probes_per_hop == 0 || self.probes_per_hop > MAX_PROBES_PER_HOP {
            return Err(Error::BadConfig(format!(
                "probes_per_hop ({}) must be between 1 and {MAX_PROBES_PER_HOP}",
                self.probes_per_hop
            )));
        }
        if self.probe_timeout.is_zero() {
            return Err(Error::BadConfig(String::from(
                "probe_timeout must be greater than zero",
            )));
        }
        if self.ping_count == 0 {
            return Err(Error::BadConfig(String::from(
                "ping_count must be greater than zero",
            )));
        }
        let config = CommandConfig {
            max_hops: self.max_hops,
            probe_timeout: self.probe_timeout,
            probes_per_hop: self.probes_per_hop,
            tcp_port: self.tcp_port,
            ping_count: self.ping_count,
            deadline_margin: self.deadline_margin,
        };
        let resolver: Arc<dyn Resolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(DnsResolver::start(Config::default())?),
        };
        let reverse = self.reverse_dns.then(|| resolver.clone());
        Ok(Tracer::new(
            config,
            resolver,
            CommandSelector::new(self.os, config, self.tools, self.capability),
            Runner::new(self.executor),
            Enricher::new(self.locator, reverse),
        ))
    }
}

use crate::config::CommandConfig;
use crate::enrich::Enricher;
use crate::error::{Error, Result};
use crate::normalizer::Normalizer;
use crate::runner::Runner;
use crate::selector::CommandSelector;
use crate::{ProbeMethod, TraceResult};
use pathtrace_dns::Resolver;
use std::fmt::{Debug, Formatter};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

/// Trace the path to a destination with an external route tracing tool.
///
/// Use the [`crate::Builder`] type to create a [`Tracer`].
///
/// Each call to [`Tracer::trace`] is independent, the tracer holds no state
/// between traces and is cheaply cloneable.
#[derive(Clone)]
pub struct Tracer {
    config: CommandConfig,
    resolver: Arc<dyn Resolver>,
    selector: CommandSelector,
    runner: Runner,
    enricher: Enricher,
}

impl Tracer {
    pub(crate) fn new(
        config: CommandConfig,
        resolver: Arc<dyn Resolver>,
        selector: CommandSelector,
        runner: Runner,
        enricher: Enricher,
    ) -> Self {
        Self {
            config,
            resolver,
            selector,
            runner,
            enricher,
        }
    }

    /// Trace the path to `destination` with the probe method named `method`.
    ///
    /// The method name is matched case-insensitively, an unrecognized name is
    /// treated as `tcp`.
    ///
    /// Dropping the returned future kills any running tool and abandons any
    /// outstanding enrichment.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # #[tokio::main]
    /// # async fn main() -> anyhow::Result<()> {
    /// use pathtrace_core::Builder;
    ///
    /// let tracer = Builder::new().build()?;
    /// let result = tracer.trace("example.com", "udp").await?;
    /// for hop in result.hops() {
    ///     println!("{} {:?} {:?}", hop.index(), hop.addr(), hop.rtt());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn trace(&self, destination: &str, method: &str) -> Result<TraceResult> {
        self.trace_with(destination, ProbeMethod::from_name(method))
            .await
    }

    /// Trace the path to `destination` with `method`.
    #[instrument(skip(self), level = "info")]
    pub async fn trace_with(&self, destination: &str, method: ProbeMethod) -> Result<TraceResult> {
        let addr = self.resolve(destination).await?;
        let selector = self.selector.clone();
        let plan = tokio::task::spawn_blocking(move || selector.select(addr, method)).await??;
        let outcome = self.runner.run(&plan).await?;
        let normalized = Normalizer::for_family(outcome.family).normalize(&outcome.stdout);
        let hops = self.enricher.enrich(normalized.hops).await;
        tracing::info!(
            %addr,
            family = %outcome.family,
            fallback_used = outcome.fallback_used,
            outcome = ?normalized.outcome,
            hops = hops.len(),
            "trace complete"
        );
        Ok(TraceResult::new(
            destination.to_string(),
            addr,
            method,
            outcome.family,
            outcome.fallback_used,
            normalized.outcome,
            hops,
        ))
    }

    /// The tool invocation settings.
    #[must_use]
    pub const fn config(&self) -> &CommandConfig {
        &self.config
    }

    async fn resolve(&self, destination: &str) -> Result<IpAddr> {
        if let Ok(addr) = IpAddr::from_str(destination.trim()) {
            return Ok(addr);
        }
        let resolver = self.resolver.clone();
        let hostname = destination.trim().to_string();
        let resolved = tokio::task::spawn_blocking(move || resolver.lookup(&hostname))
            .await?
            .map_err(|source| Error::Resolution {
                destination: destination.to_string(),
                source,
            })?;
        let addr = resolved
            .first()
            .ok_or_else(|| Error::NoAddresses(destination.to_string()))?;
        tracing::debug!(destination, %addr, "resolved destination");
        Ok(addr)
    }
}

impl Debug for Tracer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("config", &self.config)
            .field("enrich", &self.enricher.is_enabled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{MockExecutor, RawOutput};
    use crate::selector::{MockCapabilityCheck, MockToolLocator};
    use crate::{Builder, CommandFamily, ParseOutcome};
    use pathtrace_dns::{DnsEntry, ResolvedIpAddrs};

    struct FixedResolver(Vec<IpAddr>);

    impl Resolver for FixedResolver {
        fn lookup(&self, hostname: &str) -> pathtrace_dns::Result<ResolvedIpAddrs> {
            if hostname == "unknown.invalid" {
                Err(pathtrace_dns::Error::LookupFailed(Box::from("no such host")))
            } else {
                Ok(ResolvedIpAddrs::from(self.0.clone()))
            }
        }

        fn reverse_lookup(&self, addr: IpAddr) -> DnsEntry {
            DnsEntry::NotFound(addr)
        }
    }

    fn tools() -> MockToolLocator {
        let mut tools = MockToolLocator::new();
        tools
            .expect_is_available()
            .returning(|program| program == "traceroute");
        tools
    }

    fn tracer(executor: MockExecutor) -> Tracer {
        let mut capability = MockCapabilityCheck::new();
        capability
            .expect_privilege()
            .returning(|| pathtrace_privilege::Privilege::new(true, false));
        Builder::new()
            .os(crate::Os::Linux)
            .resolver(Arc::new(FixedResolver(vec![IpAddr::from([93, 184, 216, 34])])))
            .tool_locator(Arc::new(tools()))
            .capability_check(Arc::new(capability))
            .executor(Arc::new(executor))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_trace() -> anyhow::Result<()> {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(|command| command.args().last().map(String::as_str) == Some("93.184.216.34"))
            .times(1)
            .returning(|_| {
                Ok(RawOutput {
                    exit_code: Some(0),
                    stdout: String::from(" 1  10.0.0.1  5.0 ms\n 2  * * *\n"),
                    stderr: String::new(),
                })
            });
        let result = tracer(executor).trace("example.com", "UDP").await?;
        assert_eq!("example.com", result.destination());
        assert_eq!(IpAddr::from([93, 184, 216, 34]), result.addr());
        assert_eq!(ProbeMethod::Udp, result.method());
        assert_eq!(CommandFamily::HopTracer, result.family());
        assert_eq!(ParseOutcome::Structured, result.parse());
        assert_eq!(2, result.hops().len());
        Ok(())
    }

    #[tokio::test]
    async fn test_literal_address_bypasses_dns() -> anyhow::Result<()> {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(|command| command.args().last().map(String::as_str) == Some("10.9.8.7"))
            .returning(|_| Ok(RawOutput { exit_code: Some(0), ..RawOutput::default() }));
        let result = tracer(executor).trace("10.9.8.7", "icmp").await?;
        assert_eq!(IpAddr::from([10, 9, 8, 7]), result.addr());
        assert!(result.is_uninterpretable());
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_privilege_discovery_off_runtime_thread() -> anyhow::Result<()> {
        let runtime_thread = std::thread::current().id();
        let mut capability = MockCapabilityCheck::new();
        capability.expect_privilege().times(1).returning(move || {
            assert_ne!(runtime_thread, std::thread::current().id());
            pathtrace_privilege::Privilege::new(true, false)
        });
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .returning(|_| Ok(RawOutput { exit_code: Some(0), ..RawOutput::default() }));
        let tracer = Builder::new()
            .os(crate::Os::Linux)
            .resolver(Arc::new(FixedResolver(vec![])))
            .tool_locator(Arc::new(tools()))
            .capability_check(Arc::new(capability))
            .executor(Arc::new(executor))
            .build()?;
        let result = tracer.trace("10.9.8.7", "icmp").await?;
        assert_eq!(CommandFamily::HopTracer, result.family());
        Ok(())
    }

    #[tokio::test]
    async fn test_resolution_failure_runs_nothing() {
        let mut executor = MockExecutor::new();
        executor.expect_execute().never();
        let err = tracer(executor)
            .trace("unknown.invalid", "tcp")
            .await
            .unwrap_err();
        assert!(err.is_resolution());
    }

    #[tokio::test]
    async fn test_execution_failure_is_error() {
        let mut executor = MockExecutor::new();
        executor.expect_execute().returning(|_| {
            Ok(RawOutput {
                exit_code: Some(1),
                stdout: String::from(" 1  10.0.0.1  5.0 ms"),
                stderr: String::from("boom"),
            })
        });
        let err = tracer(executor).trace("example.com", "tcp").await.unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
    }
}

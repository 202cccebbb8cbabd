use crate::config::{GeoIpProvider, LogFormat, LogSpanEvents, Mode, PathtraceConfig};
use crate::report;
use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use pathtrace_core::{Builder, TraceResult, Tracer};
use pathtrace_dns::{DnsResolver, Resolver};
use pathtrace_geoip::{IpInfoLocator, Locator, MmdbLocator};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run the pathtrace application.
pub fn run_pathtrace(cfg: &PathtraceConfig) -> anyhow::Result<()> {
    let _guard = configure_logging(cfg);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let tracer = make_tracer(cfg)?;
    let info = runtime.block_on(trace(&tracer, cfg))?;
    match cfg.mode {
        Mode::Pretty => report::table::report_pretty(&info, cfg.privacy_max_hops),
        Mode::Markdown => report::table::report_md(&info, cfg.privacy_max_hops),
        Mode::Json => report::json::report(&info, cfg.privacy_max_hops),
        Mode::Csv => report::csv::report(&info, cfg.privacy_max_hops),
        Mode::Stream => report::stream::report(&info, cfg.privacy_max_hops),
    }
}

/// Trace the configured target, stopping early on ctrl-c.
async fn trace(tracer: &Tracer, cfg: &PathtraceConfig) -> anyhow::Result<TraceInfo> {
    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted");
            ctrl_c_token.cancel();
        }
    });
    let start_timestamp = Utc::now();
    let result = tokio::select! {
        result = tracer.trace_with(&cfg.target, cfg.method) => result?,
        () = token.cancelled() => return Err(anyhow!("trace to {} interrupted", cfg.target)),
    };
    let end_timestamp = Utc::now();
    Ok(TraceInfo::new(result, start_timestamp, end_timestamp))
}

fn make_tracer(cfg: &PathtraceConfig) -> anyhow::Result<Tracer> {
    let resolver: Arc<dyn Resolver> = Arc::new(start_dns_resolver(cfg)?);
    Ok(Builder::new()
        .max_hops(cfg.max_hops)
        .probe_timeout(cfg.probe_timeout)
        .probes_per_hop(cfg.probes_per_hop)
        .tcp_port(cfg.tcp_port)
        .ping_count(cfg.ping_count)
        .deadline_margin(cfg.deadline_margin)
        .reverse_dns(cfg.reverse_dns)
        .resolver(resolver)
        .locator(create_locator(cfg)?)
        .build()?)
}

/// Start the DNS resolver.
fn start_dns_resolver(cfg: &PathtraceConfig) -> anyhow::Result<DnsResolver> {
    Ok(DnsResolver::start(pathtrace_dns::Config::new(
        cfg.dns_resolve_method,
        cfg.addr_family,
        cfg.dns_timeout,
    ))?)
}

fn create_locator(cfg: &PathtraceConfig) -> anyhow::Result<Option<Arc<dyn Locator>>> {
    Ok(match cfg.geoip_provider {
        GeoIpProvider::Off => None,
        GeoIpProvider::IpInfo => {
            let locator: Arc<dyn Locator> = Arc::new(IpInfoLocator::new(
                cfg.ipinfo_token.clone(),
                cfg.geoip_timeout,
            )?);
            Some(locator)
        }
        GeoIpProvider::Mmdb => {
            let path = cfg.geoip_mmdb_file.as_ref().ok_or_else(|| {
                anyhow!("geoip-mmdb-file must be given for geoip-provider of `mmdb`")
            })?;
            let locator: Arc<dyn Locator> = Arc::new(
                MmdbLocator::from_file(path, None)
                    .with_context(|| format!("failed to open geoip mmdb file: {path}"))?,
            );
            Some(locator)
        }
    })
}

fn configure_logging(cfg: &PathtraceConfig) -> Option<FlushGuard> {
    if cfg.verbose {
        let fmt_span = match cfg.log_span_events {
            LogSpanEvents::Off => FmtSpan::NONE,
            LogSpanEvents::Active => FmtSpan::ACTIVE,
            LogSpanEvents::Full => FmtSpan::FULL,
        };
        match cfg.log_format {
            LogFormat::Compact => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .compact()
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .pretty()
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_span_events(fmt_span)
                    .with_env_filter(&cfg.log_filter)
                    .json()
                    .init();
            }
            LogFormat::Chrome => {
                let (chrome_layer, guard) = ChromeLayerBuilder::new()
                    .writer(std::io::stderr())
                    .include_args(true)
                    .build();
                tracing_subscriber::registry().with(chrome_layer).init();
                return Some(guard);
            }
        }
    }
    None
}

/// A completed trace and when it ran, as needed by the reports.
#[derive(Debug, Clone)]
pub struct TraceInfo {
    pub result: TraceResult,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
}

impl TraceInfo {
    #[must_use]
    pub const fn new(
        result: TraceResult,
        start_timestamp: DateTime<Utc>,
        end_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            result,
            start_timestamp,
            end_timestamp,
        }
    }
}

use anyhow::anyhow;
use clap::ValueEnum;
use clap_complete::Shell;
use file::ConfigFile;
use pathtrace_core::{defaults, ProbeMethod, MAX_PROBES_PER_HOP};
use pathtrace_dns::{IpAddrFamily, ResolveMethod};
use serde::Deserialize;
use std::time::Duration;

mod cmd;
mod constants;
mod file;

pub use cmd::Args;

/// The output mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Generate a pretty text table report.
    Pretty,
    /// Generate a Markdown text table report.
    Markdown,
    /// Generate a JSON report.
    Json,
    /// Generate a CSV report.
    Csv,
    /// Display one line per hop.
    Stream,
}

/// The probe method.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeMethodConfig {
    /// Transmission Control Protocol
    Tcp,
    /// User Datagram Protocol
    Udp,
    /// Internet Control Message Protocol
    Icmp,
}

impl From<ProbeMethod> for ProbeMethodConfig {
    fn from(value: ProbeMethod) -> Self {
        match value {
            ProbeMethod::Tcp => Self::Tcp,
            ProbeMethod::Udp => Self::Udp,
            ProbeMethod::Icmp => Self::Icmp,
        }
    }
}

impl From<ProbeMethodConfig> for ProbeMethod {
    fn from(value: ProbeMethodConfig) -> Self {
        match value {
            ProbeMethodConfig::Tcp => Self::Tcp,
            ProbeMethodConfig::Udp => Self::Udp,
            ProbeMethodConfig::Icmp => Self::Icmp,
        }
    }
}

/// The address family.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressFamilyConfig {
    /// Ipv4 only.
    Ipv4,
    /// Ipv6 only.
    Ipv6,
    /// Ipv6 with a fallback to Ipv4
    #[serde(rename = "ipv6-then-ipv4")]
    Ipv6ThenIpv4,
    /// Ipv4 with a fallback to Ipv6
    #[serde(rename = "ipv4-then-ipv6")]
    Ipv4ThenIpv6,
    /// If the OS resolver is being used, use the first IP address returned,
    /// otherwise lookup IPv6 with a fallback to IPv4.
    System,
}

/// How DNS queries will be resolved.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DnsResolveMethodConfig {
    /// Resolve using the OS resolver.
    System,
    /// Resolve using the `/etc/resolv.conf` DNS configuration.
    Resolv,
    /// Resolve using the Google `8.8.8.8` DNS service.
    Google,
    /// Resolve using the Cloudflare `1.1.1.1` DNS service.
    Cloudflare,
}

/// Where hop locations are looked up.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeoIpProvider {
    /// Do not look up hop locations.
    Off,
    /// Query the ipinfo.io HTTP API.
    #[value(name = "ipinfo")]
    #[serde(rename = "ipinfo")]
    IpInfo,
    /// Read a MaxMind or IPinfo mmdb file.
    Mmdb,
}

/// How to format log data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Display log data in a compact format.
    Compact,
    /// Display log data in a pretty format.
    Pretty,
    /// Display log data in a json format.
    Json,
    /// Display log data in Chrome trace format.
    Chrome,
}

/// How to log event spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogSpanEvents {
    /// Do not display event spans.
    Off,
    /// Display enter and exit event spans.
    Active,
    /// Display all event spans.
    Full,
}

/// The action to perform.
#[derive(Debug, Eq, PartialEq)]
pub enum PathtraceAction {
    /// Trace the path to a target.
    Trace(PathtraceConfig),
    /// Print a template toml config file and exit.
    PrintConfigTemplate,
    /// Generate shell completion and exit.
    PrintShellCompletions(Shell),
    /// Generate a man page and exit.
    PrintManPage,
}

impl PathtraceAction {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        Ok(if args.print_config_template {
            Self::PrintConfigTemplate
        } else if let Some(shell) = args.generate {
            Self::PrintShellCompletions(shell)
        } else if args.generate_man {
            Self::PrintManPage
        } else {
            Self::Trace(PathtraceConfig::from(args)?)
        })
    }
}

/// Fully parsed and validated configuration.
#[derive(Debug, Eq, PartialEq)]
pub struct PathtraceConfig {
    pub target: String,
    pub mode: Mode,
    pub method: ProbeMethod,
    pub addr_family: IpAddrFamily,
    pub max_hops: u8,
    pub probe_timeout: Duration,
    pub probes_per_hop: u8,
    pub tcp_port: u16,
    pub ping_count: u16,
    pub deadline_margin: Duration,
    pub dns_resolve_method: ResolveMethod,
    pub dns_timeout: Duration,
    pub reverse_dns: bool,
    pub geoip_provider: GeoIpProvider,
    pub ipinfo_token: Option<String>,
    pub geoip_mmdb_file: Option<String>,
    pub geoip_timeout: Duration,
    pub privacy_max_hops: Option<usize>,
    pub verbose: bool,
    pub log_format: LogFormat,
    pub log_filter: String,
    pub log_span_events: LogSpanEvents,
}

impl PathtraceConfig {
    pub fn from(args: Args) -> anyhow::Result<Self> {
        let cfg_file = if let Some(cfg) = &args.config_file {
            file::read_config_file(cfg)?
        } else {
            file::read_default_config_file()?.unwrap_or_default()
        };
        Self::build_config(args, cfg_file)
    }

    #[allow(clippy::too_many_lines)]
    fn build_config(args: Args, cfg_file: ConfigFile) -> anyhow::Result<Self> {
        let cfg_file_trace = cfg_file.pathtrace.unwrap_or_default();
        let cfg_file_probe = cfg_file.probe.unwrap_or_default();
        let cfg_file_dns = cfg_file.dns.unwrap_or_default();
        let cfg_file_geoip = cfg_file.geoip.unwrap_or_default();
        let cfg_file_report = cfg_file.report.unwrap_or_default();
        let target = args
            .target
            .ok_or_else(|| anyhow!("a target hostname or IP must be given"))?;
        let mode = cfg_layer(args.mode, cfg_file_trace.mode, constants::DEFAULT_MODE);
        let verbose = args.verbose;
        let log_format = cfg_layer(
            args.log_format,
            cfg_file_trace.log_format,
            constants::DEFAULT_LOG_FORMAT,
        );
        let log_filter = cfg_layer(
            args.log_filter,
            cfg_file_trace.log_filter,
            String::from(constants::DEFAULT_LOG_FILTER),
        );
        let log_span_events = cfg_layer(
            args.log_span_events,
            cfg_file_trace.log_span_events,
            constants::DEFAULT_LOG_SPAN_EVENTS,
        );
        let method_cfg = cfg_layer(
            args.method,
            cfg_file_probe.method,
            ProbeMethodConfig::from(defaults::DEFAULT_PROBE_METHOD),
        );
        let method = match (args.udp, args.tcp, args.icmp, method_cfg) {
            (false, false, false, ProbeMethodConfig::Udp) | (true, _, _, _) => ProbeMethod::Udp,
            (false, false, false, ProbeMethodConfig::Tcp) | (_, true, _, _) => ProbeMethod::Tcp,
            (false, false, false, ProbeMethodConfig::Icmp) | (_, _, true, _) => ProbeMethod::Icmp,
        };
        let addr_family_cfg = cfg_layer(
            args.addr_family,
            cfg_file_probe.addr_family,
            constants::DEFAULT_ADDR_FAMILY,
        );
        let addr_family = match (args.ipv4, args.ipv6, addr_family_cfg) {
            (false, false, family) => dns_resolve_family(family),
            (true, _, _) => IpAddrFamily::Ipv4Only,
            (_, true, _) => IpAddrFamily::Ipv6Only,
        };
        let max_hops = cfg_layer(
            args.max_hops,
            cfg_file_probe.max_hops,
            defaults::DEFAULT_MAX_HOPS,
        );
        let probe_timeout = cfg_layer(
            args.probe_timeout,
            cfg_file_probe.probe_timeout,
            defaults::DEFAULT_PROBE_TIMEOUT,
        );
        let probes_per_hop = cfg_layer(
            args.probes_per_hop,
            cfg_file_probe.probes_per_hop,
            defaults::DEFAULT_PROBES_PER_HOP,
        );
        let tcp_port = cfg_layer(
            args.tcp_port,
            cfg_file_probe.tcp_port,
            defaults::DEFAULT_TCP_PORT,
        );
        let ping_count = cfg_layer(
            args.ping_count,
            cfg_file_probe.ping_count,
            defaults::DEFAULT_PING_COUNT,
        );
        let deadline_margin = cfg_layer(
            args.deadline_margin,
            cfg_file_probe.deadline_margin,
            defaults::DEFAULT_DEADLINE_MARGIN,
        );
        let dns_resolve_method = dns_resolve_method(cfg_layer(
            args.dns_resolve_method,
            cfg_file_dns.dns_resolve_method,
            constants::DEFAULT_DNS_RESOLVE_METHOD,
        ));
        let dns_timeout = cfg_layer(
            args.dns_timeout,
            cfg_file_dns.dns_timeout,
            constants::DEFAULT_DNS_TIMEOUT,
        );
        let reverse_dns = cfg_layer_bool_flag(
            args.reverse_dns,
            cfg_file_dns.reverse_dns,
            defaults::DEFAULT_REVERSE_DNS,
        );
        let geoip_provider = cfg_layer(
            args.geoip_provider,
            cfg_file_geoip.geoip_provider,
            constants::DEFAULT_GEOIP_PROVIDER,
        );
        let ipinfo_token = cfg_layer_opt(args.ipinfo_token, cfg_file_geoip.ipinfo_token);
        let geoip_mmdb_file = cfg_layer_opt(args.geoip_mmdb_file, cfg_file_geoip.geoip_mmdb_file);
        let geoip_timeout = cfg_layer(
            args.geoip_timeout,
            cfg_file_geoip.geoip_timeout,
            constants::DEFAULT_GEOIP_TIMEOUT,
        );
        let privacy_max_hops =
            cfg_layer_opt(args.privacy_max_hops, cfg_file_report.privacy_max_hops);
        validate_max_hops(max_hops)?;
        validate_probe_timeout(probe_timeout)?;
        validate_probes_per_hop(probes_per_hop)?;
        validate_ping_count(ping_count)?;
        validate_deadline_margin(deadline_margin)?;
        validate_geoip(geoip_provider, geoip_mmdb_file.as_deref())?;
        Ok(Self {
            target,
            mode,
            method,
            addr_family,
            max_hops,
            probe_timeout,
            probes_per_hop,
            tcp_port,
            ping_count,
            deadline_margin,
            dns_resolve_method,
            dns_timeout,
            reverse_dns,
            geoip_provider,
            ipinfo_token,
            geoip_mmdb_file,
            geoip_timeout,
            privacy_max_hops,
            verbose,
            log_format,
            log_filter,
            log_span_events,
        })
    }
}

impl Default for PathtraceConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            mode: constants::DEFAULT_MODE,
            method: defaults::DEFAULT_PROBE_METHOD,
            addr_family: dns_resolve_family(constants::DEFAULT_ADDR_FAMILY),
            max_hops: defaults::DEFAULT_MAX_HOPS,
            probe_timeout: defaults::DEFAULT_PROBE_TIMEOUT,
            probes_per_hop: defaults::DEFAULT_PROBES_PER_HOP,
            tcp_port: defaults::DEFAULT_TCP_PORT,
            ping_count: defaults::DEFAULT_PING_COUNT,
            deadline_margin: defaults::DEFAULT_DEADLINE_MARGIN,
            dns_resolve_method: dns_resolve_method(constants::DEFAULT_DNS_RESOLVE_METHOD),
            dns_timeout: constants::DEFAULT_DNS_TIMEOUT,
            reverse_dns: defaults::DEFAULT_REVERSE_DNS,
            geoip_provider: constants::DEFAULT_GEOIP_PROVIDER,
            ipinfo_token: None,
            geoip_mmdb_file: None,
            geoip_timeout: constants::DEFAULT_GEOIP_TIMEOUT,
            privacy_max_hops: None,
            verbose: false,
            log_format: constants::DEFAULT_LOG_FORMAT,
            log_filter: String::from(constants::DEFAULT_LOG_FILTER),
            log_span_events: constants::DEFAULT_LOG_SPAN_EVENTS,
        }
    }
}

const fn dns_resolve_method(dns_resolve_method: DnsResolveMethodConfig) -> ResolveMethod {
    match dns_resolve_method {
        DnsResolveMethodConfig::System => ResolveMethod::System,
        DnsResolveMethodConfig::Resolv => ResolveMethod::Resolv,
        DnsResolveMethodConfig::Google => ResolveMethod::Google,
        DnsResolveMethodConfig::Cloudflare => ResolveMethod::Cloudflare,
    }
}

const fn dns_resolve_family(dns_resolve_family: AddressFamilyConfig) -> IpAddrFamily {
    match dns_resolve_family {
        AddressFamilyConfig::Ipv4 => IpAddrFamily::Ipv4Only,
        AddressFamilyConfig::Ipv6 => IpAddrFamily::Ipv6Only,
        AddressFamilyConfig::Ipv6ThenIpv4 => IpAddrFamily::Ipv6thenIpv4,
        AddressFamilyConfig::Ipv4ThenIpv6 => IpAddrFamily::Ipv4thenIpv6,
        AddressFamilyConfig::System => IpAddrFamily::System,
    }
}

fn cfg_layer<T>(fst: Option<T>, snd: Option<T>, def: T) -> T {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => val,
        (None, None) => def,
    }
}

fn cfg_layer_opt<T>(fst: Option<T>, snd: Option<T>) -> Option<T> {
    match (fst, snd) {
        (Some(val), _) | (None, Some(val)) => Some(val),
        (None, None) => None,
    }
}

const fn cfg_layer_bool_flag(fst: bool, snd: Option<bool>, default: bool) -> bool {
    match (fst, snd) {
        (true, _) => true,
        (false, Some(val)) => val,
        (false, None) => default,
    }
}

/// Validate `max_hops`.
fn validate_max_hops(max_hops: u8) -> anyhow::Result<()> {
    if max_hops == 0 || max_hops > constants::MAX_HOPS {
        Err(anyhow!(
            "max-hops ({}) must be between 1 and {} inclusive",
            max_hops,
            constants::MAX_HOPS
        ))
    } else {
        Ok(())
    }
}

/// Validate `probe_timeout`.
fn validate_probe_timeout(probe_timeout: Duration) -> anyhow::Result<()> {
    if probe_timeout < constants::MIN_PROBE_TIMEOUT || probe_timeout > constants::MAX_PROBE_TIMEOUT
    {
        Err(anyhow!(
            "probe-timeout ({:?}) must be between {:?} and {:?} inclusive",
            probe_timeout,
            constants::MIN_PROBE_TIMEOUT,
            constants::MAX_PROBE_TIMEOUT
        ))
    } else {
        Ok(())
    }
}

/// Validate `probes_per_hop`.
fn validate_probes_per_hop(probes_per_hop: u8) -> anyhow::Result<()> {
    if probes_per_hop == 0 || probes_per_hop > MAX_PROBES_PER_HOP {
        Err(anyhow!(
            "probes-per-hop ({}) must be between 1 and {} inclusive",
            probes_per_hop,
            MAX_PROBES_PER_HOP
        ))
    } else {
        Ok(())
    }
}

/// Validate `ping_count`.
fn validate_ping_count(ping_count: u16) -> anyhow::Result<()> {
    if ping_count == 0 || ping_count > constants::MAX_PING_COUNT {
        Err(anyhow!(
            "ping-count ({}) must be between 1 and {} inclusive",
            ping_count,
            constants::MAX_PING_COUNT
        ))
    } else {
        Ok(())
    }
}

/// Validate `deadline_margin`.
fn validate_deadline_margin(deadline_margin: Duration) -> anyhow::Result<()> {
    if deadline_margin > constants::MAX_DEADLINE_MARGIN {
        Err(anyhow!(
            "deadline-margin ({:?}) must not exceed {:?}",
            deadline_margin,
            constants::MAX_DEADLINE_MARGIN
        ))
    } else {
        Ok(())
    }
}

/// Validate `geoip_provider` and `geoip_mmdb_file`.
fn validate_geoip(
    geoip_provider: GeoIpProvider,
    geoip_mmdb_file: Option<&str>,
) -> anyhow::Result<()> {
    match (geoip_provider, geoip_mmdb_file) {
        (GeoIpProvider::Mmdb, None) => Err(anyhow!(
            "geoip-mmdb-file must be given for geoip-provider of `mmdb`"
        )),
        (GeoIpProvider::Off | GeoIpProvider::IpInfo, Some(_)) => Err(anyhow!(
            "geoip-mmdb-file requires geoip-provider of `mmdb` (hint: add `-g mmdb`)"
        )),
        _ => Ok(()),
    }
}

use crate::config::constants::IPINFO_TOKEN_ENV;
use crate::config::{
    AddressFamilyConfig, DnsResolveMethodConfig, GeoIpProvider, LogFormat, LogSpanEvents, Mode,
    ProbeMethodConfig,
};
use clap::builder::Styles;
use clap::Parser;
use clap_complete::Shell;
use std::time::Duration;

/// Trace the network path to a host with the tools already installed
#[derive(Parser, Debug)]
#[command(name = "pathtrace", author, version, about, long_about = None, arg_required_else_help(true), styles=Styles::styled())]
pub struct Args {
    /// The hostname or IP to trace
    #[arg(required_unless_present_any(["print_config_template", "generate", "generate_man"]))]
    pub target: Option<String>,

    /// Config file
    #[arg(short = 'c', long, value_hint = clap::ValueHint::FilePath)]
    pub config_file: Option<String>,

    /// Output mode [default: pretty]
    #[arg(value_enum, short = 'm', long)]
    pub mode: Option<Mode>,

    /// Probe method [default: tcp]
    #[arg(value_enum, short = 'p', long)]
    pub method: Option<ProbeMethodConfig>,

    /// Probe using UDP
    #[arg(
        long,
        conflicts_with = "method",
        conflicts_with = "tcp",
        conflicts_with = "icmp"
    )]
    pub udp: bool,

    /// Probe using TCP
    #[arg(
        long,
        conflicts_with = "method",
        conflicts_with = "udp",
        conflicts_with = "icmp"
    )]
    pub tcp: bool,

    /// Probe using ICMP
    #[arg(
        long,
        conflicts_with = "method",
        conflicts_with = "udp",
        conflicts_with = "tcp"
    )]
    pub icmp: bool,

    /// The address family [default: system]
    #[arg(value_enum, short = 'F', long)]
    pub addr_family: Option<AddressFamilyConfig>,

    /// Use IPv4 only
    #[arg(
        short = '4',
        long,
        conflicts_with = "ipv6",
        conflicts_with = "addr_family"
    )]
    pub ipv4: bool,

    /// Use IPv6 only
    #[arg(
        short = '6',
        long,
        conflicts_with = "ipv4",
        conflicts_with = "addr_family"
    )]
    pub ipv6: bool,

    /// The maximum number of hops [default: 30]
    #[arg(short = 't', long)]
    pub max_hops: Option<u8>,

    /// How long each probe waits for a response [default: 3s]
    #[arg(short = 'w', long, value_parser = parse_duration)]
    pub probe_timeout: Option<Duration>,

    /// The number of probes sent to each hop [default: 3]
    #[arg(short = 'q', long)]
    pub probes_per_hop: Option<u8>,

    /// The destination port for TCP probes [default: 80]
    #[arg(short = 'P', long)]
    pub tcp_port: Option<u16>,

    /// The number of echo requests sent if only ping is available [default: 5]
    #[arg(short = 'C', long)]
    pub ping_count: Option<u16>,

    /// Time allowed beyond the tool's own limit before it is stopped [default: 5s]
    #[arg(long, value_parser = parse_duration)]
    pub deadline_margin: Option<Duration>,

    /// How to perform DNS queries [default: system]
    #[arg(value_enum, short = 'r', long)]
    pub dns_resolve_method: Option<DnsResolveMethodConfig>,

    /// The maximum time to wait to perform DNS queries [default: 5s]
    #[arg(long, value_parser = parse_duration)]
    pub dns_timeout: Option<Duration>,

    /// Lookup the hostname of each hop [default: false]
    #[arg(short = 'z', long)]
    pub reverse_dns: bool,

    /// The geolocation provider [default: off]
    #[arg(value_enum, short = 'g', long)]
    pub geoip_provider: Option<GeoIpProvider>,

    /// The ipinfo.io API token
    #[arg(long, env = IPINFO_TOKEN_ENV, hide_env_values = true)]
    pub ipinfo_token: Option<String>,

    /// The supported MaxMind or IPinfo GeoIp mmdb file
    #[arg(short = 'G', long, value_hint = clap::ValueHint::FilePath)]
    pub geoip_mmdb_file: Option<String>,

    /// The maximum time to wait for each geolocation lookup [default: 5s]
    #[arg(long, value_parser = parse_duration)]
    pub geoip_timeout: Option<Duration>,

    /// The maximum hop index which will be masked for privacy [default: none]
    #[arg(long)]
    pub privacy_max_hops: Option<usize>,

    /// Generate shell completion
    #[arg(long)]
    pub generate: Option<Shell>,

    /// Generate ROFF man page
    #[arg(long)]
    pub generate_man: bool,

    /// Print a template toml config file and exit
    #[arg(long)]
    pub print_config_template: bool,

    /// The debug log format [default: pretty]
    #[arg(value_enum, long)]
    pub log_format: Option<LogFormat>,

    /// The debug log filter [default: pathtrace=debug]
    #[arg(long)]
    pub log_filter: Option<String>,

    /// The debug log span events [default: off]
    #[arg(value_enum, long)]
    pub log_span_events: Option<LogSpanEvents>,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    Ok(humantime::parse_duration(value)?)
}

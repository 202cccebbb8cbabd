use crate::config::{
    AddressFamilyConfig, DnsResolveMethodConfig, GeoIpProvider, LogFormat, LogSpanEvents, Mode,
};
use std::time::Duration;

/// The default value for `mode`.
pub const DEFAULT_MODE: Mode = Mode::Pretty;

/// The default value for `log-format`.
pub const DEFAULT_LOG_FORMAT: LogFormat = LogFormat::Pretty;

/// The default value for `log-span-events`.
pub const DEFAULT_LOG_SPAN_EVENTS: LogSpanEvents = LogSpanEvents::Off;

/// The default value for `log-filter`.
pub const DEFAULT_LOG_FILTER: &str = "pathtrace=debug";

/// The default value for `dns-resolve-method`.
pub const DEFAULT_DNS_RESOLVE_METHOD: DnsResolveMethodConfig = DnsResolveMethodConfig::System;

/// The default value for `addr-family`.
pub const DEFAULT_ADDR_FAMILY: AddressFamilyConfig = AddressFamilyConfig::System;

/// The default value for `dns-timeout`.
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_millis(5000);

/// The default value for `geoip-provider`.
pub const DEFAULT_GEOIP_PROVIDER: GeoIpProvider = GeoIpProvider::Off;

/// The default value for `geoip-timeout`.
pub const DEFAULT_GEOIP_TIMEOUT: Duration = Duration::from_secs(5);

/// The environment variable which may hold the ipinfo.io API token.
pub const IPINFO_TOKEN_ENV: &str = "IPINFO_API_KEY";

/// The maximum number of hops which may be traced.
pub const MAX_HOPS: u8 = 64;

/// The minimum per-probe timeout.
pub const MIN_PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// The maximum per-probe timeout.
pub const MAX_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// The maximum number of `ping` echo requests.
pub const MAX_PING_COUNT: u16 = 100;

/// The maximum deadline margin.
pub const MAX_DEADLINE_MARGIN: Duration = Duration::from_secs(300);

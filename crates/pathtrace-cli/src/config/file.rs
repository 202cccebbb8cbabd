use crate::config::{
    AddressFamilyConfig, DnsResolveMethodConfig, GeoIpProvider, LogFormat, LogSpanEvents, Mode,
    ProbeMethodConfig,
};
use anyhow::Context;
use encoding_rs_io::DecodeReaderBytes;
use etcetera::BaseStrategy;
use pathtrace_core::defaults;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "pathtrace.toml";
const DEFAULT_HIDDEN_CONFIG_FILE: &str = ".pathtrace.toml";

/// Read the config from the default location of user config for the platform.
///
/// Returns the parsed `Some(ConfigFile)` if the config file exists, `None` otherwise.
///
/// A `pathtrace.toml` or `.pathtrace.toml` config file is searched for in:
///     - the current directory
///     - the user home directory
///     - the XDG config directory (Unix only): `$XDG_CONFIG_HOME` or `~/.config`
///     - the XDG app config directory (Unix only): `$XDG_CONFIG_HOME/pathtrace` or `~/.config/pathtrace`
///     - the Windows data directory (Windows only): `%APPDATA%`
///
/// Only the first config file found is used.
pub fn read_default_config_file() -> anyhow::Result<Option<ConfigFile>> {
    use etcetera::base_strategy as base;
    if let Some(file) = read_files("")? {
        Ok(Some(file))
    } else {
        let basedirs = base::choose_base_strategy()?;
        if let Some(file) = read_files(basedirs.home_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir())? {
            Ok(Some(file))
        } else if let Some(file) = read_files(basedirs.config_dir().join("pathtrace"))? {
            Ok(Some(file))
        } else {
            Ok(None)
        }
    }
}

/// Read the config from the given path.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> anyhow::Result<ConfigFile> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("config file not found: {}", path.as_ref().display()))?;
    let mut decoder = DecodeReaderBytes::new(BufReader::new(file));
    let mut dest = String::new();
    decoder.read_to_string(&mut dest)?;
    toml::from_str(&dest)
        .with_context(|| format!("invalid config file: {}", path.as_ref().display()))
}

fn read_files<P: AsRef<Path>>(dir: P) -> anyhow::Result<Option<ConfigFile>> {
    if let Some(file) = read_file(dir.as_ref(), DEFAULT_CONFIG_FILE)? {
        Ok(Some(file))
    } else if let Some(file) = read_file(dir.as_ref(), DEFAULT_HIDDEN_CONFIG_FILE)? {
        Ok(Some(file))
    } else {
        Ok(None)
    }
}

fn read_file<P: AsRef<Path>>(dir: P, file: &str) -> anyhow::Result<Option<ConfigFile>> {
    let path = dir.as_ref().join(file);
    if path.exists() {
        Ok(Some(read_config_file(path)?))
    } else {
        Ok(None)
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub pathtrace: Option<ConfigPathtrace>,
    pub probe: Option<ConfigProbe>,
    pub dns: Option<ConfigDns>,
    pub geoip: Option<ConfigGeoIp>,
    pub report: Option<ConfigReport>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            pathtrace: Some(ConfigPathtrace::default()),
            probe: Some(ConfigProbe::default()),
            dns: Some(ConfigDns::default()),
            geoip: Some(ConfigGeoIp::default()),
            report: Some(ConfigReport::default()),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigPathtrace {
    pub mode: Option<Mode>,
    pub log_format: Option<LogFormat>,
    pub log_filter: Option<String>,
    pub log_span_events: Option<LogSpanEvents>,
}

impl Default for ConfigPathtrace {
    fn default() -> Self {
        Self {
            mode: Some(super::constants::DEFAULT_MODE),
            log_format: Some(super::constants::DEFAULT_LOG_FORMAT),
            log_filter: Some(String::from(super::constants::DEFAULT_LOG_FILTER)),
            log_span_events: Some(super::constants::DEFAULT_LOG_SPAN_EVENTS),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigProbe {
    pub method: Option<ProbeMethodConfig>,
    pub addr_family: Option<AddressFamilyConfig>,
    pub max_hops: Option<u8>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub probe_timeout: Option<Duration>,
    pub probes_per_hop: Option<u8>,
    pub tcp_port: Option<u16>,
    pub ping_count: Option<u16>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub deadline_margin: Option<Duration>,
}

impl Default for ConfigProbe {
    fn default() -> Self {
        Self {
            method: Some(ProbeMethodConfig::from(defaults::DEFAULT_PROBE_METHOD)),
            addr_family: Some(super::constants::DEFAULT_ADDR_FAMILY),
            max_hops: Some(defaults::DEFAULT_MAX_HOPS),
            probe_timeout: Some(defaults::DEFAULT_PROBE_TIMEOUT),
            probes_per_hop: Some(defaults::DEFAULT_PROBES_PER_HOP),
            tcp_port: Some(defaults::DEFAULT_TCP_PORT),
            ping_count: Some(defaults::DEFAULT_PING_COUNT),
            deadline_margin: Some(defaults::DEFAULT_DEADLINE_MARGIN),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigDns {
    pub dns_resolve_method: Option<DnsResolveMethodConfig>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub dns_timeout: Option<Duration>,
    pub reverse_dns: Option<bool>,
}

impl Default for ConfigDns {
    fn default() -> Self {
        Self {
            dns_resolve_method: Some(super::constants::DEFAULT_DNS_RESOLVE_METHOD),
            dns_timeout: Some(super::constants::DEFAULT_DNS_TIMEOUT),
            reverse_dns: Some(defaults::DEFAULT_REVERSE_DNS),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigGeoIp {
    pub geoip_provider: Option<GeoIpProvider>,
    pub ipinfo_token: Option<String>,
    pub geoip_mmdb_file: Option<String>,
    #[serde(default)]
    #[serde(deserialize_with = "humantime_deser")]
    pub geoip_timeout: Option<Duration>,
}

impl Default for ConfigGeoIp {
    fn default() -> Self {
        Self {
            geoip_provider: Some(super::constants::DEFAULT_GEOIP_PROVIDER),
            ipinfo_token: None,
            geoip_mmdb_file: None,
            geoip_timeout: Some(super::constants::DEFAULT_GEOIP_TIMEOUT),
        }
    }
}

#[derive(Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigReport {
    pub privacy_max_hops: Option<usize>,
}

fn humantime_deser<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    humantime::parse_duration(&String::deserialize(deserializer)?)
        .map_err(serde::de::Error::custom)
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_sample() {
        let config: ConfigFile =
            toml::from_str(include_str!("../../pathtrace-config-sample.toml")).unwrap();
        pretty_assertions::assert_eq!(ConfigFile::default(), config);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: ConfigFile = toml::from_str(
            r#"
[probe]
method = "icmp"
probe-timeout = "1500ms"

[geoip]
geoip-provider = "ipinfo"
"#,
        )
        .unwrap();
        let probe = config.probe.unwrap();
        assert_eq!(Some(ProbeMethodConfig::Icmp), probe.method);
        assert_eq!(Some(Duration::from_millis(1500)), probe.probe_timeout);
        assert_eq!(None, probe.max_hops);
        assert_eq!(
            Some(GeoIpProvider::IpInfo),
            config.geoip.unwrap().geoip_provider
        );
        assert_eq!(None, config.dns);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let config = toml::from_str::<ConfigFile>("[probe]\nmax-ttl = 10\n");
        assert!(config.is_err());
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let config = toml::from_str::<ConfigFile>("[probe]\nprobe-timeout = \"soon\"\n");
        assert!(config.is_err());
    }
}

use crate::app::TraceInfo;
use chrono::Utc;
use serde::{Serialize, Serializer};
use std::net::IpAddr;

/// The value rendered in place of anything unknown.
pub const UNKNOWN: &str = "???";

/// The value rendered for a hop which did not respond.
pub const TIMEOUT: &str = "*";

/// The hostname rendered for a hop masked for privacy.
pub const HIDDEN: &str = "[hidden]";

#[derive(Serialize)]
pub struct Report {
    pub info: Info,
    pub hops: Vec<Hop>,
}

impl Report {
    pub fn new(info: &TraceInfo, privacy_max_hops: Option<usize>) -> Self {
        let result = &info.result;
        Self {
            info: Info {
                target: Host {
                    ip: result.addr(),
                    hostname: Some(result.destination().to_string()),
                },
                method: result.method().to_string(),
                family: result.family().to_string(),
                fallback_used: result.fallback_used(),
                parse: format!("{:?}", result.parse()),
                start_timestamp: info.start_timestamp,
                end_timestamp: info.end_timestamp,
            },
            hops: hops(info, privacy_max_hops),
        }
    }
}

/// The report hops of a trace, masked for privacy.
pub fn hops(info: &TraceInfo, privacy_max_hops: Option<usize>) -> Vec<Hop> {
    info.result
        .hops()
        .iter()
        .map(|hop| Hop::new(hop, privacy_max_hops))
        .collect()
}

#[derive(Serialize)]
pub struct Info {
    pub target: Host,
    pub method: String,
    pub family: String,
    pub fallback_used: bool,
    pub parse: String,
    pub start_timestamp: chrono::DateTime<Utc>,
    pub end_timestamp: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
pub struct Hop {
    pub hop: usize,
    pub host: Option<Host>,
    #[serde(serialize_with = "fixed_width")]
    pub rtt: Option<f64>,
    pub location: Option<String>,
    pub organization: Option<String>,
    pub location_error: Option<String>,
}

impl Hop {
    /// Create a report `Hop`, masking it if its index is within `privacy_max_hops`.
    pub fn new(hop: &pathtrace_core::Hop, privacy_max_hops: Option<usize>) -> Self {
        let masked = privacy_max_hops.is_some_and(|max| hop.index() <= max);
        let host = hop.addr().map(|ip| {
            if masked {
                Host {
                    ip: IpAddr::from([0, 0, 0, 0]),
                    hostname: Some(String::from(HIDDEN)),
                }
            } else {
                Host {
                    ip,
                    hostname: hop.hostname().map(ToString::to_string),
                }
            }
        });
        let location = hop.location().filter(|_| !masked);
        Self {
            hop: hop.index(),
            host,
            rtt: hop.rtt(),
            location: location.map(pathtrace_geoip::Location::short_name),
            organization: location.and_then(|location| location.organization.clone()),
            location_error: hop
                .location_error()
                .filter(|_| !masked)
                .map(ToString::to_string),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.host.is_none()
    }

    /// The address, `*` if the hop did not respond.
    pub fn ip(&self) -> String {
        self.host
            .as_ref()
            .map_or_else(|| String::from(TIMEOUT), |host| host.ip.to_string())
    }

    /// The hostname, `*` if the hop did not respond.
    pub fn hostname(&self) -> String {
        match &self.host {
            Some(Host {
                hostname: Some(hostname),
                ..
            }) => hostname.clone(),
            Some(_) => String::from(UNKNOWN),
            None => String::from(TIMEOUT),
        }
    }

    /// The round-trip time to one decimal place, `*` if the hop did not respond.
    pub fn rtt_ms(&self) -> String {
        match (self.is_timeout(), self.rtt) {
            (true, _) => String::from(TIMEOUT),
            (false, Some(rtt)) => format!("{rtt:.1}"),
            (false, None) => String::from(UNKNOWN),
        }
    }

    pub fn location_name(&self) -> String {
        self.location
            .clone()
            .filter(|location| !location.is_empty())
            .unwrap_or_else(|| self.placeholder())
    }

    pub fn organization_name(&self) -> String {
        self.organization
            .clone()
            .unwrap_or_else(|| self.placeholder())
    }

    fn placeholder(&self) -> String {
        if self.is_timeout() {
            String::from(TIMEOUT)
        } else {
            String::from(UNKNOWN)
        }
    }
}

#[derive(Serialize)]
pub struct Host {
    pub ip: IpAddr,
    pub hostname: Option<String>,
}

#[allow(clippy::ref_option)]
pub fn fixed_width<S>(val: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match val {
        Some(val) => serializer.serialize_str(&format!("{val:.2}")),
        None => serializer.serialize_none(),
    }
}

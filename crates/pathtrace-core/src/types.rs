use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The probe method requested for a trace.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ProbeMethod {
    /// TCP SYN probes.
    #[default]
    Tcp,
    /// UDP probes.
    Udp,
    /// ICMP echo probes.
    Icmp,
}

impl ProbeMethod {
    /// Parse a probe method name, falling back to [`ProbeMethod::Tcp`].
    ///
    /// Matching is case-insensitive, an unrecognized name is logged and
    /// treated as TCP.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::from_str(name).unwrap_or_else(|()| {
            tracing::warn!(method = name, "unrecognized probe method, using tcp");
            Self::default()
        })
    }

    /// Does tracing with this method require raw socket privileges?
    #[must_use]
    pub const fn needs_privileges(self) -> bool {
        matches!(self, Self::Tcp | Self::Icmp)
    }
}

impl FromStr for ProbeMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "icmp" => Ok(Self::Icmp),
            _ => Err(()),
        }
    }
}

impl Display for ProbeMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
            Self::Icmp => write!(f, "icmp"),
        }
    }
}

/// The family of external tool which produced some output.
///
/// The family selects the structured parser tried first when normalizing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CommandFamily {
    /// `traceroute` or `tracert`.
    HopTracer,
    /// `tracepath`.
    LightweightTracer,
    /// `ping`.
    ReachabilityProbe,
    /// Output of unknown origin.
    Unknown,
}

impl Display for CommandFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HopTracer => write!(f, "hop-tracer"),
            Self::LightweightTracer => write!(f, "lightweight-tracer"),
            Self::ReachabilityProbe => write!(f, "reachability-probe"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// The host operating system, which determines tool names and flags.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
    /// Any other Unix, treated like Linux.
    OtherUnix,
}

impl Os {
    /// The operating system we are running on.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::OtherUnix
        }
    }
}

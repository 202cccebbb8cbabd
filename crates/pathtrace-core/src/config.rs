use std::time::Duration;

/// Default values for configuration.
pub mod defaults {
    use crate::ProbeMethod;
    use std::time::Duration;

    /// The default value for `method`.
    pub const DEFAULT_PROBE_METHOD: ProbeMethod = ProbeMethod::Tcp;

    /// The default value for `max-hops`.
    pub const DEFAULT_MAX_HOPS: u8 = 30;

    /// The default value for `probe-timeout`.
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

    /// The default value for `probes-per-hop`.
    pub const DEFAULT_PROBES_PER_HOP: u8 = 3;

    /// The default value for `tcp-port`.
    pub const DEFAULT_TCP_PORT: u16 = 80;

    /// The default value for `ping-count`.
    pub const DEFAULT_PING_COUNT: u16 = 5;

    /// The default value for `deadline-margin`.
    pub const DEFAULT_DEADLINE_MARGIN: Duration = Duration::from_secs(5);

    /// The default value for `reverse-dns`.
    pub const DEFAULT_REVERSE_DNS: bool = false;
}

/// The maximum number of probes per hop supported by the external tools.
pub const MAX_PROBES_PER_HOP: u8 = 10;

/// How the external tools are invoked.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CommandConfig {
    /// The hop count ceiling.
    pub max_hops: u8,
    /// How long to wait for each probe.
    pub probe_timeout: Duration,
    /// The number of probes sent for each hop.
    pub probes_per_hop: u8,
    /// The destination port for TCP tracing.
    pub tcp_port: u16,
    /// The number of echo requests sent when falling back to `ping`.
    pub ping_count: u16,
    /// Added to the computed tool run time to form the execution deadline.
    pub deadline_margin: Duration,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            max_hops: defaults::DEFAULT_MAX_HOPS,
            probe_timeout: defaults::DEFAULT_PROBE_TIMEOUT,
            probes_per_hop: defaults::DEFAULT_PROBES_PER_HOP,
            tcp_port: defaults::DEFAULT_TCP_PORT,
            ping_count: defaults::DEFAULT_PING_COUNT,
            deadline_margin: defaults::DEFAULT_DEADLINE_MARGIN,
        }
    }
}

impl CommandConfig {
    /// The probe timeout in whole seconds, rounded up and never zero.
    #[must_use]
    pub fn probe_timeout_secs(&self) -> u64 {
        let secs = self.probe_timeout.as_secs();
        let secs = if self.probe_timeout.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        };
        secs.max(1)
    }

    /// The probe timeout in milliseconds, never zero.
    #[must_use]
    pub fn probe_timeout_millis(&self) -> u128 {
        self.probe_timeout.as_millis().max(1)
    }

    /// The deadline for a hop tracing tool.
    ///
    /// Every hop may wait for every probe to time out.
    #[must_use]
    pub fn hop_tracer_deadline(&self) -> Duration {
        let probes = u32::from(self.max_hops) * u32::from(self.probes_per_hop);
        self.probe_timeout.saturating_mul(probes) + self.deadline_margin
    }

    /// The deadline for a reachability probe.
    ///
    /// Echo requests are sent at one second intervals.
    #[must_use]
    pub fn reachability_deadline(&self) -> Duration {
        let per_echo = self.probe_timeout.max(Duration::from_secs(1));
        per_echo.saturating_mul(u32::from(self.ping_count)) + self.deadline_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Duration::from_secs(3), 3)]
    #[test_case(Duration::from_millis(2500), 3; "rounds up")]
    #[test_case(Duration::from_millis(10), 1; "never zero")]
    fn test_probe_timeout_secs(timeout: Duration, expected: u64) {
        let config = CommandConfig {
            probe_timeout: timeout,
            ..CommandConfig::default()
        };
        assert_eq!(expected, config.probe_timeout_secs());
    }

    #[test]
    fn test_deadlines() {
        let config = CommandConfig {
            max_hops: 10,
            probe_timeout: Duration::from_secs(2),
            probes_per_hop: 3,
            ping_count: 4,
            deadline_margin: Duration::from_secs(1),
            ..CommandConfig::default()
        };
        assert_eq!(Duration::from_secs(61), config.hop_tracer_deadline());
        assert_eq!(Duration::from_secs(9), config.reachability_deadline());
    }

    #[test]
    fn test_reachability_deadline_minimum_interval() {
        let config = CommandConfig {
            probe_timeout: Duration::from_millis(200),
            ping_count: 5,
            deadline_margin: Duration::ZERO,
            ..CommandConfig::default()
        };
        assert_eq!(Duration::from_secs(5), config.reachability_deadline());
    }
}

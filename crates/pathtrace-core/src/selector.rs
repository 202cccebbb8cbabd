use crate::config::CommandConfig;
use crate::error::ExecutionError;
use crate::{CommandFamily, Os, ProbeMethod};
use pathtrace_privilege::{Privilege, ELEVATION_NON_INTERACTIVE, ELEVATION_PROGRAM};
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Discover whether an external program is available.
#[cfg_attr(test, mockall::automock)]
pub trait ToolLocator: Send + Sync {
    /// Is `program` present on the search path?
    fn is_available(&self, program: &str) -> bool;
}

/// Locate programs on the `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathToolLocator;

impl ToolLocator for PathToolLocator {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Check the privileges available for raw socket tracing.
#[cfg_attr(test, mockall::automock)]
pub trait CapabilityCheck: Send + Sync {
    fn privilege(&self) -> Privilege;
}

impl CapabilityCheck for Privilege {
    fn privilege(&self) -> Privilege {
        *self
    }
}

/// Discover privileges each time they are needed.
///
/// Discovery may spawn `sudo` and block the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCapability;

impl CapabilityCheck for SystemCapability {
    fn privilege(&self) -> Privilege {
        Privilege::discover().unwrap_or_else(|err| {
            tracing::warn!(?err, "failed to discover privileges");
            Privilege::new(false, false)
        })
    }
}

/// A fully formed external command.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    family: CommandFamily,
    method: ProbeMethod,
    elevated: bool,
    deadline: Duration,
}

impl CommandLine {
    fn new(program: &str, family: CommandFamily, method: ProbeMethod, deadline: Duration) -> Self {
        Self {
            program: program.to_string(),
            args: vec![],
            family,
            method,
            elevated: false,
            deadline,
        }
    }

    fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    fn arg_if(self, condition: bool, arg: impl ToString) -> Self {
        if condition {
            self.arg(arg)
        } else {
            self
        }
    }

    /// Prefix with non-interactive elevation.
    fn elevate(self) -> Self {
        let mut args = vec![ELEVATION_NON_INTERACTIVE.to_string(), self.program];
        args.extend(self.args);
        Self {
            program: ELEVATION_PROGRAM.to_string(),
            args,
            elevated: true,
            ..self
        }
    }

    /// The program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The family of tool this command runs.
    #[must_use]
    pub const fn family(&self) -> CommandFamily {
        self.family
    }

    /// The probe method this command actually uses.
    ///
    /// This may differ from the requested method where the tool does not
    /// support it.
    #[must_use]
    pub const fn method(&self) -> ProbeMethod {
        self.method
    }

    /// Is this command run via non-interactive elevation?
    #[must_use]
    pub const fn elevated(&self) -> bool {
        self.elevated
    }

    /// How long the command may run before it is killed.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl Display for CommandLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// The command to run and the UDP command to fall back to on a privilege failure.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CommandPlan {
    primary: CommandLine,
    fallback: Option<CommandLine>,
}

impl CommandPlan {
    const fn single(primary: CommandLine) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    #[must_use]
    pub const fn primary(&self) -> &CommandLine {
        &self.primary
    }

    #[must_use]
    pub const fn fallback(&self) -> Option<&CommandLine> {
        self.fallback.as_ref()
    }
}

/// Choose the external command for a platform, probe method and privilege level.
#[derive(Clone)]
pub struct CommandSelector {
    os: Os,
    config: CommandConfig,
    tools: Arc<dyn ToolLocator>,
    capability: Arc<dyn CapabilityCheck>,
}

impl CommandSelector {
    #[must_use]
    pub fn new(
        os: Os,
        config: CommandConfig,
        tools: Arc<dyn ToolLocator>,
        capability: Arc<dyn CapabilityCheck>,
    ) -> Self {
        Self {
            os,
            config,
            tools,
            capability,
        }
    }

    /// Select the command to trace to `addr` with `method`.
    ///
    /// Hop tracers are preferred, then `tracepath`, then `ping`.
    #[instrument(skip(self), level = "debug")]
    pub fn select(
        &self,
        addr: IpAddr,
        method: ProbeMethod,
    ) -> Result<CommandPlan, ExecutionError> {
        let hop_tracer = self.hop_tracer_program(addr);
        let plan = if self.tools.is_available(hop_tracer) {
            self.hop_tracer(hop_tracer, addr, method)
        } else if self.os != Os::Windows && self.tools.is_available(TRACEPATH) {
            CommandPlan::single(self.lightweight_tracer(addr))
        } else if self.tools.is_available(self.reachability_program(addr)) {
            CommandPlan::single(self.reachability_probe(addr))
        } else {
            let tried = [
                hop_tracer,
                TRACEPATH,
                self.reachability_program(addr),
            ];
            return Err(ExecutionError::ToolAbsent(tried.join(", ")));
        };
        tracing::debug!(
            command = %plan.primary,
            fallback = ?plan.fallback.as_ref().map(ToString::to_string),
            "selected command"
        );
        Ok(plan)
    }

    fn hop_tracer(&self, program: &str, addr: IpAddr, method: ProbeMethod) -> CommandPlan {
        match self.os {
            Os::Windows => {
                if method != ProbeMethod::Icmp {
                    tracing::debug!(%method, "tracert only supports icmp");
                }
                CommandPlan::single(self.tracert(program, addr))
            }
            Os::MacOs => {
                let method = if addr.is_ipv6() && method == ProbeMethod::Tcp {
                    tracing::debug!("traceroute6 does not support tcp, using udp");
                    ProbeMethod::Udp
                } else {
                    method
                };
                let primary = self.traceroute(program, addr, method);
                CommandPlan {
                    fallback: self.udp_fallback(program, addr, method),
                    primary,
                }
            }
            Os::Linux | Os::OtherUnix => {
                let primary = self.traceroute(program, addr, method);
                let primary = if method.needs_privileges() {
                    let privilege = self.capability.privilege();
                    if privilege.has_privileges() {
                        primary
                    } else if privilege.can_elevate() {
                        tracing::debug!("elevating with non-interactive sudo");
                        primary.elevate()
                    } else {
                        tracing::debug!("insufficient privileges, trying unprivileged");
                        primary
                    }
                } else {
                    primary
                };
                CommandPlan {
                    fallback: self.udp_fallback(program, addr, method),
                    primary,
                }
            }
        }
    }

    fn udp_fallback(&self, program: &str, addr: IpAddr, method: ProbeMethod) -> Option<CommandLine> {
        method
            .needs_privileges()
            .then(|| self.traceroute(program, addr, ProbeMethod::Udp))
    }

    fn traceroute(&self, program: &str, addr: IpAddr, method: ProbeMethod) -> CommandLine {
        let deadline = self.config.hop_tracer_deadline();
        let linux_like = matches!(self.os, Os::Linux | Os::OtherUnix);
        let command = CommandLine::new(program, CommandFamily::HopTracer, method, deadline)
            .arg_if(linux_like && addr.is_ipv6(), "-6")
            .arg("-n")
            .arg("-m")
            .arg(self.config.max_hops)
            .arg("-w")
            .arg(self.config.probe_timeout_secs())
            .arg("-q")
            .arg(self.config.probes_per_hop);
        let command = match (method, linux_like) {
            (ProbeMethod::Tcp, true) => command.arg("-T").arg("-p").arg(self.config.tcp_port),
            (ProbeMethod::Tcp, false) => command
                .arg("-P")
                .arg("tcp")
                .arg("-p")
                .arg(self.config.tcp_port),
            (ProbeMethod::Icmp, _) => command.arg("-I"),
            (ProbeMethod::Udp, _) => command,
        };
        command.arg(addr)
    }

    fn tracert(&self, program: &str, addr: IpAddr) -> CommandLine {
        let deadline = self.config.hop_tracer_deadline();
        CommandLine::new(program, CommandFamily::HopTracer, ProbeMethod::Icmp, deadline)
            .arg("-d")
            .arg("-h")
            .arg(self.config.max_hops)
            .arg("-w")
            .arg(self.config.probe_timeout_millis())
            .arg_if(addr.is_ipv6(), "-6")
            .arg(addr)
    }

    fn lightweight_tracer(&self, addr: IpAddr) -> CommandLine {
        let deadline = self.config.hop_tracer_deadline();
        CommandLine::new(
            TRACEPATH,
            CommandFamily::LightweightTracer,
            ProbeMethod::Udp,
            deadline,
        )
        .arg_if(addr.is_ipv6(), "-6")
        .arg("-n")
        .arg("-m")
        .arg(self.config.max_hops)
        .arg(addr)
    }

    fn reachability_probe(&self, addr: IpAddr) -> CommandLine {
        let deadline = self.config.reachability_deadline();
        let program = self.reachability_program(addr);
        let command = CommandLine::new(
            program,
            CommandFamily::ReachabilityProbe,
            ProbeMethod::Icmp,
            deadline,
        );
        let command = match self.os {
            Os::Windows => command
                .arg("-n")
                .arg(self.config.ping_count)
                .arg("-w")
                .arg(self.config.probe_timeout_millis())
                .arg_if(addr.is_ipv6(), "-6"),
            Os::MacOs if addr.is_ipv6() => command
                .arg("-n")
                .arg("-c")
                .arg(self.config.ping_count),
            Os::MacOs => command
                .arg("-n")
                .arg("-c")
                .arg(self.config.ping_count)
                .arg("-W")
                .arg(self.config.probe_timeout_millis()),
            Os::Linux | Os::OtherUnix => command
                .arg_if(addr.is_ipv6(), "-6")
                .arg("-n")
                .arg("-c")
                .arg(self.config.ping_count)
                .arg("-W")
                .arg(self.config.probe_timeout_secs()),
        };
        command.arg(addr)
    }

    const fn hop_tracer_program(&self, addr: IpAddr) -> &'static str {
        match self.os {
            Os::Windows => TRACERT,
            Os::MacOs if addr.is_ipv6() => TRACEROUTE6,
            _ => TRACEROUTE,
        }
    }

    const fn reachability_program(&self, addr: IpAddr) -> &'static str {
        match self.os {
            Os::MacOs if addr.is_ipv6() => PING6,
            _ => PING,
        }
    }
}

const TRACEROUTE: &str = "traceroute";
const TRACEROUTE6: &str = "traceroute6";
const TRACERT: &str = "tracert";
const TRACEPATH: &str = "tracepath";
const PING: &str = "ping";
const PING6: &str = "ping6";

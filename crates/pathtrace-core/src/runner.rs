use crate::error::ExecutionError;
use crate::selector::{CommandLine, CommandPlan};
use crate::{CommandFamily, ProbeMethod};
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use tracing::instrument;

/// Fragments of `stderr` which indicate the tool lacked the privileges it needed.
const PRIVILEGE_MARKERS: [&str; 5] = [
    "privileges",
    "permission denied",
    "operation not permitted",
    "must be root",
    "a password is required",
];

/// The captured output of a completed process.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RawOutput {
    /// The exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RawOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Execute a command to completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, command: &CommandLine) -> io::Result<RawOutput>;
}

/// Execute commands as child processes.
///
/// The child is killed if the returned future is dropped before it completes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(&self, command: &CommandLine) -> io::Result<RawOutput> {
        let output = tokio::process::Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(RawOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// The output of the command which ran successfully.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExecutionOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// The family of the tool which produced the output.
    pub family: CommandFamily,
    /// The probe method the tool used.
    pub method: ProbeMethod,
    /// Was this the output of the UDP fallback command?
    pub fallback_used: bool,
}

/// Run a [`CommandPlan`], falling back to UDP at most once.
#[derive(Clone)]
pub struct Runner {
    executor: Arc<dyn Executor>,
}

impl Runner {
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Run the primary command of `plan`.
    ///
    /// If the primary command fails because it lacked privileges and it used
    /// TCP or ICMP then the UDP fallback command is run instead. Any other
    /// failure, or a failure of the fallback, is an error.
    #[instrument(skip_all, fields(command = %plan.primary()), level = "debug")]
    pub async fn run(&self, plan: &CommandPlan) -> Result<ExecutionOutcome, ExecutionError> {
        let primary = plan.primary();
        let output = self.attempt(primary).await?;
        if output.success() {
            return Ok(outcome(primary, output, false));
        }
        match plan.fallback() {
            Some(fallback) if primary.method().needs_privileges() && is_privilege_failure(&output) => {
                tracing::warn!(
                    method = %primary.method(),
                    fallback = %fallback,
                    "insufficient privileges, falling back to udp"
                );
                let output = self.attempt(fallback).await?;
                if output.success() {
                    Ok(outcome(fallback, output, true))
                } else {
                    Err(non_zero_exit(fallback, output))
                }
            }
            _ => Err(non_zero_exit(primary, output)),
        }
    }

    async fn attempt(&self, command: &CommandLine) -> Result<RawOutput, ExecutionError> {
        tracing::debug!(%command, deadline = ?command.deadline(), "executing");
        match tokio::time::timeout(command.deadline(), self.executor.execute(command)).await {
            Ok(Ok(output)) => {
                tracing::debug!(exit_code = ?output.exit_code, "completed");
                Ok(output)
            }
            Ok(Err(err)) => Err(ExecutionError::Spawn {
                command: command.to_string(),
                source: err,
            }),
            Err(_) => Err(ExecutionError::Timeout {
                command: command.to_string(),
                deadline: command.deadline(),
            }),
        }
    }
}

fn is_privilege_failure(output: &RawOutput) -> bool {
    let stderr = output.stderr.to_ascii_lowercase();
    PRIVILEGE_MARKERS.iter().any(|marker| stderr.contains(marker))
}

fn outcome(command: &CommandLine, output: RawOutput, fallback_used: bool) -> ExecutionOutcome {
    ExecutionOutcome {
        exit_code: output.exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
        family: command.family(),
        method: command.method(),
        fallback_used,
    }
}

fn non_zero_exit(command: &CommandLine, output: RawOutput) -> ExecutionError {
    ExecutionError::NonZeroExit {
        command: command.to_string(),
        exit_code: output.exit_code,
        stderr: output.stderr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandConfig;
    use crate::selector::{CommandSelector, MockToolLocator};
    use crate::Os;
    use mockall::Sequence;
    use pathtrace_privilege::Privilege;
    use std::net::IpAddr;
    use std::time::Duration;
    use test_case::test_case;

    const ADDR: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(93, 184, 216, 34));

    fn plan(method: ProbeMethod) -> CommandPlan {
        let mut tools = MockToolLocator::new();
        tools.expect_is_available().return_const(true);
        let config = CommandConfig {
            max_hops: 1,
            probes_per_hop: 1,
            probe_timeout: Duration::from_secs(1),
            deadline_margin: Duration::from_secs(1),
            ..CommandConfig::default()
        };
        CommandSelector::new(
            Os::Linux,
            config,
            Arc::new(tools),
            Arc::new(Privilege::new(true, false)),
        )
        .select(ADDR, method)
        .unwrap()
    }

    fn output(exit_code: i32, stdout: &str, stderr: &str) -> RawOutput {
        RawOutput {
            exit_code: Some(exit_code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[tokio::test]
    async fn test_success() -> anyhow::Result<()> {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| Ok(output(0, " 1  10.0.0.1  1.0 ms", "")));
        let outcome = Runner::new(Arc::new(executor)).run(&plan(ProbeMethod::Tcp)).await?;
        assert_eq!(" 1  10.0.0.1  1.0 ms", outcome.stdout);
        assert_eq!(CommandFamily::HopTracer, outcome.family);
        assert_eq!(ProbeMethod::Tcp, outcome.method);
        assert!(!outcome.fallback_used);
        Ok(())
    }

    #[test_case(ProbeMethod::Tcp, "You do not have enough privileges to use this traceroute method.")]
    #[test_case(ProbeMethod::Icmp, "socket: Operation not permitted")]
    #[test_case(ProbeMethod::Tcp, "sudo: a password is required")]
    #[tokio::test]
    async fn test_privilege_failure_falls_back_once(method: ProbeMethod, stderr: &'static str) {
        let mut seq = Sequence::new();
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(move |command| command.method() == method)
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(output(1, "", stderr)));
        executor
            .expect_execute()
            .withf(|command| command.method() == ProbeMethod::Udp)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(output(0, " 1  10.0.0.1  1.0 ms", "")));
        let outcome = Runner::new(Arc::new(executor))
            .run(&plan(method))
            .await
            .unwrap();
        assert!(outcome.fallback_used);
        assert_eq!(ProbeMethod::Udp, outcome.method);
    }

    #[tokio::test]
    async fn test_fallback_failure_is_not_retried() {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .times(2)
            .returning(|_| Ok(output(1, "", "Operation not permitted")));
        let err = Runner::new(Arc::new(executor))
            .run(&plan(ProbeMethod::Tcp))
            .await
            .unwrap_err();
        let ExecutionError::NonZeroExit { command, .. } = err else {
            panic!("expected non-zero exit, got {err:?}");
        };
        assert!(!command.contains("-T"));
    }

    #[tokio::test]
    async fn test_other_failure_not_retried() {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| Ok(output(2, "", "traceroute: unknown host")));
        let err = Runner::new(Arc::new(executor))
            .run(&plan(ProbeMethod::Tcp))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::NonZeroExit { exit_code: Some(2), ref stderr, .. } if stderr == "traceroute: unknown host"
        ));
    }

    #[tokio::test]
    async fn test_udp_privilege_failure_not_retried() {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| Ok(output(1, "", "Operation not permitted")));
        let err = Runner::new(Arc::new(executor))
            .run(&plan(ProbeMethod::Udp))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NonZeroExit { .. }));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_| Err(io::Error::from(io::ErrorKind::NotFound)));
        let err = Runner::new(Arc::new(executor))
            .run(&plan(ProbeMethod::Tcp))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
    }

    struct SlowExecutor;

    #[async_trait]
    impl Executor for SlowExecutor {
        async fn execute(&self, _command: &CommandLine) -> io::Result<RawOutput> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(RawOutput::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let err = Runner::new(Arc::new(SlowExecutor))
            .run(&plan(ProbeMethod::Udp))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Timeout { deadline, .. } if deadline == Duration::from_secs(2)
        ));
    }

    #[test_case("traceroute: socket: Permission denied", true)]
    #[test_case("You must be root to use this option", true)]
    #[test_case("connect: Network is unreachable", false)]
    #[test_case("", false)]
    fn test_is_privilege_failure(stderr: &str, expected: bool) {
        assert_eq!(expected, is_privilege_failure(&output(1, "", stderr)));
    }
}

use std::io;
use std::time::Duration;
use thiserror::Error;

/// A tracer error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A tracer error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid config: {0}")]
    BadConfig(String),
    #[error("failed to resolve {destination}: {source}")]
    Resolution {
        destination: String,
        #[source]
        source: pathtrace_dns::Error,
    },
    #[error("no addresses found for {0}")]
    NoAddresses(String),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Did the destination fail to resolve?
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. } | Self::NoAddresses(_))
    }
}

/// The failure to run an external tool.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("no route tracing tool available (looked for {0})")]
    ToolAbsent(String),
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` did not complete within {}", humanize(.deadline))]
    Timeout { command: String, deadline: Duration },
    #[error("`{command}` failed with {}: {}", exit_status(.exit_code), .stderr.trim())]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

fn exit_status(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => String::from("no exit code"),
    }
}

fn humanize(deadline: &Duration) -> String {
    format!("{:.1}s", deadline.as_secs_f64())
}

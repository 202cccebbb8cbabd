//! pathtrace - trace network paths with the tools the host already has.
//!
//! This crate selects the best available external route tracing tool for the
//! host platform, probe method and privilege level, runs it under a deadline
//! and normalizes its free-form output into an ordered list of hops.
//!
//! The supported tools, in order of preference, are:
//!
//! - `traceroute` (`tracert` on Windows), elevated with `sudo -n` where it is
//!   needed and permitted
//! - `tracepath`
//! - `ping`, which yields a single hop representing the destination
//!
//! TCP and ICMP traces which fail for lack of privileges are retried once in
//! UDP mode.
//!
//! Tool output is parsed by a chain of tiers: a parser specific to the tool
//! which ran, then a generic line scanner and finally a scan for any literal
//! address. Output no tier can interpret is reported as such rather than as
//! an empty path.
//!
//! # Example
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! use pathtrace_core::Builder;
//!
//! let tracer = Builder::new().build()?;
//! let result = tracer.trace("example.com", "icmp").await?;
//! println!("{:?} via {}", result.parse(), result.family());
//! # Ok(())
//! # }
//! ```
//!
//! # See Also
//!
//! - [`Builder`] - Build a [`Tracer`].
//! - [`Tracer::trace`] - Trace the path to a destination.
//! - [`Normalizer`] - Parse tool output directly.
#![forbid(unsafe_code)]

mod builder;
mod config;
mod enrich;
mod error;
mod normalizer;
mod runner;
mod selector;
mod state;
mod tracer;
mod types;

pub use builder::Builder;
pub use config::{defaults, CommandConfig, MAX_PROBES_PER_HOP};
pub use enrich::Enricher;
pub use error::{Error, ExecutionError, Result};
pub use normalizer::{Normalized, Normalizer, ParseFn, ParseOutcome, Tier};
pub use runner::{ExecutionOutcome, Executor, ProcessExecutor, RawOutput, Runner};
pub use selector::{
    CapabilityCheck, CommandLine, CommandPlan, CommandSelector, PathToolLocator, SystemCapability,
    ToolLocator,
};
pub use state::{Hop, TraceResult};
pub use tracer::Tracer;
pub use types::{CommandFamily, Os, ProbeMethod};

#![allow(clippy::struct_excessive_bools, clippy::struct_field_names)]
#![forbid(unsafe_code)]

use crate::config::PathtraceAction;
use clap::Parser;
use config::Args;

mod app;
mod config;
mod print;
mod report;
mod util;

/// Run the pathtrace application.
pub fn pathtrace() -> anyhow::Result<()> {
    let args = Args::parse();
    match PathtraceAction::from(args)? {
        PathtraceAction::Trace(cfg) => app::run_pathtrace(&cfg)?,
        PathtraceAction::PrintConfigTemplate => print::print_config_template(),
        PathtraceAction::PrintManPage => print::print_man_page()?,
        PathtraceAction::PrintShellCompletions(shell) => print::print_shell_completions(shell)?,
    }
    Ok(())
}

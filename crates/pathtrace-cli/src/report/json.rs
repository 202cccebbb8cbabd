use crate::app::TraceInfo;
use crate::report::types::Report;
use std::io::Write;
use tracing::instrument;

/// Generate a json report of trace data.
#[instrument(skip_all, level = "trace")]
pub fn report(info: &TraceInfo, privacy_max_hops: Option<usize>) -> anyhow::Result<()> {
    write(std::io::stdout().lock(), info, privacy_max_hops)
}

fn write<W: Write>(
    mut writer: W,
    info: &TraceInfo,
    privacy_max_hops: Option<usize>,
) -> anyhow::Result<()> {
    let report = Report::new(info, privacy_max_hops);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

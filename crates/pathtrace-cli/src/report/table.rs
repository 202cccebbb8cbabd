use crate::app::TraceInfo;
use crate::report::types;
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL};
use comfy_table::{ContentArrangement, Table};
use tracing::instrument;

/// Generate a Markdown table report of trace data.
#[instrument(skip_all, level = "trace")]
pub fn report_md(info: &TraceInfo, privacy_max_hops: Option<usize>) -> anyhow::Result<()> {
    let table = make_table(info, privacy_max_hops, ASCII_MARKDOWN);
    println!("{}", render(&table, info));
    Ok(())
}

/// Generate a pretty table report of trace data.
#[instrument(skip_all, level = "trace")]
pub fn report_pretty(info: &TraceInfo, privacy_max_hops: Option<usize>) -> anyhow::Result<()> {
    let table = make_table(info, privacy_max_hops, UTF8_FULL);
    println!("{}", render(&table, info));
    Ok(())
}

fn make_table(info: &TraceInfo, privacy_max_hops: Option<usize>, preset: &str) -> Table {
    let columns = vec!["Hop", "IP", "Host", "Rtt", "Location", "Org"];
    let mut table = Table::new();
    table
        .load_preset(preset)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns);
    for hop in types::hops(info, privacy_max_hops) {
        table.add_row(vec![
            hop.hop.to_string(),
            hop.ip(),
            hop.hostname(),
            hop.rtt_ms(),
            hop.location_name(),
            hop.organization_name(),
        ]);
    }
    table
}

fn render(table: &Table, info: &TraceInfo) -> String {
    match super::uninterpretable_note(info) {
        Some(note) => format!("{table}\n{note}"),
        None => table.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{trace_info, trace_info_with};
    use pathtrace_core::ParseOutcome;

    fn render_table(info: &TraceInfo, privacy_max_hops: Option<usize>, preset: &str) -> String {
        let mut table = make_table(info, privacy_max_hops, preset);
        table.force_no_tty();
        render(&table, info)
    }

    #[tokio::test]
    async fn test_markdown() {
        let table = render_table(&trace_info().await, None, ASCII_MARKDOWN);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(6, lines.len());
        assert!(lines[0].contains("Hop"));
        assert!(lines[2].contains("192.168.1.1"));
        assert!(lines[2].contains("1.2"));
        assert!(lines[2].contains("Private Network, Local"));
        assert!(lines[3].contains("198.51.100.7"));
        assert!(lines[3].contains("???"));
        assert!(lines[4].contains('*'));
        assert!(lines[5].contains("Norwell, Massachusetts, US"));
        assert!(lines[5].contains("12.5"));
    }

    #[tokio::test]
    async fn test_privacy() {
        let table = render_table(&trace_info().await, Some(1), ASCII_MARKDOWN);
        assert!(!table.contains("192.168.1.1"));
        assert!(!table.contains("Private Network"));
        assert!(table.contains("[hidden]"));
        assert!(table.contains("198.51.100.7"));
    }

    #[test]
    fn test_uninterpretable() {
        let info = trace_info_with(ParseOutcome::Uninterpretable, vec![]);
        let table = render_table(&info, None, UTF8_FULL);
        assert!(table.ends_with("the tool output could not be interpreted"));
    }

    #[test]
    fn test_no_hops() {
        let info = trace_info_with(ParseOutcome::Structured, vec![]);
        let table = render_table(&info, None, UTF8_FULL);
        assert!(!table.contains("could not be interpreted"));
    }
}

use crate::app::TraceInfo;
use crate::report::types;
use std::io::Write;
use tracing::instrument;

/// Display one line per hop of trace data.
#[instrument(skip_all, level = "trace")]
pub fn report(info: &TraceInfo, privacy_max_hops: Option<usize>) -> anyhow::Result<()> {
    write(std::io::stdout().lock(), info, privacy_max_hops)
}

fn write<W: Write>(
    mut writer: W,
    info: &TraceInfo,
    privacy_max_hops: Option<usize>,
) -> anyhow::Result<()> {
    let result = &info.result;
    writeln!(
        writer,
        "Tracing to {} ({}) with {} via {}{}",
        result.destination(),
        result.addr(),
        result.method(),
        result.family(),
        if result.fallback_used() {
            " (udp fallback)"
        } else {
            ""
        }
    )?;
    for hop in types::hops(info, privacy_max_hops) {
        let index = hop.hop;
        let ip = hop.ip();
        let host = hop.hostname();
        let rtt = hop.rtt_ms();
        let location = hop.location_name();
        let org = hop.organization_name();
        writeln!(
            writer,
            "hop={index} ip={ip} host={host} rtt={rtt} location={location} org={org}"
        )?;
    }
    if let Some(note) = super::uninterpretable_note(info) {
        writeln!(writer, "{note}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{trace_info, trace_info_with};
    use pathtrace_core::ParseOutcome;

    fn render(info: &TraceInfo, privacy_max_hops: Option<usize>) -> String {
        let mut buffer = vec![];
        write(&mut buffer, info, privacy_max_hops).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[tokio::test]
    async fn test_stream() {
        let output = render(&trace_info().await, None);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(5, lines.len());
        assert_eq!(
            "Tracing to example.com (93.184.216.34) with tcp via hop-tracer",
            lines[0]
        );
        assert_eq!(
            "hop=1 ip=192.168.1.1 host=??? rtt=1.2 location=Private Network, Local org=Private Network",
            lines[1]
        );
        assert_eq!(
            "hop=3 ip=* host=* rtt=* location=* org=*",
            lines[3]
        );
    }

    #[test]
    fn test_uninterpretable() {
        let info = trace_info_with(ParseOutcome::Uninterpretable, vec![]);
        let output = render(&info, None);
        assert_eq!(
            "Tracing to example.com (93.184.216.34) with tcp via hop-tracer\nthe tool output could not be interpreted\n",
            output
        );
    }
}

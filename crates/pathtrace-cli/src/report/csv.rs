use crate::app::TraceInfo;
use crate::report::types::{self, fixed_width};
use serde::Serialize;
use std::io::Write;
use std::net::IpAddr;
use tracing::instrument;

/// Generate a CSV report of trace data.
#[instrument(skip_all, level = "trace")]
pub fn report(info: &TraceInfo, privacy_max_hops: Option<usize>) -> anyhow::Result<()> {
    write(std::io::stdout().lock(), info, privacy_max_hops)
}

fn write<W: Write>(
    writer: W,
    info: &TraceInfo,
    privacy_max_hops: Option<usize>,
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for hop in types::hops(info, privacy_max_hops) {
        writer.serialize(CsvRow::new(info, &hop))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
pub struct CsvRow {
    #[serde(rename = "Target")]
    pub target_hostname: String,
    #[serde(rename = "TargetIp")]
    pub target_addr: IpAddr,
    #[serde(rename = "Parse")]
    pub parse: String,
    #[serde(rename = "Hop")]
    pub hop: usize,
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Host")]
    pub host: String,
    #[serde(rename = "Rtt")]
    #[serde(serialize_with = "fixed_width")]
    pub rtt: Option<f64>,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Org")]
    pub organization: String,
    #[serde(rename = "LocationError")]
    pub location_error: String,
}

impl CsvRow {
    fn new(info: &TraceInfo, hop: &types::Hop) -> Self {
        Self {
            target_hostname: info.result.destination().to_string(),
            target_addr: info.result.addr(),
            parse: format!("{:?}", info.result.parse()),
            hop: hop.hop,
            ip: hop.ip(),
            host: hop.hostname(),
            rtt: hop.rtt,
            location: hop.location_name(),
            organization: hop.organization_name(),
            location_error: hop.location_error.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::trace_info;

    async fn render(privacy_max_hops: Option<usize>) -> Vec<String> {
        let mut buffer = vec![];
        write(&mut buffer, &trace_info().await, privacy_max_hops).unwrap();
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_rows() {
        let lines = render(None).await;
        assert_eq!(5, lines.len());
        assert_eq!(
            "Target,TargetIp,Parse,Hop,IP,Host,Rtt,Location,Org,LocationError",
            lines[0]
        );
        assert_eq!(
            "example.com,93.184.216.34,Structured,1,192.168.1.1,???,1.23,\"Private Network, Local\",Private Network,",
            lines[1]
        );
        assert_eq!(
            "example.com,93.184.216.34,Structured,2,198.51.100.7,???,,???,???,no location found for 198.51.100.7",
            lines[2]
        );
        assert_eq!(
            "example.com,93.184.216.34,Structured,3,*,*,,*,*,",
            lines[3]
        );
    }

    #[tokio::test]
    async fn test_privacy() {
        let lines = render(Some(3)).await;
        assert_eq!(
            "example.com,93.184.216.34,Structured,1,0.0.0.0,[hidden],1.23,???,???,",
            lines[1]
        );
        assert_eq!(
            "example.com,93.184.216.34,Structured,2,0.0.0.0,[hidden],,???,???,",
            lines[2]
        );
        assert!(lines[4].contains("93.184.216.34,???,12.50"));
    }
}

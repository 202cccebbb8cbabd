use crate::{Error, Location, Locator, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_with::serde_as;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::instrument;

/// The default `ipinfo.io` API endpoint.
pub const DEFAULT_IPINFO_URL: &str = "https://ipinfo.io";

/// Locate addresses with the `ipinfo.io` HTTP API.
///
/// An API token is optional, requests without one are subject to a lower rate limit.
#[derive(Debug, Clone)]
pub struct IpInfoLocator {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl IpInfoLocator {
    /// Create an `IpInfoLocator` with a per-request `timeout`.
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("pathtrace/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: String::from(DEFAULT_IPINFO_URL),
            token: token.filter(|token| !token.is_empty()),
        })
    }

    /// Use an alternative API endpoint.
    #[must_use]
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..self
        }
    }

    fn url(&self, addr: IpAddr) -> String {
        format!("{}/{addr}/json", self.base_url)
    }
}

#[async_trait]
impl Locator for IpInfoLocator {
    #[instrument(skip(self), level = "debug")]
    async fn locate(&self, addr: IpAddr) -> Result<Location> {
        if let Some(location) = Location::private(addr) {
            return Ok(location);
        }
        let mut request = self.client.get(self.url(addr));
        if let Some(token) = &self.token {
            request = request.query(&[("token", token)]);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%addr, %status, "ipinfo lookup rejected");
            return Err(Error::Status(status.as_u16()));
        }
        let body = response.json::<IpInfoResponse>().await?;
        Ok(Location::from(body))
    }
}

/// The `ipinfo.io` `/{ip}/json` response.
///
/// See <https://ipinfo.io/developers/responses>
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub(crate) struct IpInfoResponse {
    /// "Mountain View"
    #[serde(default)]
    #[serde_as(as = "serde_with::NoneAsEmptyString")]
    pub city: Option<String>,
    /// "California"
    #[serde(default)]
    #[serde_as(as = "serde_with::NoneAsEmptyString")]
    pub region: Option<String>,
    /// "US"
    #[serde(default)]
    #[serde_as(as = "serde_with::NoneAsEmptyString")]
    pub country: Option<String>,
    /// "37.4056,-122.0775"
    #[serde(default)]
    #[serde_as(as = "serde_with::NoneAsEmptyString")]
    pub loc: Option<String>,
    /// "AS15169 Google LLC"
    #[serde(default)]
    #[serde_as(as = "serde_with::NoneAsEmptyString")]
    pub org: Option<String>,
    /// "94043"
    #[serde(default)]
    #[serde_as(as = "serde_with::NoneAsEmptyString")]
    pub postal: Option<String>,
    /// "America/Los_Angeles"
    #[serde(default)]
    #[serde_as(as = "serde_with::NoneAsEmptyString")]
    pub timezone: Option<String>,
    /// Set for reserved and private ranges.
    #[serde(default)]
    pub bogon: bool,
}

impl From<IpInfoResponse> for Location {
    fn from(value: IpInfoResponse) -> Self {
        if value.bogon {
            return Self::private_network();
        }
        let (latitude, longitude) = value.loc.as_deref().map_or((None, None), parse_loc);
        Self {
            city: value.city,
            region: value.region,
            country_code: value.country.clone(),
            country: value.country,
            organization: value.org,
            postal: value.postal,
            timezone: value.timezone,
            latitude,
            longitude,
            is_private: false,
        }
    }
}

/// Parse a `"lat,long"` pair.
fn parse_loc(loc: &str) -> (Option<f64>, Option<f64>) {
    match loc.split_once(',') {
        Some((lat, long)) => (
            f64::from_str(lat.trim()).ok(),
            f64::from_str(long.trim()).ok(),
        ),
        None => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_response() {
        let json = r#"
            {
                "ip": "8.8.8.8",
                "hostname": "dns.google",
                "city": "Mountain View",
                "region": "California",
                "country": "US",
                "loc": "37.4056,-122.0775",
                "org": "AS15169 Google LLC",
                "postal": "94043",
                "timezone": "America/Los_Angeles"
            }
            "#;
        let value: IpInfoResponse = serde_json::from_str(json).unwrap();
        let location = Location::from(value);
        assert_eq!(Some("Mountain View"), location.city.as_deref());
        assert_eq!(Some("California"), location.region.as_deref());
        assert_eq!(Some("US"), location.country_code.as_deref());
        assert_eq!(Some("AS15169 Google LLC"), location.organization.as_deref());
        assert_eq!(Some("94043"), location.postal.as_deref());
        assert_eq!(Some("America/Los_Angeles"), location.timezone.as_deref());
        assert_eq!(Some((37.4056, -122.0775)), location.coordinates());
        assert!(!location.is_private);
    }

    #[test]
    fn test_empty_response() {
        let value: IpInfoResponse = serde_json::from_str(r#"{"city": ""}"#).unwrap();
        let location = Location::from(value);
        assert_eq!(None, location.city);
        assert_eq!(None, location.coordinates());
    }

    #[test]
    fn test_bogon_response() {
        let value: IpInfoResponse =
            serde_json::from_str(r#"{"ip": "100.64.0.1", "bogon": true}"#).unwrap();
        assert_eq!(Location::private_network(), Location::from(value));
    }

    #[test_case("37.4056,-122.0775", (Some(37.4056), Some(-122.0775)); "valid")]
    #[test_case("37.4056, -122.0775", (Some(37.4056), Some(-122.0775)); "whitespace")]
    #[test_case("37.4056", (None, None); "missing longitude")]
    #[test_case("north,south", (None, None); "not numeric")]
    fn test_parse_loc(loc: &str, expected: (Option<f64>, Option<f64>)) {
        assert_eq!(expected, parse_loc(loc));
    }

    #[test]
    fn test_url() -> anyhow::Result<()> {
        let locator = IpInfoLocator::new(Some(String::new()), Duration::from_secs(1))?
            .with_base_url("http://localhost:9/");
        assert_eq!(
            "http://localhost:9/1.1.1.1/json",
            locator.url(IpAddr::from([1, 1, 1, 1]))
        );
        assert!(locator.token.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_private_address_skips_request() -> anyhow::Result<()> {
        let locator = IpInfoLocator::new(None, Duration::from_millis(10))?
            .with_base_url("http://invalid.invalid");
        let location = locator.locate(IpAddr::from([10, 1, 2, 3])).await?;
        assert_eq!(Location::private_network(), location);
        Ok(())
    }
}

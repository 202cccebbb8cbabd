use itertools::Itertools;
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// The geographic location of an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Location {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub organization: Option<String>,
    pub postal: Option<String>,
    pub timezone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_private: bool,
}

impl Location {
    /// The synthetic location used for addresses which are not routable on the public internet.
    #[must_use]
    pub fn private_network() -> Self {
        Self {
            city: Some(String::from("Private Network")),
            region: Some(String::from("Local")),
            country: Some(String::from("Local")),
            organization: Some(String::from("Private Network")),
            is_private: true,
            ..Self::default()
        }
    }

    /// The [`Location::private_network`] if `addr` is private, `None` otherwise.
    #[must_use]
    pub fn private(addr: IpAddr) -> Option<Self> {
        is_private(addr).then(Self::private_network)
    }

    /// The city, region and country code, i.e. `Mountain View, California, US`.
    #[must_use]
    pub fn short_name(&self) -> String {
        [
            self.city.as_ref(),
            self.region.as_ref(),
            self.country_code.as_ref().or(self.country.as_ref()),
        ]
        .into_iter()
        .flatten()
        .dedup()
        .join(", ")
    }

    /// The city, region and country, i.e. `Mountain View, California, United States`.
    #[must_use]
    pub fn long_name(&self) -> String {
        [
            self.city.as_ref(),
            self.region.as_ref(),
            self.country.as_ref(),
        ]
        .into_iter()
        .flatten()
        .dedup()
        .join(", ")
    }

    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(long)) => Some((lat, long)),
            _ => None,
        }
    }
}

/// Is `addr` private, loopback, link-local or otherwise not publicly routable?
#[must_use]
pub fn is_private(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(addr) => is_private_ipv4(addr),
        IpAddr::V6(addr) => is_private_ipv6(addr),
    }
}

fn is_private_ipv4(addr: Ipv4Addr) -> bool {
    let shared = addr.octets()[0] == 100 && (addr.octets()[1] & 0b1100_0000) == 0b0100_0000;
    addr.is_private() || addr.is_loopback() || addr.is_link_local() || addr.is_unspecified() || shared
}

fn is_private_ipv6(addr: Ipv6Addr) -> bool {
    let unique_local = (addr.segments()[0] & 0xfe00) == 0xfc00;
    let link_local = (addr.segments()[0] & 0xffc0) == 0xfe80;
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return is_private_ipv4(mapped);
    }
    addr.is_loopback() || addr.is_unspecified() || unique_local || link_local
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    #[test_case("10.0.0.1", true; "rfc1918 10/8")]
    #[test_case("172.16.4.1", true; "rfc1918 172.16/12")]
    #[test_case("172.31.255.1", true; "rfc1918 upper 172.16/12")]
    #[test_case("192.168.1.1", true; "rfc1918 192.168/16")]
    #[test_case("127.0.0.1", true; "loopback")]
    #[test_case("169.254.10.1", true; "link local")]
    #[test_case("100.64.0.1", true; "shared address space")]
    #[test_case("100.128.0.1", false; "outside shared address space")]
    #[test_case("172.32.0.1", false; "outside 172.16/12")]
    #[test_case("8.8.8.8", false; "public ipv4")]
    #[test_case("::1", true; "ipv6 loopback")]
    #[test_case("fd12:3456::1", true; "ipv6 unique local")]
    #[test_case("fe80::1", true; "ipv6 link local")]
    #[test_case("::ffff:192.168.0.1", true; "ipv4 mapped private")]
    #[test_case("2606:4700::1111", false; "public ipv6")]
    fn test_is_private(addr: &str, expected: bool) {
        assert_eq!(expected, is_private(IpAddr::from_str(addr).unwrap()));
    }

    #[test]
    fn test_private_location() {
        let location = Location::private(IpAddr::from([192, 168, 0, 1])).unwrap();
        assert!(location.is_private);
        assert_eq!(Some("Private Network"), location.city.as_deref());
        assert_eq!(Some("Private Network"), location.organization.as_deref());
        assert_eq!("Private Network, Local", location.long_name());
        assert!(Location::private(IpAddr::from([1, 1, 1, 1])).is_none());
    }

    #[test]
    fn test_names() {
        let location = Location {
            city: Some(String::from("Mountain View")),
            region: Some(String::from("California")),
            country: Some(String::from("United States")),
            country_code: Some(String::from("US")),
            latitude: Some(37.4056),
            longitude: Some(-122.0775),
            ..Location::default()
        };
        assert_eq!("Mountain View, California, US", location.short_name());
        assert_eq!(
            "Mountain View, California, United States",
            location.long_name()
        );
        assert_eq!(Some((37.4056, -122.0775)), location.coordinates());
    }

    #[test]
    fn test_empty_names() {
        let location = Location::default();
        assert_eq!("", location.short_name());
        assert_eq!(None, location.coordinates());
    }
}

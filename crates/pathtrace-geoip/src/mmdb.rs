use crate::{Error, Location, Locator, Result};
use async_trait::async_trait;
use maxminddb::Reader;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

mod ipinfo {
    use serde::Deserialize;
    use serde_with::serde_as;

    /// The `IPinfo` mmdb database format.
    ///
    /// Support both the "IP to Geolocation Extended" and "IP to Country + ASN" database formats.
    ///
    /// IP to Geolocation Extended Database:
    /// See <https://ipinfo.io/developers/ip-to-geolocation-extended/>
    ///
    /// IP to Country + ASN Database;
    /// See <https://ipinfo.io/developers/ip-to-country-asn-database/>
    #[serde_as]
    #[derive(Debug, Deserialize)]
    pub struct IpInfoGeoIp {
        /// "42.48948"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub latitude: Option<String>,
        /// "-83.14465"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub longitude: Option<String>,
        /// "Royal Oak"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub city: Option<String>,
        /// "Michigan"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub region: Option<String>,
        /// "48067"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub postal_code: Option<String>,
        /// "US"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub country: Option<String>,
        /// "Japan"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub country_name: Option<String>,
        /// "Asia/Tokyo"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub timezone: Option<String>,
        /// "Microsoft Corporation"
        #[serde(default)]
        #[serde_as(as = "serde_with::NoneAsEmptyString")]
        pub as_name: Option<String>,
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_empty() {
            let value: IpInfoGeoIp = serde_json::from_str("{}").unwrap();
            assert_eq!(None, value.latitude);
            assert_eq!(None, value.city);
            assert_eq!(None, value.country_name.as_deref());
            assert_eq!(None, value.as_name.as_deref());
        }

        #[test]
        fn test_country_asn_db_format() {
            let json = r#"
                {
                    "start_ip": "40.96.54.192",
                    "end_ip": "40.96.54.255",
                    "country": "JP",
                    "country_name": "Japan",
                    "continent": "AS",
                    "continent_name": "Asia",
                    "asn": "AS8075",
                    "as_name": "Microsoft Corporation",
                    "as_domain": "microsoft.com"
                }
                "#;
            let value: IpInfoGeoIp = serde_json::from_str(json).unwrap();
            assert_eq!(None, value.latitude);
            assert_eq!(None, value.city);
            assert_eq!(Some("JP"), value.country.as_deref());
            assert_eq!(Some("Japan"), value.country_name.as_deref());
            assert_eq!(Some("Microsoft Corporation"), value.as_name.as_deref());
        }

        #[test]
        fn test_extended_db_format() {
            let json = r#"
                {
                    "start_ip": "60.127.10.249",
                    "end_ip": "60.127.10.249",
                    "join_key": "60.127.0.0",
                    "city": "Yokohama",
                    "region": "Kanagawa",
                    "country": "JP",
                    "latitude": "35.43333",
                    "longitude": "139.65",
                    "postal_code": "220-8588",
                    "timezone": "Asia/Tokyo",
                    "geoname_id": "1848354",
                    "radius": "500"
                }
                "#;
            let value: IpInfoGeoIp = serde_json::from_str(json).unwrap();
            assert_eq!(Some("35.43333"), value.latitude.as_deref());
            assert_eq!(Some("139.65"), value.longitude.as_deref());
            assert_eq!(Some("Yokohama"), value.city.as_deref());
            assert_eq!(Some("Kanagawa"), value.region.as_deref());
            assert_eq!(Some("220-8588"), value.postal_code.as_deref());
            assert_eq!(Some("Asia/Tokyo"), value.timezone.as_deref());
            assert_eq!(None, value.country_name.as_deref());
        }
    }
}

impl From<ipinfo::IpInfoGeoIp> for Location {
    fn from(value: ipinfo::IpInfoGeoIp) -> Self {
        Self {
            latitude: value.latitude.and_then(|val| f64::from_str(&val).ok()),
            longitude: value.longitude.and_then(|val| f64::from_str(&val).ok()),
            city: value.city,
            region: value.region,
            country: value.country_name.or_else(|| value.country.clone()),
            country_code: value.country,
            organization: value.as_name,
            postal: value.postal_code,
            timezone: value.timezone,
            is_private: false,
        }
    }
}

impl From<(maxminddb::geoip2::City<'_>, &str)> for Location {
    fn from((value, locale): (maxminddb::geoip2::City<'_>, &str)) -> Self {
        let city = localized_name(&value.city.names, locale);
        let region = value
            .subdivisions
            .first()
            .and_then(|c| localized_name(&c.names, locale));
        let country = localized_name(&value.country.names, locale);
        let country_code = value.country.iso_code.map(ToString::to_string);
        let postal = value.postal.code.map(ToString::to_string);
        let timezone = value.location.time_zone.map(ToString::to_string);
        Self {
            city,
            region,
            country,
            country_code,
            organization: None,
            postal,
            timezone,
            latitude: value.location.latitude,
            longitude: value.location.longitude,
            is_private: false,
        }
    }
}

/// The fallback locale.
///
/// Not every place name is available in each language, `MaxMind` recommend English as the
/// default where a localized name is not available.
pub const FALLBACK_LOCALE: &str = "en";

/// Alias for a cache of mmdb lookups.
type Cache = RwLock<HashMap<IpAddr, Option<Location>>>;

/// Locate addresses from a `MaxMind` or `IPinfo` mmdb database file.
#[derive(Debug)]
pub struct MmdbLocator {
    reader: Reader<Vec<u8>>,
    cache: Cache,
    locale: String,
}

impl MmdbLocator {
    /// Create a new `MmdbLocator` from a mmdb file.
    pub fn from_file<P: AsRef<Path>>(path: P, locale: Option<String>) -> Result<Self> {
        let reader = maxminddb::Reader::open_readfile(path.as_ref())?;
        tracing::debug!(
            path = %path.as_ref().display(),
            database_type = reader.metadata.database_type,
            "opened mmdb"
        );
        Ok(Self {
            reader,
            cache: RwLock::new(HashMap::new()),
            locale: locale.unwrap_or_else(|| FALLBACK_LOCALE.to_string()),
        })
    }

    /// Lookup a `Location` for an `IpAddr`.
    ///
    /// Results, including misses, are cached.
    pub fn lookup(&self, addr: IpAddr) -> Result<Option<Location>> {
        if let Some(location) = Location::private(addr) {
            return Ok(Some(location));
        }
        if let Some(location) = self.cache.read().get(&addr) {
            return Ok(location.clone());
        }
        let lookup_result = self.reader.lookup(addr)?;
        let location = if self.reader.metadata.database_type.starts_with("ipinfo") {
            lookup_result
                .decode::<ipinfo::IpInfoGeoIp>()?
                .map(Location::from)
        } else {
            lookup_result
                .decode::<maxminddb::geoip2::City<'_>>()?
                .map(|city| Location::from((city, self.locale.as_ref())))
        };
        self.cache.write().insert(addr, location.clone());
        Ok(location)
    }
}

#[async_trait]
impl Locator for MmdbLocator {
    async fn locate(&self, addr: IpAddr) -> Result<Location> {
        self.lookup(addr)?.ok_or(Error::NotFound(addr))
    }
}

fn localized_name(names: &maxminddb::geoip2::Names<'_>, locale: &str) -> Option<String> {
    lookup_locale(names, locale)
        .or_else(|| lookup_locale(names, FALLBACK_LOCALE))
        .map(ToString::to_string)
}

/// Map a locale code to the closest `maxminddb` locale field.
///
/// - `pt*` (e.g. `pt`, `pt-BR`, `pt-PT`) use `brazilian_portuguese`
/// - `zh*` (e.g. `zh`, `zh-TW`) use `simplified_chinese`
/// - Other languages that are supported map directly (`en`, `de`, `es`, `fr`, `ja`, `ru`).
fn lookup_locale<'a>(names: &maxminddb::geoip2::Names<'a>, code: &str) -> Option<&'a str> {
    if code.starts_with("pt") {
        names.brazilian_portuguese
    } else if code.starts_with("zh") {
        names.simplified_chinese
    } else {
        match code {
            "de" => names.german,
            "en" => names.english,
            "es" => names.spanish,
            "fr" => names.french,
            "ja" => names.japanese,
            "ru" => names.russian,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipinfo_db_location() {
        let json = r#"
            {
                "city": "Yokohama",
                "region": "Kanagawa",
                "country": "JP",
                "latitude": "35.43333",
                "longitude": "139.65"
            }
            "#;
        let value: ipinfo::IpInfoGeoIp = serde_json::from_str(json).unwrap();
        let location = Location::from(value);
        assert_eq!("Yokohama, Kanagawa, JP", location.short_name());
        assert_eq!(Some("JP"), location.country.as_deref());
        assert_eq!(Some((35.43333, 139.65)), location.coordinates());
    }

    #[test]
    fn test_missing_file() {
        assert!(MmdbLocator::from_file("/nonexistent/GeoLite2-City.mmdb", None).is_err());
    }
}

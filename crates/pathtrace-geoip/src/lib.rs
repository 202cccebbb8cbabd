//! Geolocation lookup of hop addresses.
//!
//! A [`Locator`] turns an [`IpAddr`] into a [`Location`]. Two implementations are provided:
//!
//! - [`IpInfoLocator`] queries the `ipinfo.io` HTTP API
//! - [`MmdbLocator`] reads an offline `MaxMind` or `IPinfo` mmdb database
//!
//! Both implementations short-circuit private, loopback and link-local
//! addresses to a synthetic "Private Network" [`Location`] without performing
//! any lookup.
//!
//! # Example
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! # use std::net::IpAddr;
//! # use std::time::Duration;
//! use pathtrace_geoip::{IpInfoLocator, Locator};
//!
//! let locator = IpInfoLocator::new(None, Duration::from_secs(5))?;
//! let location = locator.locate(IpAddr::from([1, 1, 1, 1])).await?;
//! println!("{}", location.short_name());
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod ipinfo;
mod location;
mod mmdb;

pub use ipinfo::{IpInfoLocator, DEFAULT_IPINFO_URL};
pub use location::{is_private, Location};
pub use mmdb::MmdbLocator;

use async_trait::async_trait;
use std::net::IpAddr;

/// A geolocation error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A geolocation error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("mmdb error: {0}")]
    Mmdb(#[from] maxminddb::MaxMindDbError),
    #[error("no location found for {0}")]
    NotFound(IpAddr),
}

/// Lookup the geographic [`Location`] of an address.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Locate `addr`.
    ///
    /// Private, loopback and link-local addresses resolve to [`Location::private_network`].
    async fn locate(&self, addr: IpAddr) -> Result<Location>;
}

#![allow(
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    clippy::doc_markdown,
    clippy::doc_lazy_continuation
)]
#![doc = include_str!("../README.md")]

// Re-export the user facing libraries, so they may be used from the pathtrace crate directly.

#[cfg(feature = "core")]
/// Select, run and normalize route tracing tools.
pub mod core {
    pub use pathtrace_core::*;
}

#[cfg(feature = "dns")]
/// A blocking DNS resolver.
pub mod dns {
    pub use pathtrace_dns::*;
}

#[cfg(feature = "geoip")]
/// Locate addresses.
pub mod geoip {
    pub use pathtrace_geoip::*;
}

#[cfg(feature = "privilege")]
/// Discover platform privileges.
pub mod privilege {
    pub use pathtrace_privilege::*;
}

//! Discover platform privileges.
//!
//! A cross-platform library to discover the privileges a route tracing tool
//! needs in order to send TCP SYN and ICMP probes via raw sockets.
//!
//! [`Privilege::has_privileges`] (obtained via [`Privilege::discover`]):
//!
//! - On Linux we check if `CAP_NET_RAW` is in the effective set
//! - On other Unix platforms we check that the effective user is root
//! - On Windows this is always `true` as `tracert` does not need elevation
//!
//! [`Privilege::can_elevate`] (obtained via [`Privilege::discover`]):
//!
//! - On Unix platforms we check if `sudo -n true` succeeds, that is if the
//!   current user may elevate without an interactive password prompt
//! - On Windows this is always `false`
//!
//! # Examples
//!
//! Discover the current privileges:
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! # use pathtrace_privilege::Privilege;
//! let privilege = Privilege::discover()?;
//! if privilege.has_privileges() {
//!     println!("You have the required privileges for raw sockets");
//! } else if privilege.can_elevate() {
//!     println!("You may elevate to gain the required privileges");
//! } else {
//!     println!("You do not have the required privileges for raw sockets");
//! }
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

/// A privilege error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A privilege error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(target_os = "linux")]
    #[error("caps error: {0}")]
    CapsError(#[from] caps::errors::CapsError),
}

/// The program used for non-interactive elevation.
pub const ELEVATION_PROGRAM: &str = "sudo";

/// The flag passed to [`ELEVATION_PROGRAM`] to prevent it from prompting.
pub const ELEVATION_NON_INTERACTIVE: &str = "-n";

/// Run-time platform privilege information.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Privilege {
    has_privileges: bool,
    can_elevate: bool,
}

impl Privilege {
    /// Discover information about the platform privileges.
    pub fn discover() -> Result<Self> {
        let has_privileges = Self::check_has_privileges()?;
        let can_elevate = !has_privileges && Self::check_can_elevate();
        tracing::debug!(has_privileges, can_elevate, "discovered privileges");
        Ok(Self {
            has_privileges,
            can_elevate,
        })
    }

    /// Create a new Privilege instance.
    #[must_use]
    pub const fn new(has_privileges: bool, can_elevate: bool) -> Self {
        Self {
            has_privileges,
            can_elevate,
        }
    }

    /// Are we running with the privileges required for raw sockets?
    #[must_use]
    pub const fn has_privileges(&self) -> bool {
        self.has_privileges
    }

    /// Can we elevate to gain the privileges required for raw sockets without prompting?
    #[must_use]
    pub const fn can_elevate(&self) -> bool {
        self.can_elevate
    }

    // Linux

    #[cfg(target_os = "linux")]
    /// Do we have the required privileges?
    ///
    /// Check if `CAP_NET_RAW` is in the effective set.
    fn check_has_privileges() -> Result<bool> {
        Ok(caps::has_cap(
            None,
            caps::CapSet::Effective,
            caps::Capability::CAP_NET_RAW,
        )?)
    }

    // Unix (excl. Linux)

    #[cfg(all(unix, not(target_os = "linux")))]
    #[allow(clippy::unnecessary_wraps)]
    /// Do we have the required privileges?
    ///
    /// Checks if the effective user is root.
    fn check_has_privileges() -> Result<bool> {
        Ok(nix::unistd::Uid::effective().is_root())
    }

    // Unix

    #[cfg(unix)]
    /// Can we elevate without a password prompt?
    ///
    /// Runs `sudo -n true` and checks the exit status, any failure to spawn is treated as `false`.
    fn check_can_elevate() -> bool {
        use std::process::{Command, Stdio};
        Command::new(ELEVATION_PROGRAM)
            .args([ELEVATION_NON_INTERACTIVE, "true"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    // Windows

    #[cfg(windows)]
    #[allow(clippy::unnecessary_wraps)]
    /// Do we have the required privileges?
    ///
    /// `tracert` and `ping` never require elevation on `Windows`.
    fn check_has_privileges() -> Result<bool> {
        Ok(true)
    }

    #[cfg(windows)]
    /// Can we elevate without a password prompt?
    ///
    /// There is no non-interactive elevation on `Windows`.
    const fn check_can_elevate() -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let privilege = Privilege::new(false, true);
        assert!(!privilege.has_privileges());
        assert!(privilege.can_elevate());
    }

    #[test]
    fn test_discover() -> anyhow::Result<()> {
        let privilege = Privilege::discover()?;
        assert!(!(privilege.has_privileges() && privilege.can_elevate()));
        Ok(())
    }
}

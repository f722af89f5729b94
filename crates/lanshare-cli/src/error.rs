//! Error conversion utilities for CLI.
//!
//! Startup failures are turned into `anyhow` errors with a hint on how to
//! fix them.

use anyhow::anyhow;
use lanshare_core::ShareConfig;
use lanshare_core::ShareError;
use std::io;
use std::net::SocketAddr;

/// Converts a configuration error into a user-facing error.
pub fn convert_config_error(err: ShareError, config: &ShareConfig) -> anyhow::Error {
    match err {
        ShareError::NotFound { path } if path == config.root => {
            anyhow!(
                "Cannot share '{}': not a directory\n\
                 HINT: Pass an existing directory as ROOT.",
                path.display()
            )
        }
        ShareError::NotFound { path } => {
            anyhow!(
                "Staging directory '{}' does not exist\n\
                 HINT: Create it first or omit --staging-dir to use the system temp dir.",
                path.display()
            )
        }
        ShareError::InvalidConfig(reason) => {
            anyhow!("Invalid configuration: {reason}")
        }
        _ => anyhow::Error::from(err).context("Invalid configuration"),
    }
}

/// Converts a listener bind failure into a user-facing error.
pub fn convert_bind_error(err: io::Error, addr: SocketAddr) -> anyhow::Error {
    match err.kind() {
        io::ErrorKind::AddrInUse => anyhow!(
            "Cannot listen on {addr}: address already in use\n\
             HINT: Pick another port with --port."
        ),
        io::ErrorKind::PermissionDenied => anyhow!(
            "Cannot listen on {addr}: permission denied\n\
             HINT: Ports below 1024 usually need elevated privileges; try --port 8000."
        ),
        io::ErrorKind::AddrNotAvailable => anyhow!(
            "Cannot listen on {addr}: address not available\n\
             HINT: Use --bind with an address of this machine, or 0.0.0.0 for all interfaces."
        ),
        _ => anyhow::Error::from(err).context(format!("Cannot listen on {addr}")),
    }
}

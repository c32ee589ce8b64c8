// ABOUTME: Server configuration for shelfd, built from CLI arguments.
// ABOUTME: Validates the served root directory before any listener starts.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

use crate::auth::Credentials;

/// Errors that can occur while validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("root directory {0} does not exist")]
    RootMissing(PathBuf),

    #[error("root path {0} is not a directory")]
    RootNotADirectory(PathBuf),
}

/// Immutable server configuration, owned by the lifecycle controller.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub root_dir: PathBuf,
    pub port: u16,
    pub credentials: Option<Credentials>,
}

impl ServerConfig {
    /// Build a configuration, rejecting root paths that do not name an
    /// existing directory. Misconfiguration surfaces here, before binding.
    pub fn new(
        root_dir: PathBuf,
        port: u16,
        credentials: Option<Credentials>,
    ) -> Result<Self, ConfigError> {
        if !root_dir.exists() {
            return Err(ConfigError::RootMissing(root_dir));
        }
        if !root_dir.is_dir() {
            return Err(ConfigError::RootNotADirectory(root_dir));
        }
        Ok(Self {
            root_dir,
            port,
            credentials,
        })
    }

    /// The socket address the listener binds to.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port)
    }
}

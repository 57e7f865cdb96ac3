//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use ragrelay_config::ServerSection;

use crate::error::ServerError;

/// Default max body size for JSON requests (100 KiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 100 * 1024;

/// Default time a relayed stream may sit idle before it is aborted.
pub const DEFAULT_STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Allow any origin, method and header.
    pub cors: bool,

    /// Maximum JSON request body size in bytes.
    pub max_body_size: usize,

    /// Abort a relayed stream when the backend produces nothing for this long.
    pub stream_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 7010),
            cors: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            stream_idle_timeout: DEFAULT_STREAM_IDLE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable permissive CORS.
    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors = enabled;
        self
    }

    /// Set the maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the stream idle timeout.
    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }
}

impl TryFrom<&ServerSection> for ServerConfig {
    type Error = ServerError;

    fn try_from(section: &ServerSection) -> Result<Self, Self::Error> {
        let ip: IpAddr = section.bind.parse().map_err(|e| {
            ServerError::Internal(format!("invalid bind address '{}': {}", section.bind, e))
        })?;

        Ok(Self {
            bind_address: SocketAddr::new(ip, section.port),
            cors: section.cors,
            max_body_size: section.max_body_bytes,
            stream_idle_timeout: Duration::from_secs(section.stream_idle_timeout_secs),
        })
    }
}

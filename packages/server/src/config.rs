//! Server configuration

use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use crate::{
    error::{Result, ServerError},
    infrastructure::repository::inmemory::DEFAULT_HISTORY_CAPACITY,
    usecase::{
        DispatchPolicy,
        dispatcher::{DEFAULT_MAX_SEND_FAILURES, DEFAULT_SEND_TIMEOUT},
    },
};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Server configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Chat port
    pub port: u16,

    /// Number of chat lines replayed to newcomers
    pub history_capacity: usize,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Consecutive failed deliveries before a session is dropped (0 = never)
    pub max_send_failures: u32,

    /// Upper bound for a single line write
    pub send_timeout: Duration,

    /// How long connection handlers get to finish on shutdown
    pub shutdown_grace: Duration,

    /// Port for the read-only admin HTTP API (disabled when None)
    pub admin_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_connections: 0, // Unlimited
            max_send_failures: DEFAULT_MAX_SEND_FAILURES,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            admin_port: None,
        }
    }
}

impl ServerConfig {
    /// Chat listener address, e.g. `0.0.0.0:12345` or `[::1]:12345`
    pub fn bind_addr(&self) -> String {
        host_port(&self.host, self.port)
    }

    /// Admin API address, when enabled
    pub fn admin_bind_addr(&self) -> Option<String> {
        self.admin_port.map(|port| host_port(&self.host, port))
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            send_timeout: self.send_timeout,
            max_send_failures: self.max_send_failures,
        }
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ServerError::InvalidConfig("host must not be empty".into()));
        }
        if self.history_capacity == 0 {
            return Err(ServerError::InvalidConfig(
                "history capacity must be at least 1".into(),
            ));
        }
        if self.send_timeout.is_zero() {
            return Err(ServerError::InvalidConfig(
                "send timeout must be greater than zero".into(),
            ));
        }
        if let Some(admin_port) = self.admin_port
            && admin_port != 0
            && admin_port == self.port
        {
            return Err(ServerError::InvalidConfig(format!(
                "admin port {} collides with the chat port",
                admin_port
            )));
        }
        Ok(())
    }
}

/// IP literals go through `SocketAddr` so IPv6 hosts get brackets; host
/// names are joined as is.
fn host_port(host: &str, port: u16) -> String {
    match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port).to_string(),
        Err(_) => format!("{}:{}", host, port),
    }
}

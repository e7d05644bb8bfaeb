use hush_core::IceServerConfig;
use hush_core::utils::default_ice_servers;
use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 4000;

/// Relay settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Handed to every participant in `IceConfig` right after `Welcome`.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            ice_servers: default_ice_servers(),
        }
    }
}

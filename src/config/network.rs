//! Service configuration.
//!
//! Five environment-driven values per the external interface contract: the
//! two multicast feed groups, the local bind interface, and the REST/WS
//! listen ports.

use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {source}")]
    InvalidValue {
        var: &'static str,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid port for {var}: {source}")]
    InvalidPort {
        var: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Runtime configuration for the ETF service.
///
/// ## Environment Variables
///
/// - `MD_MCAST_IP`: market data multicast group (default: 239.0.0.1)
/// - `CLEARING_MCAST_IP`: clearing multicast group (default: 239.0.0.2)
/// - `MCAST_BIND_IP`: local interface to join groups on (default: 127.0.0.1)
/// - `REST_PORT`: REST API listen port (default: 5000)
/// - `WS_PORT`: WebSocket dashboard listen port (default: 9002)
#[derive(Debug, Clone)]
pub struct Config {
    pub md_mcast_ip: Ipv4Addr,
    pub clearing_mcast_ip: Ipv4Addr,
    pub mcast_bind_ip: Ipv4Addr,
    pub rest_port: u16,
    pub ws_port: u16,
}

const MD_MCAST_PORT: u16 = 12345;
const CLEARING_MCAST_PORT: u16 = 12346;

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// NDFEX defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let md_mcast_ip = parse_ip_env("MD_MCAST_IP", "239.0.0.1")?;
        let clearing_mcast_ip = parse_ip_env("CLEARING_MCAST_IP", "239.0.0.2")?;
        let mcast_bind_ip = parse_ip_env("MCAST_BIND_IP", "127.0.0.1")?;
        let rest_port = parse_port_env("REST_PORT", 5000)?;
        let ws_port = parse_port_env("WS_PORT", 9002)?;

        Ok(Self {
            md_mcast_ip,
            clearing_mcast_ip,
            mcast_bind_ip,
            rest_port,
            ws_port,
        })
    }

    pub fn md_addr(&self) -> std::net::SocketAddrV4 {
        std::net::SocketAddrV4::new(self.md_mcast_ip, MD_MCAST_PORT)
    }

    pub fn clearing_addr(&self) -> std::net::SocketAddrV4 {
        std::net::SocketAddrV4::new(self.clearing_mcast_ip, CLEARING_MCAST_PORT)
    }
}

fn parse_ip_env(var: &'static str, default: &str) -> Result<Ipv4Addr, ConfigError> {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|source| ConfigError::InvalidValue { var, source })
}

fn parse_port_env(var: &'static str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|source| ConfigError::InvalidPort { var, source }),
        Err(_) => Ok(default),
    }
}

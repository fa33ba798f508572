//! Client configuration and CLI parsing (§6).

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use clap::Parser;
use thiserror::Error;

/// Parameters fixed for the lifetime of the client process (§6).
#[derive(Parser, Clone, Debug)]
#[command(name = "bomber-client", about = "Relay between a GUI peer and the server")]
pub struct ClientConfig {
    /// GUI peer address, as "host:port"
    #[arg(short = 'd', long = "gui-address")]
    pub gui_address: SocketSpec,

    /// Name to join the game with
    #[arg(short = 'n', long = "player-name")]
    pub player_name: String,

    /// Local UDP port bound for the GUI receive socket
    #[arg(short = 'p', long = "port")]
    pub port: u16,

    /// Server address, as "host:port"
    #[arg(short = 's', long = "server-address")]
    pub server_address: SocketSpec,
}

/// A parsed `host:port` pair, split at the **last** colon so bracketed and
/// raw IPv6 hosts work the same as IPv4 and DNS names (§6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocketSpec {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum SocketSpecError {
    #[error("missing ':' separator in address {0:?}")]
    NoSeparator(String),
    #[error("invalid port in address {0:?}")]
    InvalidPort(String),
}

impl FromStr for SocketSpec {
    type Err = SocketSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split_at = s
            .rfind(':')
            .ok_or_else(|| SocketSpecError::NoSeparator(s.to_string()))?;
        let (host, port_str) = (&s[..split_at], &s[split_at + 1..]);
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let port = port_str
            .parse()
            .map_err(|_| SocketSpecError::InvalidPort(s.to_string()))?;
        Ok(SocketSpec {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for SocketSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl SocketSpec {
    /// Resolves to a concrete address, preferring IPv6 (with IPv4-mapped
    /// fallback) when a DNS name resolves to both families (§6).
    pub fn resolve(&self) -> std::io::Result<SocketAddr> {
        let mut addrs: Vec<SocketAddr> = (self.host.as_str(), self.port).to_socket_addrs()?.collect();
        addrs.sort_by_key(|addr| if addr.is_ipv6() { 0 } else { 1 });
        addrs.into_iter().next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("could not resolve {self}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_last_colon_for_ipv4() {
        let spec: SocketSpec = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(spec.host, "127.0.0.1");
        assert_eq!(spec.port, 8080);
    }

    #[test]
    fn splits_at_last_colon_for_bracketed_ipv6() {
        let spec: SocketSpec = "[::1]:8080".parse().unwrap();
        assert_eq!(spec.host, "::1");
        assert_eq!(spec.port, 8080);
    }

    #[test]
    fn splits_at_last_colon_for_raw_ipv6() {
        let spec: SocketSpec = "::1:9000".parse().unwrap();
        assert_eq!(spec.host, "::1");
        assert_eq!(spec.port, 9000);
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(matches!(
            "localhost".parse::<SocketSpec>(),
            Err(SocketSpecError::NoSeparator(_))
        ));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        assert!(matches!(
            "localhost:abc".parse::<SocketSpec>(),
            Err(SocketSpecError::InvalidPort(_))
        ));
    }
}

//! Relay configuration.

use std::net::IpAddr;

use crate::error::RelayError;

/// Configuration for one relay run.
///
/// Immutable once constructed; starting again after a stop takes a fresh
/// config. Validation happens here, before any socket is opened.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Local UDP port to listen on.
    pub listen_port: u16,
    /// Upstream resolver; queries are forwarded to its port 53.
    pub upstream: IpAddr,
}

impl RelayConfig {
    /// Validate a listen port and upstream address literal.
    pub fn new(listen_port: u16, upstream: &str) -> Result<Self, RelayError> {
        if listen_port == 0 {
            return Err(RelayError::InvalidPort(listen_port));
        }

        let upstream = upstream
            .parse::<IpAddr>()
            .map_err(|_| RelayError::InvalidUpstream(upstream.to_string()))?;

        Ok(Self {
            listen_port,
            upstream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ipv4_upstream() {
        let config = RelayConfig::new(5353, "8.8.8.8").unwrap();

        assert_eq!(config.listen_port, 5353);
        assert_eq!(config.upstream, "8.8.8.8".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn accepts_ipv6_upstream() {
        let config = RelayConfig::new(53, "2001:4860:4860::8888").unwrap();

        assert!(config.upstream.is_ipv6());
    }

    #[test]
    fn rejects_port_zero() {
        assert!(matches!(
            RelayConfig::new(0, "8.8.8.8"),
            Err(RelayError::InvalidPort(0))
        ));
    }

    #[test]
    fn rejects_non_literal_upstream() {
        assert!(matches!(
            RelayConfig::new(53, "dns.google"),
            Err(RelayError::InvalidUpstream(_))
        ));
        assert!(matches!(
            RelayConfig::new(53, ""),
            Err(RelayError::InvalidUpstream(_))
        ));
    }
}

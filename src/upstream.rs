//! Upstream forwarding.
//!
//! One query, one exchange: each forward binds a fresh ephemeral UDP
//! socket, sends the raw query to the upstream resolver, and waits for a
//! single reply. No connection reuse and no retry; the socket is released
//! when the exchange returns, on success and failure alike.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::debug;

use crate::dns::MAX_PACKET_SIZE;
use crate::error::RelayError;

/// How long to wait for the upstream's reply before failing the query.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Forward one query to `upstream` and return the raw reply bytes.
///
/// The reply is taken as-is: neither its transaction ID nor its sender
/// address is checked against the query.
pub async fn exchange(
    query: &[u8],
    upstream: SocketAddr,
    timeout: Duration,
) -> Result<Vec<u8>, RelayError> {
    let bind_addr: SocketAddr = if upstream.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| RelayError::Forward(format!("failed to bind ephemeral socket: {e}")))?;

    socket
        .send_to(query, upstream)
        .await
        .map_err(|e| RelayError::Forward(format!("failed to send to {upstream}: {e}")))?;

    let mut buf = vec![0u8; MAX_PACKET_SIZE];
    let (len, from) = tokio::time::timeout(timeout, socket.recv_from(&mut buf))
        .await
        .map_err(|_| RelayError::Forward(format!("no reply from {upstream} within {timeout:?}")))?
        .map_err(|e| RelayError::Forward(format!("failed to receive from {upstream}: {e}")))?;

    buf.truncate(len);
    debug!(upstream = %upstream, from = %from, bytes = len, "upstream reply received");

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exchange_returns_the_upstream_reply() {
        let mock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mock_addr = mock.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; MAX_PACKET_SIZE];
            let (len, from) = mock.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..len], b"query bytes");
            mock.send_to(b"reply bytes", from).await.unwrap();
        });

        let reply = exchange(b"query bytes", mock_addr, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(reply, b"reply bytes");
    }

    #[tokio::test]
    async fn exchange_times_out_when_upstream_is_silent() {
        // Bound but never read from, so the query goes nowhere.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let silent_addr = silent.local_addr().unwrap();

        let err = exchange(b"query bytes", silent_addr, Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Forward(_)));
    }
}

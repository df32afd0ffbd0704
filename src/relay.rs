//! Relay engine: the listening loop and its lifecycle.
//!
//! One long-lived task owns the receive side of the listening socket.
//! Every accepted datagram is dispatched to its own task, so a slow
//! upstream never delays the next receive. Stopping takes the socket
//! ownership token out of the session atomically: concurrent or repeated
//! stops release the transport exactly once and never wait on the loop.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::dns::{self, MAX_PACKET_SIZE};
use crate::error::RelayError;
use crate::observer::RelayObserver;
use crate::pending::{PendingQueries, QueryStatus};
use crate::upstream::{self, UPSTREAM_TIMEOUT};

/// Wire port DNS servers answer on.
const DNS_PORT: u16 = 53;

/// Correlation key recorded for datagrams whose question name cannot be
/// decoded.
const MALFORMED_KEY: &str = "<malformed>";

/// State of one relay run.
///
/// The socket slot is the single hand-off point between the running
/// session and a stop request: stop empties it, and handling tasks that
/// still need to reply find it gone.
struct RelaySession {
    socket: ArcSwapOption<UdpSocket>,
    upstream: SocketAddr,
    cancel: CancellationToken,
}

impl RelaySession {
    fn new(socket: Arc<UdpSocket>, upstream: SocketAddr) -> Self {
        Self {
            socket: ArcSwapOption::from(Some(socket)),
            upstream,
            cancel: CancellationToken::new(),
        }
    }

    /// Reply handle, while the session is live.
    fn reply_socket(&self) -> Option<Arc<UdpSocket>> {
        self.socket.load_full()
    }

    fn shutdown(&self) {
        self.socket.store(None);
        self.cancel.cancel();
    }
}

/// Lifecycle controller for the relay.
///
/// At most one session is active at a time; `start` installs it and
/// `stop` removes it. Both are safe to call from any task.
pub struct Relay {
    pending: Arc<PendingQueries>,
    session: ArcSwapOption<RelaySession>,
}

impl Relay {
    pub fn new(observer: Arc<dyn RelayObserver>) -> Self {
        Self {
            pending: Arc::new(PendingQueries::new(observer)),
            session: ArcSwapOption::empty(),
        }
    }

    /// Query log shared with the observer-facing side.
    pub fn pending(&self) -> Arc<PendingQueries> {
        self.pending.clone()
    }

    pub fn is_running(&self) -> bool {
        self.session.load().is_some()
    }

    /// Bind the listening socket and start the receive loop.
    pub async fn start(&self, config: RelayConfig) -> Result<(), RelayError> {
        if self.is_running() {
            return Err(RelayError::AlreadyRunning);
        }

        let listen_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.listen_port));
        let socket = Arc::new(
            UdpSocket::bind(listen_addr)
                .await
                .map_err(RelayError::Startup)?,
        );

        let upstream = SocketAddr::new(config.upstream, DNS_PORT);
        let session = Arc::new(RelaySession::new(socket.clone(), upstream));

        // Install the session. A racing start may have won in the
        // meantime; if so our freshly bound socket is dropped again.
        let prev = self
            .session
            .compare_and_swap(&None::<Arc<RelaySession>>, Some(session.clone()));
        if prev.is_some() {
            return Err(RelayError::AlreadyRunning);
        }

        info!(listen = %listen_addr, upstream = %upstream, "relay listening");
        tokio::spawn(receive_loop(socket, session, self.pending.clone()));

        Ok(())
    }

    /// Stop the relay. Idempotent; never blocks on the receive loop.
    ///
    /// Only the caller that takes the session out of the slot runs the
    /// shutdown, so the transport token is released exactly once no
    /// matter how many stops race.
    pub fn stop(&self) {
        if let Some(session) = self.session.swap(None) {
            session.shutdown();
            info!("relay stopped");
        }
    }
}

/// Accept datagrams until stopped, dispatching each to its own task.
async fn receive_loop(
    socket: Arc<UdpSocket>,
    session: Arc<RelaySession>,
    pending: Arc<PendingQueries>,
) {
    let mut buf = [0u8; MAX_PACKET_SIZE];

    loop {
        let (len, src) = tokio::select! {
            // Stop closed the session; this is the expected exit.
            _ = session.cancel.cancelled() => break,
            result = socket.recv_from(&mut buf) => match result {
                Ok(received) => received,
                Err(e) => {
                    // Best effort: one bad receive must not take the
                    // relay down.
                    warn!(error = %e, "receive error");
                    continue;
                }
            },
        };

        let datagram = buf[..len].to_vec();
        tokio::spawn(handle_datagram(
            session.clone(),
            pending.clone(),
            datagram,
            src,
        ));
    }

    debug!("receive loop exited");
}

/// Handle one accepted datagram: decode, track, forward, report, reply.
///
/// These steps are strictly sequential within a task; across tasks there
/// is no ordering at all, and replies may leave in any order.
async fn handle_datagram(
    session: Arc<RelaySession>,
    pending: Arc<PendingQueries>,
    datagram: Vec<u8>,
    src: SocketAddr,
) {
    let name = match dns::query_name(&datagram) {
        Ok(name) => name,
        Err(e) => {
            // The datagram still shows up in the log, under a placeholder
            // key, before being dropped.
            pending.begin(MALFORMED_KEY);
            pending.resolve(MALFORMED_KEY, QueryStatus::Failed(e.to_string()));
            debug!(client = %src, error = %e, "dropping malformed query");
            return;
        }
    };

    pending.begin(&name);

    let reply = match upstream::exchange(&datagram, session.upstream, UPSTREAM_TIMEOUT).await {
        Ok(reply) => reply,
        Err(e) => {
            pending.resolve(&name, QueryStatus::Failed(e.to_string()));
            warn!(query = %name, error = %e, "forward failed");
            return;
        }
    };

    match dns::first_ipv4_answer(&reply) {
        Ok(answer) => pending.resolve(&name, QueryStatus::Resolved(answer)),
        Err(e) => {
            pending.resolve(&name, QueryStatus::Failed(e.to_string()));
            debug!(query = %name, error = %e, "dropping malformed reply");
            return;
        }
    }

    // The reply goes out on the listening socket so its source port
    // matches the one the client queried.
    match session.reply_socket() {
        Some(socket) => {
            if let Err(e) = socket.send_to(&reply, src).await {
                warn!(client = %src, error = %e, "failed to send reply");
            }
        }
        None => {
            // Stopped while this query was in flight; the reply has
            // nowhere to go.
            debug!(client = %src, "relay stopped before reply could be sent");
        }
    }
}

//! UDP discovery.
//!
//! Servers broadcast an [`Offer`] every [`BROADCAST_INTERVAL`] to
//! [`DISCOVERY_PORT`]; clients listen on that port and connect to the
//! first valid offer they hear.

use log::{debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    io,
    net::{SocketAddr, UdpSocket},
    sync::mpsc::{self, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use super::{
    errors::{Result, SessionError},
    messages::{Offer, WireMessage},
};

pub const DISCOVERY_PORT: u16 = 13122;
pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(1);

/// Larger than any message so oversized datagrams are seen whole and
/// rejected instead of truncated into something valid.
const RECV_BUF_LEN: usize = 1024;

/// Background thread sending the same offer on a fixed interval.
#[derive(Debug)]
pub struct Broadcaster {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Broadcaster {
    /// # Errors
    ///
    /// Returns an error if the sending socket can't be created.
    pub fn spawn(offer: &Offer, target: SocketAddr, interval: Duration) -> io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], 0)))?;
        socket.set_broadcast(true)?;
        let datagram = offer.encode();
        let (stop_tx, stop_rx) = mpsc::channel();
        info!(
            "broadcasting offer for {} (port {}) to {target}",
            offer.service_name, offer.port
        );

        let handle = thread::Builder::new()
            .name("offer-broadcaster".to_string())
            .spawn(move || {
                loop {
                    if let Err(error) = socket.send_to(&datagram, target) {
                        warn!("failed to broadcast offer: {error}");
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("offer broadcaster stopped");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop broadcasting and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The thread may already be gone.
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("offer broadcaster panicked");
            }
        }
    }
}

impl Drop for Broadcaster {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Where an offer says to connect.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rendezvous {
    pub addr: SocketAddr,
    pub service_name: String,
}

/// Bind the discovery port so several listeners on one host can share it.
///
/// # Errors
///
/// Returns an error if the socket can't be created or bound.
pub fn bind_listener(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    if let Err(error) = socket.set_reuse_port(true) {
        warn!("failed to set SO_REUSEPORT: {error}");
    }
    socket.set_broadcast(true)?;
    socket.bind(&SocketAddr::from(([0, 0, 0, 0], port)).into())?;
    Ok(socket.into())
}

/// Wait for the first valid offer on `socket`, skipping anything that
/// doesn't decode.
///
/// # Errors
///
/// Returns [`SessionError::Timeout`] if `timeout` passes with no valid offer,
/// or an I/O error from the socket.
pub fn receive_offer(socket: &UdpSocket, timeout: Option<Duration>) -> Result<Rendezvous> {
    let deadline = timeout.map(|timeout| Instant::now() + timeout);
    let mut buf = [0; RECV_BUF_LEN];
    loop {
        let remaining = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(SessionError::Timeout);
                }
                Some(remaining)
            }
            None => None,
        };
        socket.set_read_timeout(remaining)?;

        let (len, from) = socket.recv_from(&mut buf)?;
        match Offer::decode(&buf[..len]) {
            Ok(offer) => {
                let addr = SocketAddr::new(from.ip(), offer.port);
                info!("received offer from {} ({})", addr, offer.service_name);
                return Ok(Rendezvous {
                    addr,
                    service_name: offer.service_name,
                });
            }
            Err(violation) => debug!("ignoring datagram from {from}: {violation}"),
        }
    }
}

/// Bind `port` and wait for an offer.
///
/// # Errors
///
/// See [`bind_listener`] and [`receive_offer`].
pub fn listen_for_offer(port: u16, timeout: Option<Duration>) -> Result<Rendezvous> {
    let socket = bind_listener(port)?;
    info!("listening for offers on UDP port {port}");
    receive_offer(&socket, timeout)
}

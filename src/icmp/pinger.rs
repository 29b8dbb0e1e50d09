//! Echo request/reply correlation
//!
//! Every request gets a fresh sequence number from a shared counter and is
//! registered in the outstanding-request table before it is sent. One receive
//! loop per socket decodes incoming datagrams and hands each matching reply
//! to the waiting probe through a oneshot channel. Table entries are removed
//! on reply, on timeout and when a probe future is dropped.
//!
//! Destination-unreachable is only reported when the error message itself
//! is delivered, which raw sockets do. Linux datagram ICMP sockets surface
//! such errors as a `recv_from` error that names no request; the receive loop
//! skips it and the affected probe ends as a timeout.

use super::packet::{self, IcmpMessage, MessageKind, PAYLOAD_SIZE};
use super::transport::{IcmpSocket, IcmpTransport};
use super::IpVersion;
use crate::error::{AppError, Result};
use crate::models::{ProbeFailure, ProbeOutcome};
use crate::types::SocketKind;
use rand::Rng;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Large enough for an IPv6 error message quoting a full request
const RECEIVE_BUFFER_SIZE: usize = 2048;

/// Pause after a failed receive before trying again
const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_millis(10);

enum Reply {
    Echo { received_at: Instant },
    Unreachable,
}

struct PendingRequest {
    addr: IpAddr,
    reply: oneshot::Sender<Reply>,
}

struct Shared {
    identifier: u16,
    next_sequence: AtomicU16,
    payload: [u8; PAYLOAD_SIZE],
    pending: Mutex<HashMap<u16, PendingRequest>>,
}

impl Shared {
    fn pending_table(&self) -> MutexGuard<'_, HashMap<u16, PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a decoded message to its waiting probe. Returns whether it matched.
    ///
    /// Linux datagram sockets rewrite the identifier with their own port, so
    /// it is only checked on raw sockets, which see every ICMP message on the
    /// host.
    fn dispatch(
        &self,
        message: IcmpMessage,
        source: IpAddr,
        received_at: Instant,
        check_identifier: bool,
    ) -> bool {
        if check_identifier && message.identifier != self.identifier {
            return false;
        }

        let mut pending = self.pending_table();
        let matches = match pending.get(&message.sequence) {
            Some(request) => match message.kind {
                MessageKind::EchoReply => request.addr == source,
                MessageKind::DestinationUnreachable => message.destination == Some(request.addr),
            },
            None => false,
        };
        if !matches {
            return false;
        }

        if let Some(request) = pending.remove(&message.sequence) {
            let reply = match message.kind {
                MessageKind::EchoReply => Reply::Echo { received_at },
                MessageKind::DestinationUnreachable => Reply::Unreachable,
            };
            // The probe may have timed out in the meantime
            let _ = request.reply.send(reply);
        }
        true
    }
}

/// Removes a table entry when its probe finishes or is dropped
struct PendingGuard<'a> {
    shared: &'a Shared,
    sequence: u16,
}

impl<'a> PendingGuard<'a> {
    fn register(
        shared: &'a Shared,
        sequence: u16,
        addr: IpAddr,
        reply: oneshot::Sender<Reply>,
    ) -> Self {
        shared.pending_table().insert(sequence, PendingRequest { addr, reply });
        Self { shared, sequence }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.shared.pending_table().remove(&self.sequence);
    }
}

/// Sends echo requests over shared sockets and measures round-trip times
pub struct Pinger {
    shared: Arc<Shared>,
    v4: Option<Arc<dyn IcmpTransport>>,
    v6: Option<Arc<dyn IcmpTransport>>,
    /// Why a requested family has no socket
    unavailable: HashMap<IpVersion, ProbeFailure>,
    receivers: Vec<JoinHandle<()>>,
}

impl Pinger {
    /// Open one socket per IP version in `versions`
    ///
    /// A family whose socket cannot be opened stays without a transport and
    /// its addresses fail individually. Fails with
    /// [`AppError::TransportSetup`] only when no requested socket opens.
    pub fn open(kind: SocketKind, versions: &[IpVersion]) -> Result<Self> {
        Self::open_with(kind, versions, |version| {
            IcmpSocket::open(version, kind).map(|socket| Arc::new(socket) as Arc<dyn IcmpTransport>)
        })
    }

    fn open_with<F>(kind: SocketKind, versions: &[IpVersion], mut open_one: F) -> Result<Self>
    where
        F: FnMut(IpVersion) -> io::Result<Arc<dyn IcmpTransport>>,
    {
        let mut v4 = None;
        let mut v6 = None;
        let mut errors = Vec::new();

        for &version in versions {
            match open_one(version) {
                Ok(transport) => match version {
                    IpVersion::V4 => v4 = Some(transport),
                    IpVersion::V6 => v6 = Some(transport),
                },
                Err(error) => errors.push((version, error)),
            }
        }

        if v4.is_none() && v6.is_none() && !errors.is_empty() {
            let details: Vec<String> = errors
                .iter()
                .map(|(version, error)| format!("{}: {}", version, error))
                .collect();
            return Err(AppError::transport_setup(format!(
                "cannot create ICMP socket ({}) - missing privileges? {}",
                kind,
                details.join("; ")
            )));
        }

        let mut pinger = Self::with_transports(v4, v6);
        for (version, error) in errors {
            let failure = match ProbeFailure::from_io(&error) {
                ProbeFailure::PermissionDenied => ProbeFailure::PermissionDenied,
                _ => ProbeFailure::Io(format!("cannot open {} ICMP socket: {}", version, error)),
            };
            pinger.unavailable.insert(version, failure);
        }
        Ok(pinger)
    }

    /// Build a pinger over existing transports and start their receive loops
    pub fn with_transports(
        v4: Option<Arc<dyn IcmpTransport>>,
        v6: Option<Arc<dyn IcmpTransport>>,
    ) -> Self {
        let mut rng = rand::thread_rng();
        let mut payload = [0u8; PAYLOAD_SIZE];
        rng.fill(&mut payload[..]);

        let shared = Arc::new(Shared {
            identifier: rng.gen(),
            next_sequence: AtomicU16::new(rng.gen()),
            payload,
            pending: Mutex::new(HashMap::new()),
        });

        let receivers = [(IpVersion::V4, &v4), (IpVersion::V6, &v6)]
            .into_iter()
            .filter_map(|(version, transport)| {
                transport.as_ref().map(|transport| {
                    tokio::spawn(receive_loop(shared.clone(), transport.clone(), version))
                })
            })
            .collect();

        Self {
            shared,
            v4,
            v6,
            unavailable: HashMap::new(),
            receivers,
        }
    }

    /// Why `version` has no socket, if it was requested and failed to open
    pub fn unavailable(&self, version: IpVersion) -> Option<&ProbeFailure> {
        self.unavailable.get(&version)
    }

    /// Kind of the socket serving `version`, if one is open
    pub fn socket_kind(&self, version: IpVersion) -> Option<SocketKind> {
        self.transport(version).map(|transport| transport.kind())
    }

    /// Number of requests still waiting for a reply
    pub fn outstanding(&self) -> usize {
        self.shared.pending_table().len()
    }

    /// Send one echo request to `addr` and wait up to `timeout` for the reply
    pub async fn ping(&self, addr: IpAddr, timeout: Duration) -> ProbeOutcome {
        let version = IpVersion::of(&addr);
        let transport = match self.transport(version) {
            Some(transport) => transport,
            None => {
                let failure = self.unavailable(version).cloned().unwrap_or_else(|| {
                    ProbeFailure::Io(format!("no {} ICMP socket open", version))
                });
                return ProbeOutcome::failure(failure);
            }
        };

        let shared = &self.shared;
        let sequence = shared.next_sequence.fetch_add(1, Ordering::Relaxed);
        let request =
            match packet::echo_request(version, shared.identifier, sequence, &shared.payload) {
                Some(request) => request,
                None => {
                    let failure = ProbeFailure::Io("cannot encode echo request".to_string());
                    return ProbeOutcome::failure(failure);
                }
            };

        let (reply_tx, reply_rx) = oneshot::channel();
        let _pending = PendingGuard::register(shared, sequence, addr, reply_tx);

        let sent_at = Instant::now();
        if let Err(error) = transport.send_to(&request, addr).await {
            return ProbeOutcome::failure(ProbeFailure::from_io(&error));
        }

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(Reply::Echo { received_at })) => {
                ProbeOutcome::success(received_at.saturating_duration_since(sent_at))
            }
            Ok(Ok(Reply::Unreachable)) => ProbeOutcome::failure(ProbeFailure::Unreachable),
            Ok(Err(_)) => {
                ProbeOutcome::failure(ProbeFailure::Io("receive loop stopped".to_string()))
            }
            Err(_) => ProbeOutcome::failure(ProbeFailure::Timeout),
        }
    }

    fn transport(&self, version: IpVersion) -> Option<&Arc<dyn IcmpTransport>> {
        match version {
            IpVersion::V4 => self.v4.as_ref(),
            IpVersion::V6 => self.v6.as_ref(),
        }
    }
}

impl Drop for Pinger {
    fn drop(&mut self) {
        for receiver in &self.receivers {
            receiver.abort();
        }
    }
}

async fn receive_loop(shared: Arc<Shared>, transport: Arc<dyn IcmpTransport>, version: IpVersion) {
    let check_identifier = transport.kind() == SocketKind::Raw;
    let mut buf = vec![0u8; RECEIVE_BUFFER_SIZE];

    loop {
        match transport.recv_from(&mut buf).await {
            Ok((len, source)) => {
                let received_at = Instant::now();
                let message = buf.get(..len).and_then(|datagram| packet::parse(version, datagram));
                if let Some(message) = message {
                    shared.dispatch(message, source, received_at, check_identifier);
                }
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(_) => tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await,
        }
    }
}

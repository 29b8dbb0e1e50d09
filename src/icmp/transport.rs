//! ICMP sockets
//!
//! A datagram ICMP socket works without privileges where the kernel allows
//! it (`net.ipv4.ping_group_range` on Linux); a raw socket needs
//! `CAP_NET_RAW`. Opening a socket is the capability check: once it
//! succeeds, probing only ever fails per address.

use super::IpVersion;
use crate::types::SocketKind;
use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;

/// Datagram transport shared by every probe of one IP version
#[async_trait]
pub trait IcmpTransport: Send + Sync {
    /// Send one ICMP message to `addr`
    async fn send_to(&self, packet: &[u8], addr: IpAddr) -> io::Result<usize>;

    /// Receive one ICMP message and the address it came from
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)>;

    /// The kind of socket actually opened
    fn kind(&self) -> SocketKind;
}

/// An ICMP socket registered with the tokio reactor
#[derive(Debug)]
pub struct IcmpSocket {
    socket: UdpSocket,
    kind: SocketKind,
}

impl IcmpSocket {
    /// Open a socket of the requested kind
    ///
    /// `Auto` tries a datagram socket first and falls back to a raw one.
    /// Must be called within a tokio runtime.
    pub fn open(version: IpVersion, kind: SocketKind) -> io::Result<Self> {
        match kind {
            SocketKind::Dgram | SocketKind::Raw => Self::open_kind(version, kind),
            SocketKind::Auto => match Self::open_kind(version, SocketKind::Dgram) {
                Ok(socket) => Ok(socket),
                Err(dgram_error) => Self::open_kind(version, SocketKind::Raw).map_err(|raw_error| {
                    io::Error::new(
                        raw_error.kind(),
                        format!("datagram socket: {}; raw socket: {}", dgram_error, raw_error),
                    )
                }),
            },
        }
    }

    fn open_kind(version: IpVersion, kind: SocketKind) -> io::Result<Self> {
        let (domain, protocol) = match version {
            IpVersion::V4 => (Domain::IPV4, Protocol::ICMPV4),
            IpVersion::V6 => (Domain::IPV6, Protocol::ICMPV6),
        };
        let socket_type = match kind {
            SocketKind::Raw => Type::RAW,
            _ => Type::DGRAM,
        };

        let socket = Socket::new(domain, socket_type, Some(protocol))?;
        socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(std::net::UdpSocket::from(socket))?;

        Ok(Self { socket, kind })
    }
}

#[async_trait]
impl IcmpTransport for IcmpSocket {
    async fn send_to(&self, packet: &[u8], addr: IpAddr) -> io::Result<usize> {
        self.socket.send_to(packet, SocketAddr::new(addr, 0)).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, IpAddr)> {
        let (len, source) = self.socket.recv_from(buf).await?;
        Ok((len, source.ip()))
    }

    fn kind(&self) -> SocketKind {
        self.kind
    }
}

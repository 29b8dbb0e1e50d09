//! ICMP echo probing
//!
//! [`packet`] encodes and decodes ICMP messages, [`transport`] owns the
//! sockets and [`pinger`] correlates requests with replies.

pub mod packet;
pub mod pinger;
pub mod transport;

pub use pinger::Pinger;
pub use transport::{IcmpSocket, IcmpTransport};

use crate::models::ProbeTarget;
use std::fmt;
use std::net::IpAddr;

/// IP version of an address, and so of the socket serving it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }

    /// Versions needed to probe `targets`, IPv4 first
    pub fn required_by(targets: &[ProbeTarget]) -> Vec<IpVersion> {
        [IpVersion::V4, IpVersion::V6]
            .into_iter()
            .filter(|version| targets.iter().any(|t| IpVersion::of(&t.addr) == *version))
            .collect()
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

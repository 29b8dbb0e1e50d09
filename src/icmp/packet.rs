//! ICMP echo encoding and reply decoding for IPv4 and IPv6

use super::IpVersion;
use pnet_packet::icmp::echo_reply::EchoReplyPacket;
use pnet_packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet_packet::icmp::{checksum, IcmpCode, IcmpPacket, IcmpTypes};
use pnet_packet::icmpv6::{Icmpv6Code, Icmpv6Packet, Icmpv6Types, MutableIcmpv6Packet};
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::ipv6::Ipv6Packet;
use pnet_packet::Packet;
use std::net::IpAddr;

/// Echo payload length, as sent by the classic `ping`
pub const PAYLOAD_SIZE: usize = 56;

/// Type, code, checksum, identifier and sequence number
const ECHO_HEADER_SIZE: usize = 8;

/// Type, code, checksum and four unused bytes preceding a quoted datagram
const ERROR_HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    EchoReply,
    DestinationUnreachable,
}

/// The parts of a received ICMP message needed to find its request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpMessage {
    pub kind: MessageKind,
    pub identifier: u16,
    pub sequence: u16,
    /// Destination of the quoted request, for error messages
    pub destination: Option<IpAddr>,
}

/// Encode an echo request
///
/// IPv4 requests carry their checksum. The kernel fills in the ICMPv6
/// checksum since it depends on the source address.
pub fn echo_request(version: IpVersion, identifier: u16, sequence: u16, payload: &[u8]) -> Option<Vec<u8>> {
    match version {
        IpVersion::V4 => {
            let buf = vec![0u8; EchoRequestPacket::minimum_packet_size() + payload.len()];
            let mut packet = MutableEchoRequestPacket::owned(buf)?;
            packet.set_icmp_type(IcmpTypes::EchoRequest);
            packet.set_icmp_code(IcmpCode::new(0));
            packet.set_identifier(identifier);
            packet.set_sequence_number(sequence);
            packet.set_payload(payload);
            packet.set_checksum(0);
            let checksum = checksum(&IcmpPacket::new(packet.packet())?);
            packet.set_checksum(checksum);
            Some(packet.packet().to_vec())
        }
        IpVersion::V6 => {
            let mut body = Vec::with_capacity(4 + payload.len());
            body.extend_from_slice(&identifier.to_be_bytes());
            body.extend_from_slice(&sequence.to_be_bytes());
            body.extend_from_slice(payload);

            let buf = vec![0u8; Icmpv6Packet::minimum_packet_size() + body.len()];
            let mut packet = MutableIcmpv6Packet::owned(buf)?;
            packet.set_icmpv6_type(Icmpv6Types::EchoRequest);
            packet.set_icmpv6_code(Icmpv6Code::new(0));
            packet.set_payload(&body);
            Some(packet.packet().to_vec())
        }
    }
}

/// Decode a received datagram
///
/// Returns `None` for anything that is not an echo reply or a
/// destination-unreachable quoting one of our echo requests.
pub fn parse(version: IpVersion, buf: &[u8]) -> Option<IcmpMessage> {
    match version {
        IpVersion::V4 => parse_v4(strip_ipv4_header(buf)?),
        IpVersion::V6 => parse_v6(buf),
    }
}

/// Raw IPv4 sockets deliver the IP header, datagram sockets don't
fn strip_ipv4_header(buf: &[u8]) -> Option<&[u8]> {
    match buf.first() {
        Some(byte) if byte >> 4 == 4 => {
            let header = Ipv4Packet::new(buf)?;
            buf.get(usize::from(header.get_header_length()) * 4..)
        }
        Some(_) => Some(buf),
        None => None,
    }
}

fn parse_v4(icmp: &[u8]) -> Option<IcmpMessage> {
    let icmp_type = IcmpPacket::new(icmp)?.get_icmp_type();

    if icmp_type == IcmpTypes::EchoReply {
        let reply = EchoReplyPacket::new(icmp)?;
        return Some(IcmpMessage {
            kind: MessageKind::EchoReply,
            identifier: reply.get_identifier(),
            sequence: reply.get_sequence_number(),
            destination: None,
        });
    }

    if icmp_type == IcmpTypes::DestinationUnreachable {
        let quoted = icmp.get(ERROR_HEADER_SIZE..)?;
        let header = Ipv4Packet::new(quoted)?;
        let header_len = usize::from(header.get_header_length()) * 4;
        let original = EchoRequestPacket::new(quoted.get(header_len..)?)?;
        if original.get_icmp_type() != IcmpTypes::EchoRequest {
            return None;
        }
        return Some(IcmpMessage {
            kind: MessageKind::DestinationUnreachable,
            identifier: original.get_identifier(),
            sequence: original.get_sequence_number(),
            destination: Some(IpAddr::V4(header.get_destination())),
        });
    }

    None
}

fn parse_v6(icmp: &[u8]) -> Option<IcmpMessage> {
    let icmp_type = Icmpv6Packet::new(icmp)?.get_icmpv6_type();

    if icmp_type == Icmpv6Types::EchoReply {
        let (identifier, sequence) = echo_fields(icmp)?;
        return Some(IcmpMessage {
            kind: MessageKind::EchoReply,
            identifier,
            sequence,
            destination: None,
        });
    }

    if icmp_type == Icmpv6Types::DestinationUnreachable {
        let quoted = icmp.get(ERROR_HEADER_SIZE..)?;
        let header = Ipv6Packet::new(quoted)?;
        let original = quoted.get(Ipv6Packet::minimum_packet_size()..)?;
        if Icmpv6Packet::new(original)?.get_icmpv6_type() != Icmpv6Types::EchoRequest {
            return None;
        }
        let (identifier, sequence) = echo_fields(original)?;
        return Some(IcmpMessage {
            kind: MessageKind::DestinationUnreachable,
            identifier,
            sequence,
            destination: Some(IpAddr::V6(header.get_destination())),
        });
    }

    None
}

fn echo_fields(icmp: &[u8]) -> Option<(u16, u16)> {
    let fields = icmp.get(4..ECHO_HEADER_SIZE)?;
    Some((
        u16::from_be_bytes([fields[0], fields[1]]),
        u16::from_be_bytes([fields[2], fields[3]]),
    ))
}

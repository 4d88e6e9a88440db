//! Route add requests and their routing socket encoding.
//!
//! [`RouteMessage`] mirrors the Darwin `rt_msghdr` followed by the address
//! records named in its presence bitmask. Header fields are native endian.

use thiserror::Error;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::sockaddr::{self, SocketAddress};
use crate::slot::{AddressSlots, Slot};

/// Routing socket protocol version (`RTM_VERSION`).
pub const RTM_VERSION: u8 = 5;
/// `sizeof(struct rt_msghdr)`.
pub const HEADER_LEN: usize = 92;

pub const RTF_UP: u32 = 0x1;
pub const RTF_GATEWAY: u32 = 0x2;
pub const RTF_HOST: u32 = 0x4;
pub const RTF_STATIC: u32 = 0x800;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Destination {destination} and gateway {gateway} belong to different address families")]
    FamilyMismatch { destination: IpAddr, gateway: IpAddr },
    #[error("Sequence number {0} does not fit the message header")]
    SequenceOverflow(u32),
    #[error("Message of {0} bytes exceeds the maximum message length")]
    TooLong(usize),
    #[error("Message truncated: header announces {announced} bytes, {available} available")]
    Truncated { announced: usize, available: usize },
    #[error("Unsupported routing message version {0}")]
    UnsupportedVersion(u8),
    #[error(transparent)]
    Address(#[from] sockaddr::Error),
}

/// Routing message types used by this crate (`RTM_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Add,
    Other(u8),
}

impl From<u8> for MessageType {
    fn from(value: u8) -> Self {
        match value {
            0x1 => MessageType::Add,
            other => MessageType::Other(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        match value {
            MessageType::Add => 0x1,
            MessageType::Other(other) => other,
        }
    }
}

/// Destination and gateway of one host route; both share a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRoute {
    V4 { destination: Ipv4Addr, gateway: Ipv4Addr },
    V6 { destination: Ipv6Addr, gateway: Ipv6Addr },
}

impl HostRoute {
    pub fn destination(&self) -> IpAddr {
        match self {
            HostRoute::V4 { destination, .. } => IpAddr::V4(*destination),
            HostRoute::V6 { destination, .. } => IpAddr::V6(*destination),
        }
    }

    pub fn gateway(&self) -> IpAddr {
        match self {
            HostRoute::V4 { gateway, .. } => IpAddr::V4(*gateway),
            HostRoute::V6 { gateway, .. } => IpAddr::V6(*gateway),
        }
    }
}

impl fmt::Display for HostRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.destination(), self.gateway())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRequest {
    pub seq: u32,
    pub route: HostRoute,
}

impl RouteRequest {
    /// IPv4-mapped IPv6 addresses are treated as IPv4.
    pub fn new(seq: u32, destination: IpAddr, gateway: IpAddr) -> Result<Self, Error> {
        let route = match (destination.to_canonical(), gateway.to_canonical()) {
            (IpAddr::V4(destination), IpAddr::V4(gateway)) => HostRoute::V4 { destination, gateway },
            (IpAddr::V6(destination), IpAddr::V6(gateway)) => HostRoute::V6 { destination, gateway },
            _ => return Err(Error::FamilyMismatch { destination, gateway }),
        };
        Ok(RouteRequest { seq, route })
    }
}

/// A decoded or to-be-encoded `rt_msghdr` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMessage {
    pub kind: MessageType,
    pub version: u8,
    pub index: u16,
    pub flags: u32,
    pub pid: u32,
    pub seq: u32,
    pub addrs: AddressSlots,
}

impl RouteMessage {
    /// Builds the add message for `request`, identified by the issuing `pid`.
    pub fn add(pid: u32, request: &RouteRequest) -> Self {
        let (destination, gateway) = match request.route {
            HostRoute::V4 { destination, gateway } => (SocketAddress::Inet(destination), SocketAddress::Inet(gateway)),
            HostRoute::V6 { destination, gateway } => {
                (SocketAddress::Inet6(destination), SocketAddress::Inet6(gateway))
            }
        };
        RouteMessage {
            kind: MessageType::Add,
            version: RTM_VERSION,
            index: 0,
            flags: RTF_UP | RTF_GATEWAY | RTF_HOST | RTF_STATIC,
            pid,
            seq: request.seq,
            addrs: AddressSlots::default()
                .with(Slot::Destination, destination)
                .with(Slot::Gateway, gateway),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        if i32::try_from(self.seq).is_err() {
            return Err(Error::SequenceOverflow(self.seq));
        }

        let mut buf = vec![0u8; HEADER_LEN];
        self.addrs.encode(&mut buf)?;
        let len = u16::try_from(buf.len()).map_err(|_| Error::TooLong(buf.len()))?;

        buf[0..2].copy_from_slice(&len.to_ne_bytes());
        buf[2] = self.version;
        buf[3] = self.kind.into();
        buf[4..6].copy_from_slice(&self.index.to_ne_bytes());
        buf[8..12].copy_from_slice(&self.flags.to_ne_bytes());
        buf[12..16].copy_from_slice(&self.addrs.mask().to_ne_bytes());
        buf[16..20].copy_from_slice(&self.pid.to_ne_bytes());
        buf[20..24].copy_from_slice(&self.seq.to_ne_bytes());
        Ok(buf)
    }

    pub fn decode(b: &[u8]) -> Result<Self, Error> {
        if b.len() < HEADER_LEN {
            return Err(Error::Truncated {
                announced: HEADER_LEN,
                available: b.len(),
            });
        }
        let len = u16::from_ne_bytes([b[0], b[1]]) as usize;
        if len < HEADER_LEN || len > b.len() {
            return Err(Error::Truncated {
                announced: len,
                available: b.len(),
            });
        }
        let version = b[2];
        if version != RTM_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let mask = u32_at(b, 12);
        Ok(RouteMessage {
            kind: b[3].into(),
            version,
            index: u16::from_ne_bytes([b[4], b[5]]),
            flags: u32_at(b, 8),
            pid: u32_at(b, 16),
            seq: u32_at(b, 20),
            addrs: AddressSlots::decode(mask, &b[HEADER_LEN..len])?,
        })
    }
}

pub(crate) fn u32_at(b: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes([b[offset], b[offset + 1], b[offset + 2], b[offset + 3]])
}

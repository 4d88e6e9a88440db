//! Socket address records as carried inside routing socket messages.
//!
//! Records use the Darwin `sockaddr` layout: a length byte, a family byte and
//! the family specific payload, each record rounded up to [`ALIGN`] bytes.

use thiserror::Error;

use std::net::{Ipv4Addr, Ipv6Addr};

pub const AF_UNSPEC: u8 = 0;
pub const AF_INET: u8 = 2;
pub const AF_LINK: u8 = 18;
pub const AF_INET6: u8 = 30;

pub const SOCKADDR_IN_LEN: usize = 16;
pub const SOCKADDR_IN6_LEN: usize = 28;

/// Record alignment used by the kernel (`sizeof(uint32_t)` on Darwin).
pub const ALIGN: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Address record truncated: needs {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("Address family {0} cannot be encoded")]
    Unencodable(u8),
}

/// Address found in one slot of a routing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketAddress {
    Inet(Ipv4Addr),
    Inet6(Ipv6Addr),
    /// Link level address; only the interface index is kept.
    Link { index: u16 },
    Unknown { family: u8 },
}

impl SocketAddress {
    pub fn family(&self) -> u8 {
        match self {
            SocketAddress::Inet(_) => AF_INET,
            SocketAddress::Inet6(_) => AF_INET6,
            SocketAddress::Link { .. } => AF_LINK,
            SocketAddress::Unknown { family } => *family,
        }
    }

    /// Appends the padded wire record to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        match self {
            SocketAddress::Inet(ip) => {
                let mut record = [0u8; SOCKADDR_IN_LEN];
                record[0] = SOCKADDR_IN_LEN as u8;
                record[1] = AF_INET;
                record[4..8].copy_from_slice(&ip.octets());
                buf.extend_from_slice(&record);
                pad(buf, SOCKADDR_IN_LEN);
                Ok(())
            }
            SocketAddress::Inet6(ip) => {
                let mut record = [0u8; SOCKADDR_IN6_LEN];
                record[0] = SOCKADDR_IN6_LEN as u8;
                record[1] = AF_INET6;
                record[8..24].copy_from_slice(&ip.octets());
                buf.extend_from_slice(&record);
                pad(buf, SOCKADDR_IN6_LEN);
                Ok(())
            }
            other => Err(Error::Unencodable(other.family())),
        }
    }

    /// Decodes the record at the start of `b`.
    ///
    /// Returns the address and the number of bytes the record occupies,
    /// padding included.
    pub fn decode(b: &[u8]) -> Result<(SocketAddress, usize), Error> {
        let Some(&len) = b.first() else {
            return Err(Error::Truncated {
                needed: 1,
                available: 0,
            });
        };
        let len = len as usize;
        let consumed = roundup(len);
        if len == 0 {
            // zero length records are used as filler
            return Ok((SocketAddress::Unknown { family: AF_UNSPEC }, consumed.min(b.len())));
        }
        if b.len() < len {
            return Err(Error::Truncated {
                needed: len,
                available: b.len(),
            });
        }
        let family = if len > 1 { b[1] } else { AF_UNSPEC };
        let addr = match family {
            // netmasks may come in a shortened form, missing bytes are zero
            AF_INET => SocketAddress::Inet(Ipv4Addr::from(payload::<4>(b, len, 4))),
            AF_INET6 => SocketAddress::Inet6(Ipv6Addr::from(payload::<16>(b, len, 8))),
            AF_LINK if len >= 4 => SocketAddress::Link {
                index: u16::from_ne_bytes([b[2], b[3]]),
            },
            family => SocketAddress::Unknown { family },
        };
        Ok((addr, consumed.min(b.len())))
    }
}

/// Rounds a record length up to the kernel alignment; zero takes one slot.
pub fn roundup(len: usize) -> usize {
    if len == 0 {
        return ALIGN;
    }
    (len + ALIGN - 1) & !(ALIGN - 1)
}

fn pad(buf: &mut Vec<u8>, len: usize) {
    buf.resize(buf.len() + roundup(len) - len, 0);
}

fn payload<const N: usize>(b: &[u8], len: usize, offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    if len > offset {
        let end = len.min(offset + N);
        out[..end - offset].copy_from_slice(&b[offset..end]);
    }
    out
}

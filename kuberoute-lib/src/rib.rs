//! Records of the kernel routing information base.
//!
//! [`parse_interface_list`] reads the `NET_RT_IFLIST` sysctl output: a
//! sequence of `if_msghdr` and `ifa_msghdr` messages in the Darwin layout.

use thiserror::Error;

use crate::route_message::{RTM_VERSION, u32_at};
use crate::sockaddr;
use crate::slot::AddressSlots;

pub const RTM_NEWADDR: u8 = 0xc;
pub const RTM_IFINFO: u8 = 0xe;

/// `sizeof(struct ifa_msghdr)`.
const IFA_MSGHDR_LEN: usize = 20;
/// Offset of the interface index in both `if_msghdr` and `ifa_msghdr`.
const INDEX_OFFSET: usize = 12;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Message at offset {offset} announces {announced} bytes, {available} available")]
    Truncated {
        offset: usize,
        announced: usize,
        available: usize,
    },
    #[error("Address records of message at offset {offset}: {source}")]
    Address { offset: usize, source: sockaddr::Error },
}

/// Kernel reported addresses of one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddressRecord {
    pub index: u32,
    pub addrs: AddressSlots,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RibMessage {
    Interface { index: u32 },
    InterfaceAddress(InterfaceAddressRecord),
    Other { kind: u8 },
}

pub fn parse_interface_list(mut b: &[u8]) -> Result<Vec<RibMessage>, Error> {
    let mut messages = Vec::new();
    let mut offset = 0;
    while !b.is_empty() {
        if b.len() < 4 {
            return Err(Error::Truncated {
                offset,
                announced: 4,
                available: b.len(),
            });
        }
        let len = u16::from_ne_bytes([b[0], b[1]]) as usize;
        if len < 4 || len > b.len() {
            return Err(Error::Truncated {
                offset,
                announced: len,
                available: b.len(),
            });
        }
        let (message, rest) = b.split_at(len);

        if message[2] != RTM_VERSION {
            tracing::debug!(offset, version = message[2], "skipping routing message of unknown version");
        } else {
            messages.push(parse_message(message, offset)?);
        }

        b = rest;
        offset += len;
    }
    Ok(messages)
}

fn parse_message(m: &[u8], offset: usize) -> Result<RibMessage, Error> {
    let kind = m[3];
    let truncated = |needed: usize| Error::Truncated {
        offset,
        announced: needed,
        available: m.len(),
    };
    match kind {
        RTM_IFINFO => {
            if m.len() < INDEX_OFFSET + 2 {
                return Err(truncated(INDEX_OFFSET + 2));
            }
            Ok(RibMessage::Interface { index: index_at(m) })
        }
        RTM_NEWADDR => {
            if m.len() < IFA_MSGHDR_LEN {
                return Err(truncated(IFA_MSGHDR_LEN));
            }
            let addrs = AddressSlots::decode(u32_at(m, 4), &m[IFA_MSGHDR_LEN..])
                .map_err(|source| Error::Address { offset, source })?;
            Ok(RibMessage::InterfaceAddress(InterfaceAddressRecord {
                index: index_at(m),
                addrs,
            }))
        }
        kind => Ok(RibMessage::Other { kind }),
    }
}

fn index_at(m: &[u8]) -> u32 {
    u16::from_ne_bytes([m[INDEX_OFFSET], m[INDEX_OFFSET + 1]]) as u32
}

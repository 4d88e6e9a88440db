//! Discovery of the point-to-point tunnel gateway.

use thiserror::Error;

use std::net::IpAddr;

use crate::interface;
use crate::kernel::{self, RoutingKernelPort};
use crate::rib::RibMessage;
use crate::slot::Slot;
use crate::sockaddr::SocketAddress;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Kernel(#[from] kernel::Error),
    #[error("Could not determine gateway ip")]
    NotFound,
}

/// Returns the remote address of the first point-to-point interface that has one.
///
/// Interfaces are examined in kernel enumeration order; with more than one
/// tunnel up the result depends on that order.
#[tracing::instrument(name = "gateway::resolve", level = "debug", skip(port), ret, err)]
pub fn resolve<P: RoutingKernelPort>(port: &P) -> Result<IpAddr, Error> {
    let candidates = interface::point_to_point_candidates(port.interfaces()?);
    for iface in candidates {
        let messages = port.interface_messages(iface.index)?;
        match p2p_destination(iface.index, &messages) {
            Some(gateway) => {
                tracing::info!(interface = %iface.name, %gateway, "found point-to-point gateway");
                return Ok(gateway);
            }
            None => tracing::debug!(interface = %iface.name, "no peer address on interface"),
        }
    }
    Err(Error::NotFound)
}

/// Picks the peer address from the interface address records of `index`.
///
/// An `index` of 0 accepts records of any interface.
pub fn p2p_destination(index: u32, messages: &[RibMessage]) -> Option<IpAddr> {
    messages
        .iter()
        .filter_map(|message| match message {
            RibMessage::InterfaceAddress(record) if index == 0 || record.index == index => Some(record),
            _ => None,
        })
        .filter_map(|record| match record.addrs.get(Slot::Broadcast)? {
            SocketAddress::Inet(ip) => Some(IpAddr::V4(*ip)),
            SocketAddress::Inet6(ip) => Some(IpAddr::V6(*ip)),
            SocketAddress::Link { .. } | SocketAddress::Unknown { .. } => None,
        })
        // all zero means not assigned yet
        .find(|ip| !ip.is_unspecified())
}

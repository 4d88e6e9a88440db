//! Linux port: `getifaddrs` for interface records, `NETLINK_ROUTE` for routes.
//!
//! Linux has no `NET_RT_IFLIST` sysctl, so interface address records are
//! assembled from the `getifaddrs` entries of the requested interface. The
//! point-to-point destination lands in the broadcast slot, as on BSD.

use netlink_sys::{Socket, SocketAddr, protocols::NETLINK_ROUTE};

use std::io;

use crate::interface::NetworkInterface;
use crate::rib::{InterfaceAddressRecord, RibMessage};
use crate::slot::{AddressSlots, Slot};

use super::{Error, RouteSocket, RoutingKernelPort, WireFormat, ifaddrs};

#[derive(Debug, Clone, Default)]
pub struct LinuxKernel;

pub struct NetlinkSocket {
    socket: Socket,
}

impl RouteSocket for NetlinkSocket {
    fn send(&mut self, message: &[u8]) -> io::Result<usize> {
        // port 0 is the kernel
        let kernel = SocketAddr::new(0, 0);
        super::complete_write(self.socket.send_to(message, &kernel, 0)?, message)
    }
}

impl RoutingKernelPort for LinuxKernel {
    type Socket = NetlinkSocket;

    fn wire_format(&self) -> WireFormat {
        WireFormat::Netlink
    }

    fn interfaces(&self) -> Result<Vec<NetworkInterface>, Error> {
        ifaddrs::interfaces()
    }

    fn interface_messages(&self, index: u32) -> Result<Vec<RibMessage>, Error> {
        let mut messages = vec![RibMessage::Interface { index }];
        for (entry_index, ifaddr) in ifaddrs::entries()? {
            if entry_index != index {
                continue;
            }
            let Some(local) = ifaddr.address.as_ref().and_then(ifaddrs::socket_address) else {
                continue;
            };
            let mut addrs = AddressSlots::default().with(Slot::InterfaceAddress, local);
            if let Some(mask) = ifaddr.netmask.as_ref().and_then(ifaddrs::socket_address) {
                addrs.set(Slot::Netmask, mask);
            }
            let peer = ifaddr.destination.as_ref().or(ifaddr.broadcast.as_ref());
            if let Some(peer) = peer.and_then(ifaddrs::socket_address) {
                addrs.set(Slot::Broadcast, peer);
            }
            messages.push(RibMessage::InterfaceAddress(InterfaceAddressRecord { index, addrs }));
        }
        Ok(messages)
    }

    fn open_route_socket(&self) -> Result<Self::Socket, Error> {
        let mut socket = Socket::new(NETLINK_ROUTE)?;
        socket.bind_auto()?;
        tracing::debug!("opened netlink route socket");
        Ok(NetlinkSocket { socket })
    }
}

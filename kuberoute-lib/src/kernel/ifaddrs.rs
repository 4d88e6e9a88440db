//! Interface enumeration through `getifaddrs`.

use ipnetwork::IpNetwork;
use nix::ifaddrs::{self, InterfaceAddress};
use nix::net::if_::{InterfaceFlags as SysFlags, if_nametoindex};
use nix::sys::socket::SockaddrStorage;

use std::net::{IpAddr, SocketAddrV4, SocketAddrV6};

use crate::interface::{InterfaceFlags, NetworkInterface};
use crate::sockaddr::SocketAddress;

use super::Error;

/// Every `getifaddrs` entry paired with the index of its interface.
pub(super) fn entries() -> Result<Vec<(u32, InterfaceAddress)>, Error> {
    let mut indices: Vec<(String, u32)> = Vec::new();
    let mut entries = Vec::new();
    for ifaddr in ifaddrs::getifaddrs()? {
        let index = match indices.iter().find(|(name, _)| *name == ifaddr.interface_name) {
            Some((_, index)) => *index,
            None => {
                let index = if_nametoindex(ifaddr.interface_name.as_str())?;
                indices.push((ifaddr.interface_name.clone(), index));
                index
            }
        };
        entries.push((index, ifaddr));
    }
    Ok(entries)
}

pub(super) fn interfaces() -> Result<Vec<NetworkInterface>, Error> {
    let mut interfaces: Vec<NetworkInterface> = Vec::new();
    for (index, ifaddr) in entries()? {
        let position = match interfaces.iter().position(|iface| iface.index == index) {
            Some(position) => position,
            None => {
                interfaces.push(NetworkInterface {
                    index,
                    name: ifaddr.interface_name.clone(),
                    flags: flags(ifaddr.flags),
                    addresses: Vec::new(),
                });
                interfaces.len() - 1
            }
        };
        if let Some(network) = network(&ifaddr) {
            interfaces[position].addresses.push(network);
        }
    }
    tracing::debug!(count = interfaces.len(), "enumerated network interfaces");
    Ok(interfaces)
}

pub(super) fn socket_address(storage: &SockaddrStorage) -> Option<SocketAddress> {
    if let Some(sin) = storage.as_sockaddr_in() {
        return Some(SocketAddress::Inet(*SocketAddrV4::from(*sin).ip()));
    }
    if let Some(sin6) = storage.as_sockaddr_in6() {
        return Some(SocketAddress::Inet6(*SocketAddrV6::from(*sin6).ip()));
    }
    None
}

fn flags(sys: SysFlags) -> InterfaceFlags {
    InterfaceFlags {
        up: sys.contains(SysFlags::IFF_UP),
        broadcast: sys.contains(SysFlags::IFF_BROADCAST),
        loopback: sys.contains(SysFlags::IFF_LOOPBACK),
        point_to_point: sys.contains(SysFlags::IFF_POINTOPOINT),
        running: sys.contains(SysFlags::IFF_RUNNING),
        multicast: sys.contains(SysFlags::IFF_MULTICAST),
    }
}

fn network(ifaddr: &InterfaceAddress) -> Option<IpNetwork> {
    let ip = match ifaddr.address.as_ref().and_then(socket_address)? {
        SocketAddress::Inet(ip) => IpAddr::V4(ip),
        SocketAddress::Inet6(ip) => IpAddr::V6(ip),
        _ => return None,
    };
    let mask = ifaddr.netmask.as_ref().and_then(socket_address);
    let prefix = match (ip, mask) {
        (IpAddr::V4(_), Some(SocketAddress::Inet(mask))) => u32::from(mask).leading_ones() as u8,
        (IpAddr::V6(_), Some(SocketAddress::Inet6(mask))) => u128::from(mask).leading_ones() as u8,
        (IpAddr::V4(_), _) => 32,
        (IpAddr::V6(_), _) => 128,
    };
    IpNetwork::new(ip, prefix).ok()
}

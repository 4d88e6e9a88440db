//! Local network interfaces and the selection of point-to-point candidates.

use ipnetwork::IpNetwork;

use std::net::IpAddr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceFlags {
    pub up: bool,
    pub broadcast: bool,
    pub loopback: bool,
    pub point_to_point: bool,
    pub running: bool,
    pub multicast: bool,
}

/// Snapshot of one interface taken at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub index: u32,
    pub name: String,
    pub flags: InterfaceFlags,
    pub addresses: Vec<IpNetwork>,
}

/// Keeps interfaces that are up and point-to-point with at least one usable address.
///
/// Link-local unicast addresses are dropped before the address check, the
/// enumeration order is preserved.
pub fn point_to_point_candidates(interfaces: Vec<NetworkInterface>) -> Vec<NetworkInterface> {
    interfaces
        .into_iter()
        .filter(|iface| iface.flags.up && iface.flags.point_to_point)
        .filter_map(|mut iface| {
            iface.addresses.retain(|net| !is_link_local_unicast(net.ip()));
            if iface.addresses.is_empty() {
                tracing::debug!(interface = %iface.name, "ignoring point-to-point interface without usable addresses");
                None
            } else {
                Some(iface)
            }
        })
        .collect()
}

pub fn is_link_local_unicast(ip: IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(ip) => ip.is_link_local(),
        IpAddr::V6(ip) => ip.is_unicast_link_local(),
    }
}

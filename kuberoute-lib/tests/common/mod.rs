#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};

use ipnetwork::IpNetwork;

use kuberoute_lib::interface::{InterfaceFlags, NetworkInterface};
use kuberoute_lib::kernel::{self, RouteSocket, RoutingKernelPort, WireFormat};
use kuberoute_lib::rib::{self, InterfaceAddressRecord, RTM_IFINFO, RTM_NEWADDR, RibMessage};
use kuberoute_lib::route_message::RTM_VERSION;
use kuberoute_lib::slot::{AddressSlots, Slot};
use kuberoute_lib::sockaddr::{self, SocketAddress};

/// `sizeof(struct if_msghdr)` including a zeroed `if_data`.
const IF_MSGHDR_LEN: usize = 112;
const IFA_MSGHDR_LEN: usize = 20;
const INDEX_OFFSET: usize = 12;

/// Serializes records the way the `NET_RT_IFLIST` sysctl returns them.
pub fn encode_interface_list(messages: &[RibMessage]) -> Result<Vec<u8>, sockaddr::Error> {
    let mut buf = Vec::new();
    for message in messages {
        let start = buf.len();
        match message {
            RibMessage::Interface { index } => {
                buf.resize(start + IF_MSGHDR_LEN, 0);
                buf[start + 3] = RTM_IFINFO;
                put_index(&mut buf, start, *index);
            }
            RibMessage::InterfaceAddress(record) => {
                buf.resize(start + IFA_MSGHDR_LEN, 0);
                buf[start + 3] = RTM_NEWADDR;
                buf[start + 4..start + 8].copy_from_slice(&record.addrs.mask().to_ne_bytes());
                put_index(&mut buf, start, record.index);
                record.addrs.encode(&mut buf)?;
            }
            RibMessage::Other { kind } => {
                buf.resize(start + 4, 0);
                buf[start + 3] = *kind;
            }
        }
        let len = (buf.len() - start) as u16;
        buf[start..start + 2].copy_from_slice(&len.to_ne_bytes());
        buf[start + 2] = RTM_VERSION;
    }
    Ok(buf)
}

fn put_index(buf: &mut [u8], start: usize, index: u32) {
    buf[start + INDEX_OFFSET..start + INDEX_OFFSET + 2].copy_from_slice(&(index as u16).to_ne_bytes());
}

/// Kernel double serving interface lists as raw `NET_RT_IFLIST` bytes.
#[derive(Clone, Default)]
pub struct ByteKernel {
    pub interfaces: Vec<NetworkInterface>,
    pub iflist: HashMap<u32, Vec<u8>>,
    pub writes: Arc<Mutex<Vec<Vec<u8>>>>,
    pub sockets_opened: Arc<Mutex<usize>>,
}

impl ByteKernel {
    pub fn with_interface(mut self, iface: NetworkInterface, records: &[RibMessage]) -> anyhow::Result<Self> {
        let bytes = encode_interface_list(records)?;
        self.iflist.insert(iface.index, bytes);
        self.interfaces.push(iface);
        Ok(self)
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn sockets_opened(&self) -> usize {
        *self.sockets_opened.lock().unwrap()
    }
}

pub struct RecordingSocket {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RouteSocket for RecordingSocket {
    fn send(&mut self, message: &[u8]) -> io::Result<usize> {
        self.writes.lock().unwrap().push(message.to_vec());
        Ok(message.len())
    }
}

impl RoutingKernelPort for ByteKernel {
    type Socket = RecordingSocket;

    fn wire_format(&self) -> WireFormat {
        WireFormat::RoutingSocket
    }

    fn interfaces(&self) -> Result<Vec<NetworkInterface>, kernel::Error> {
        Ok(self.interfaces.clone())
    }

    fn interface_messages(&self, index: u32) -> Result<Vec<RibMessage>, kernel::Error> {
        let bytes = self.iflist.get(&index).cloned().unwrap_or_default();
        Ok(rib::parse_interface_list(&bytes)?)
    }

    fn open_route_socket(&self) -> Result<Self::Socket, kernel::Error> {
        *self.sockets_opened.lock().unwrap() += 1;
        Ok(RecordingSocket {
            writes: self.writes.clone(),
        })
    }
}

pub fn interface(index: u32, name: &str, flags: InterfaceFlags, addresses: &[&str]) -> NetworkInterface {
    NetworkInterface {
        index,
        name: name.to_string(),
        flags,
        addresses: addresses
            .iter()
            .map(|a| a.parse::<IpNetwork>().expect("valid network"))
            .collect(),
    }
}

pub fn tunnel_flags() -> InterfaceFlags {
    InterfaceFlags {
        up: true,
        point_to_point: true,
        running: true,
        multicast: true,
        ..Default::default()
    }
}

pub fn ethernet_flags() -> InterfaceFlags {
    InterfaceFlags {
        up: true,
        broadcast: true,
        running: true,
        multicast: true,
        ..Default::default()
    }
}

/// Interface header followed by one address record carrying `local` and `peer`.
pub fn iflist_records(index: u32, local: Ipv4Addr, netmask: Ipv4Addr, peer: Ipv4Addr) -> Vec<RibMessage> {
    vec![
        RibMessage::Interface { index },
        RibMessage::InterfaceAddress(InterfaceAddressRecord {
            index,
            addrs: AddressSlots::default()
                .with(Slot::Netmask, SocketAddress::Inet(netmask))
                .with(Slot::InterfaceAddress, SocketAddress::Inet(local))
                .with(Slot::Broadcast, SocketAddress::Inet(peer)),
        }),
    ]
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid ip")
}

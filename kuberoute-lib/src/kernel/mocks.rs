//! Stateful mock of the routing kernel.
//!
//! Tracks what the code under test did to the kernel (sockets opened,
//! messages written) so tests assert on resulting state instead of call
//! sequences. Shared through `Arc<Mutex<_>>` between the port and its sockets.

#![cfg(test)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use ipnetwork::IpNetwork;

use crate::interface::{InterfaceFlags, NetworkInterface};
use crate::rib::{InterfaceAddressRecord, RibMessage};
use crate::slot::{AddressSlots, Slot};
use crate::sockaddr::SocketAddress;

use super::{Error, RouteSocket, RoutingKernelPort, WireFormat};

#[derive(Debug, Default)]
pub struct KernelState {
    pub interfaces: Vec<NetworkInterface>,
    pub messages: HashMap<u32, Vec<RibMessage>>,
    /// Every message accepted by a socket, in write order.
    pub written: Vec<Vec<u8>>,
    pub sockets_opened: usize,
    pub sockets_open: usize,
    /// Zero based write attempts the socket rejects.
    pub reject_writes: HashSet<usize>,
    pub write_attempts: usize,
    pub queried_indices: Vec<u32>,
    /// Map of operation name -> error message. If set, the operation will fail.
    pub fail_on: HashMap<String, String>,
}

impl KernelState {
    fn check_fail(&self, op: &str) -> Result<(), Error> {
        if let Some(msg) = self.fail_on.get(op) {
            Err(Error::IO(io::Error::other(msg.clone())))
        } else {
            Ok(())
        }
    }
}

#[derive(Clone)]
pub struct MockKernel {
    pub state: Arc<Mutex<KernelState>>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self::with_state(KernelState::default())
    }

    pub fn with_state(state: KernelState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Kernel with a single `tun0` tunnel `10.8.0.2/32` whose peer is `peer`.
    pub fn with_tunnel(peer: Ipv4Addr) -> Self {
        let mut state = KernelState::default();
        state.interfaces.push(tunnel_interface(5, "tun0"));
        state.messages.insert(5, tunnel_messages(5, peer));
        Self::with_state(state)
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().written.clone()
    }
}

pub fn tunnel_interface(index: u32, name: &str) -> NetworkInterface {
    NetworkInterface {
        index,
        name: name.to_string(),
        flags: InterfaceFlags {
            up: true,
            point_to_point: true,
            running: true,
            multicast: true,
            ..InterfaceFlags::default()
        },
        addresses: vec![IpNetwork::new(Ipv4Addr::new(10, 8, 0, 2).into(), 32).unwrap()],
    }
}

pub fn tunnel_messages(index: u32, peer: Ipv4Addr) -> Vec<RibMessage> {
    vec![
        RibMessage::Interface { index },
        RibMessage::InterfaceAddress(InterfaceAddressRecord {
            index,
            addrs: AddressSlots::default()
                .with(Slot::Netmask, SocketAddress::Inet(Ipv4Addr::BROADCAST))
                .with(Slot::InterfaceAddress, SocketAddress::Inet(Ipv4Addr::new(10, 8, 0, 2)))
                .with(Slot::Broadcast, SocketAddress::Inet(peer)),
        }),
    ]
}

pub struct MockSocket {
    state: Arc<Mutex<KernelState>>,
}

impl RouteSocket for MockSocket {
    fn send(&mut self, message: &[u8]) -> io::Result<usize> {
        let mut s = self.state.lock().unwrap();
        let attempt = s.write_attempts;
        s.write_attempts += 1;
        if s.reject_writes.contains(&attempt) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "route already exists"));
        }
        s.written.push(message.to_vec());
        Ok(message.len())
    }
}

impl Drop for MockSocket {
    fn drop(&mut self) {
        self.state.lock().unwrap().sockets_open -= 1;
    }
}

impl RoutingKernelPort for MockKernel {
    type Socket = MockSocket;

    fn wire_format(&self) -> WireFormat {
        WireFormat::RoutingSocket
    }

    fn interfaces(&self) -> Result<Vec<NetworkInterface>, Error> {
        let s = self.state.lock().unwrap();
        s.check_fail("interfaces")?;
        Ok(s.interfaces.clone())
    }

    fn interface_messages(&self, index: u32) -> Result<Vec<RibMessage>, Error> {
        let mut s = self.state.lock().unwrap();
        s.check_fail("interface_messages")?;
        s.queried_indices.push(index);
        Ok(s.messages.get(&index).cloned().unwrap_or_default())
    }

    fn open_route_socket(&self) -> Result<Self::Socket, Error> {
        let mut s = self.state.lock().unwrap();
        s.check_fail("open_route_socket")?;
        s.sockets_opened += 1;
        s.sockets_open += 1;
        Ok(MockSocket {
            state: self.state.clone(),
        })
    }
}

//! Abstraction over the kernel facilities used for gateway discovery and
//! route installation.
//!
//! Defines [`RoutingKernelPort`] so gateway and route logic stays platform
//! neutral. Production code uses one port per target OS:
//! - macOS: [`DarwinKernel`](macos::DarwinKernel) via `NET_RT_IFLIST` sysctl and a `PF_ROUTE` socket
//! - Linux: [`LinuxKernel`](linux::LinuxKernel) via `getifaddrs` and a `NETLINK_ROUTE` socket
//!
//! Tests use a stateful mock (see `mocks` module).

use thiserror::Error;

use std::io;

use crate::interface::NetworkInterface;
#[cfg(target_os = "linux")]
use crate::netlink;
use crate::rib::{self, RibMessage};
use crate::route_message::{self, RouteMessage, RouteRequest};

#[cfg(any(target_os = "linux", target_os = "macos"))]
mod ifaddrs;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(test)]
pub(crate) mod mocks;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
    #[cfg(unix)]
    #[error("System call failed: {0}")]
    Sys(#[from] nix::Error),
    #[error("Malformed routing information: {0}")]
    Rib(#[from] rib::Error),
    #[error("Routing sockets are not supported on this platform")]
    Unsupported,
}

/// Message format understood by the platform's route socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// BSD `PF_ROUTE` messages.
    RoutingSocket,
    /// Linux `NETLINK_ROUTE` messages.
    #[cfg(target_os = "linux")]
    Netlink,
}

impl WireFormat {
    pub fn encode(self, pid: u32, request: &RouteRequest) -> Result<Vec<u8>, route_message::Error> {
        match self {
            WireFormat::RoutingSocket => RouteMessage::add(pid, request).encode(),
            #[cfg(target_os = "linux")]
            WireFormat::Netlink => Ok(netlink::encode_new_route(pid, request)),
        }
    }
}

/// Raw socket accepting route messages; closed when dropped.
pub trait RouteSocket {
    /// Writes one complete message, a short write is an error.
    fn send(&mut self, message: &[u8]) -> io::Result<usize>;
}

pub trait RoutingKernelPort {
    type Socket: RouteSocket;

    fn wire_format(&self) -> WireFormat;

    /// All interfaces in kernel enumeration order, unfiltered.
    fn interfaces(&self) -> Result<Vec<NetworkInterface>, Error>;

    /// Interface list records the kernel reports for `index`.
    fn interface_messages(&self, index: u32) -> Result<Vec<RibMessage>, Error>;

    fn open_route_socket(&self) -> Result<Self::Socket, Error>;
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "macos")] {
        pub type PlatformKernel = macos::DarwinKernel;
    } else if #[cfg(target_os = "linux")] {
        pub type PlatformKernel = linux::LinuxKernel;
    } else {
        pub type PlatformKernel = UnsupportedKernel;
    }
}

/// The port for the running target OS.
pub fn platform() -> PlatformKernel {
    PlatformKernel::default()
}

#[derive(Debug, Clone, Default)]
pub struct UnsupportedKernel;

pub struct NoSocket;

impl RouteSocket for NoSocket {
    fn send(&mut self, _message: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "routing sockets are not supported"))
    }
}

impl RoutingKernelPort for UnsupportedKernel {
    type Socket = NoSocket;

    fn wire_format(&self) -> WireFormat {
        WireFormat::RoutingSocket
    }

    fn interfaces(&self) -> Result<Vec<NetworkInterface>, Error> {
        Err(Error::Unsupported)
    }

    fn interface_messages(&self, _index: u32) -> Result<Vec<RibMessage>, Error> {
        Err(Error::Unsupported)
    }

    fn open_route_socket(&self) -> Result<Self::Socket, Error> {
        Err(Error::Unsupported)
    }
}

/// Turns a short write of `message` into an error.
#[cfg(any(target_os = "linux", target_os = "macos"))]
fn complete_write(written: usize, message: &[u8]) -> io::Result<usize> {
    if written != message.len() {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("short write: {written} of {} bytes", message.len()),
        ));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_socket_format_is_rt_msghdr() -> anyhow::Result<()> {
        let request = RouteRequest::new(1, "34.1.2.3".parse()?, "10.8.0.1".parse()?)?;

        let bsd = WireFormat::RoutingSocket.encode(7, &request)?;
        assert_eq!(bsd[2], route_message::RTM_VERSION);
        assert_eq!(RouteMessage::decode(&bsd)?.pid, 7);
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn netlink_format_is_new_route_request() -> anyhow::Result<()> {
        let request = RouteRequest::new(1, "34.1.2.3".parse()?, "10.8.0.1".parse()?)?;

        let nl = WireFormat::Netlink.encode(7, &request)?;
        assert_eq!(u16::from_ne_bytes([nl[4], nl[5]]), netlink_packet_route::RTM_NEWROUTE);
        assert_eq!(nl, netlink::encode_new_route(7, &request));
        Ok(())
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn short_write_is_an_error() {
        let message = [0u8; 8];
        assert_eq!(complete_write(8, &message).ok(), Some(8));
        let err = complete_write(5, &message).err().map(|e| e.kind());
        assert_eq!(err, Some(io::ErrorKind::WriteZero));
    }

    #[test]
    fn unsupported_kernel_fails_every_query() {
        let kernel = UnsupportedKernel;
        assert!(matches!(kernel.interfaces(), Err(Error::Unsupported)));
        assert!(matches!(kernel.interface_messages(1), Err(Error::Unsupported)));
        assert!(matches!(kernel.open_route_socket(), Err(Error::Unsupported)));
    }
}

//! macOS port: `NET_RT_IFLIST` sysctl for interface records, `PF_ROUTE` for routes.

use nix::sys::socket::{self, AddressFamily, SockFlag, SockType};

use std::fs::File;
use std::io::{self, Write};
use std::ptr;

use crate::interface::NetworkInterface;
use crate::rib::{self, RibMessage};

use super::{Error, RouteSocket, RoutingKernelPort, WireFormat, ifaddrs};

const NET_RT_IFLIST: libc::c_int = 3;
/// The table may grow between sizing and reading it.
const FETCH_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct DarwinKernel;

pub struct RoutingSocket {
    file: File,
}

impl RouteSocket for RoutingSocket {
    fn send(&mut self, message: &[u8]) -> io::Result<usize> {
        super::complete_write(self.file.write(message)?, message)
    }
}

impl RoutingKernelPort for DarwinKernel {
    type Socket = RoutingSocket;

    fn wire_format(&self) -> WireFormat {
        WireFormat::RoutingSocket
    }

    fn interfaces(&self) -> Result<Vec<NetworkInterface>, Error> {
        ifaddrs::interfaces()
    }

    fn interface_messages(&self, index: u32) -> Result<Vec<RibMessage>, Error> {
        let rib = fetch_interface_list(index)?;
        tracing::debug!(index, bytes = rib.len(), "fetched interface list");
        Ok(rib::parse_interface_list(&rib)?)
    }

    fn open_route_socket(&self) -> Result<Self::Socket, Error> {
        let fd = socket::socket(AddressFamily::Route, SockType::Raw, SockFlag::empty(), None)?;
        tracing::debug!("opened routing socket");
        Ok(RoutingSocket { file: File::from(fd) })
    }
}

fn fetch_interface_list(index: u32) -> Result<Vec<u8>, Error> {
    let index = libc::c_int::try_from(index).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    let mut mib = [libc::CTL_NET, libc::PF_ROUTE, 0, libc::AF_UNSPEC, NET_RT_IFLIST, index];

    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut len: libc::size_t = 0;
        // SAFETY: a null old pointer asks the kernel for the required size only.
        let rc = unsafe {
            libc::sysctl(
                mib.as_mut_ptr(),
                mib.len() as libc::c_uint,
                ptr::null_mut(),
                &mut len,
                ptr::null_mut(),
                0,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error().into());
        }

        let mut buf = vec![0u8; len];
        // SAFETY: `buf` is valid for `len` bytes and the kernel writes at most `len`.
        let rc = unsafe {
            libc::sysctl(
                mib.as_mut_ptr(),
                mib.len() as libc::c_uint,
                buf.as_mut_ptr().cast(),
                &mut len,
                ptr::null_mut(),
                0,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ENOMEM) && attempt < FETCH_ATTEMPTS {
                tracing::debug!(attempt, "interface list grew while reading, retrying");
                continue;
            }
            return Err(err.into());
        }
        buf.truncate(len);
        return Ok(buf);
    }
}

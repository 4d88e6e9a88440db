//! Installation of host routes through the kernel route socket.

use thiserror::Error;

use std::net::IpAddr;

use crate::kernel::{self, RouteSocket, RoutingKernelPort, WireFormat};
use crate::route_message::{self, RouteRequest};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Kernel(#[from] kernel::Error),
    #[error("Error building route for {destination}: {source}")]
    Request {
        destination: IpAddr,
        source: route_message::Error,
    },
    #[error("Too many destinations: {0}")]
    TooManyDestinations(usize),
}

/// Outcome of one installation pass.
///
/// Installed means accepted by the kernel write path, not confirmed active.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<IpAddr>,
    pub failed: Vec<IpAddr>,
}

/// Sends one route add message per destination, all via `gateway`.
///
/// Sequence numbers start at 1 in list order and `pid` identifies every
/// message of this pass. A destination that cannot be encoded aborts the
/// remaining ones; a rejected write is logged and the pass continues.
pub fn install<P: RoutingKernelPort>(
    port: &P,
    pid: u32,
    gateway: IpAddr,
    destinations: &[IpAddr],
) -> Result<InstallReport, Error> {
    let mut socket = port.open_route_socket()?;
    let wire_format = port.wire_format();
    let mut report = InstallReport::default();

    for (position, destination) in destinations.iter().enumerate() {
        let destination = *destination;
        let (request, message) = prepare(wire_format, pid, gateway, destinations.len(), position, destination)?;

        tracing::info!(seq = request.seq, "routing {} through {}", destination, gateway);
        match socket.send(&message) {
            Ok(_) => report.installed.push(destination),
            Err(err) => {
                tracing::error!(%destination, error = %err, "error adding route");
                report.failed.push(destination);
            }
        }
    }

    tracing::debug!(
        installed = report.installed.len(),
        failed = report.failed.len(),
        "route installation pass finished"
    );
    Ok(report)
}

/// Encodes every message [`install`] would send without opening a socket.
///
/// Fails on the same destination a real pass would abort on.
pub fn preview<P: RoutingKernelPort>(
    port: &P,
    pid: u32,
    gateway: IpAddr,
    destinations: &[IpAddr],
) -> Result<Vec<RouteRequest>, Error> {
    let wire_format = port.wire_format();
    destinations
        .iter()
        .enumerate()
        .map(|(position, destination)| {
            prepare(wire_format, pid, gateway, destinations.len(), position, *destination).map(|(request, _)| request)
        })
        .collect()
}

fn prepare(
    wire_format: WireFormat,
    pid: u32,
    gateway: IpAddr,
    count: usize,
    position: usize,
    destination: IpAddr,
) -> Result<(RouteRequest, Vec<u8>), Error> {
    let seq = u32::try_from(position + 1).map_err(|_| Error::TooManyDestinations(count))?;
    RouteRequest::new(seq, destination, gateway)
        .and_then(|request| wire_format.encode(pid, &request).map(|message| (request, message)))
        .map_err(|source| Error::Request { destination, source })
}

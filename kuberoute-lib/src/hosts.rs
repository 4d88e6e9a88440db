//! Resolution of host strings into the destination addresses to route.

use thiserror::Error;
use url::{Host, Url};

use std::io;
use std::net::{IpAddr, ToSocketAddrs};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid host {host}: {source}")]
    InvalidHost { host: String, source: url::ParseError },
    #[error("No host in {0}")]
    NoHost(String),
    #[error("Error looking up {host}: {source}")]
    Lookup { host: String, source: io::Error },
}

pub trait HostResolver {
    fn lookup(&self, hostname: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the system resolver (`getaddrinfo`).
#[derive(Debug, Clone, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn lookup(&self, hostname: &str) -> io::Result<Vec<IpAddr>> {
        Ok((hostname, 0).to_socket_addrs()?.map(|addr| addr.ip()).collect())
    }
}

/// Resolves every host to its addresses, deduplicated in first-seen order.
///
/// Hosts may be bare names, `host:port` or full URLs.
pub fn host_addrs<R: HostResolver>(resolver: &R, hosts: &[String]) -> Result<Vec<IpAddr>, Error> {
    let mut addrs = Vec::new();
    for host in hosts {
        for addr in lookup_host(resolver, host)? {
            if !addrs.contains(&addr) {
                addrs.push(addr);
            }
        }
    }
    Ok(addrs)
}

fn lookup_host<R: HostResolver>(resolver: &R, host: &str) -> Result<Vec<IpAddr>, Error> {
    let url = if host.contains("://") {
        Url::parse(host)
    } else {
        Url::parse(&format!("http://{host}"))
    }
    .map_err(|source| Error::InvalidHost {
        host: host.to_string(),
        source,
    })?;

    match url.host() {
        Some(Host::Ipv4(ip)) => Ok(vec![IpAddr::V4(ip)]),
        Some(Host::Ipv6(ip)) => Ok(vec![IpAddr::V6(ip)]),
        Some(Host::Domain(domain)) if !domain.is_empty() => {
            let addrs = resolver.lookup(domain).map_err(|source| Error::Lookup {
                host: host.to_string(),
                source,
            })?;
            tracing::debug!(%host, count = addrs.len(), "resolved host");
            Ok(addrs)
        }
        _ => Err(Error::NoHost(host.to_string())),
    }
}

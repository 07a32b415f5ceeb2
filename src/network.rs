// src/network.rs
// Port allocation and address resolution

use local_ip_address::{list_afinet_netifas, local_ip};
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener, ToSocketAddrs};

/// Failure to obtain a listening socket. Only `PortUnavailable` depends on
/// the port-switching flag; the other variants always abort startup.
#[derive(Debug)]
pub enum BindError {
    UnknownHost(String),
    PortUnavailable(u16),
    Bind(io::Error),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::UnknownHost(host) => write!(f, "Cannot resolve host: {}", host),
            BindError::PortUnavailable(port) => write!(
                f,
                "Port {} is already in use. Remove --no-port-switching to allow auto-switching.",
                port
            ),
            BindError::Bind(err) => write!(f, "Failed to bind: {}", err),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::Bind(err) => Some(err),
            _ => None,
        }
    }
}

/// A bound listener plus how it was obtained. `previous` holds the requested
/// port only when that port was occupied and an ephemeral one was bound
/// instead.
#[derive(Debug)]
pub struct PortAllocation {
    pub listener: TcpListener,
    pub port: u16,
    pub previous: Option<u16>,
}

fn lookup(host: &str, port: u16) -> Result<Vec<SocketAddr>, BindError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|_| BindError::UnknownHost(host.to_string()))?
        .collect();

    if addrs.is_empty() {
        return Err(BindError::UnknownHost(host.to_string()));
    }

    Ok(addrs)
}

fn complete(listener: TcpListener, previous: Option<u16>) -> Result<PortAllocation, BindError> {
    let port = listener.local_addr().map_err(BindError::Bind)?.port();
    Ok(PortAllocation {
        listener,
        port,
        previous,
    })
}

/// Bind `desired_port` on `host`. When the port is taken and fallback is
/// allowed, an OS-assigned ephemeral port is bound instead; the kernel's
/// bind atomicity keeps concurrent allocations from racing. Every other
/// bind failure is fatal.
pub fn allocate(
    host: &str,
    desired_port: u16,
    allow_fallback: bool,
) -> Result<PortAllocation, BindError> {
    let addrs = lookup(host, desired_port)?;

    match TcpListener::bind(&addrs[..]) {
        Ok(listener) => complete(listener, None),
        Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
            if !allow_fallback {
                return Err(BindError::PortUnavailable(desired_port));
            }

            log::debug!("Port {} occupied, requesting an ephemeral port", desired_port);
            let fallback = lookup(host, 0)?;
            let listener = TcpListener::bind(&fallback[..]).map_err(BindError::Bind)?;
            complete(listener, Some(desired_port))
        }
        Err(err) => Err(BindError::Bind(err)),
    }
}

/// Loopback and LAN-reachable URLs for a bound server.
#[derive(Debug, Clone)]
pub struct ServerAddresses {
    pub local: String,
    pub network: String,
}

fn format_ip(ip: &IpAddr) -> String {
    // IPv6 literals get brackets per URL convention
    match ip {
        IpAddr::V6(v6) => format!("[{}]", v6),
        IpAddr::V4(v4) => v4.to_string(),
    }
}

fn display_host(host: Option<&str>) -> String {
    let Some(host) = host else {
        return "localhost".to_string();
    };

    match host.parse::<IpAddr>() {
        Ok(ip) if ip.is_unspecified() => "localhost".to_string(),
        Ok(ip) => format_ip(&ip),
        Err(_) => host.to_string(),
    }
}

fn wants_ipv6(host: Option<&str>) -> bool {
    matches!(
        host.and_then(|h| h.parse::<IpAddr>().ok()),
        Some(IpAddr::V6(_))
    )
}

/// The LAN-visible address: the first non-loopback interface address of the
/// preferred family in enumeration order, any non-loopback address
/// otherwise.
fn network_ip(prefer_ipv6: bool) -> Option<IpAddr> {
    if let Ok(interfaces) = list_afinet_netifas() {
        let candidates: Vec<IpAddr> = interfaces
            .iter()
            .map(|(_, ip)| *ip)
            .filter(|ip| !ip.is_loopback())
            .collect();

        if let Some(ip) = candidates.iter().find(|ip| ip.is_ipv6() == prefer_ipv6) {
            return Some(*ip);
        }
        if let Some(ip) = candidates.first() {
            return Some(*ip);
        }
    }

    local_ip().ok()
}

/// Compute the URLs advertised for a bound port. `local` always carries a
/// loopback name of the host's address family; `network` degrades to
/// loopback on hosts without a routable interface rather than failing.
pub fn resolve(host: Option<&str>, port: u16) -> ServerAddresses {
    let prefer_ipv6 = wants_ipv6(host);

    let local = format!("http://{}:{}", display_host(host), port);

    let network = match network_ip(prefer_ipv6) {
        Some(ip) => format!("http://{}:{}", format_ip(&ip), port),
        None => {
            let loopback = if prefer_ipv6 { "[::1]" } else { "127.0.0.1" };
            format!("http://{}:{}", loopback, port)
        }
    };

    ServerAddresses { local, network }
}

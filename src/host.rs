//! Identity of the machine running the logger.
//!
//! Used for the `host = "this"` label shorthand: the hostname followed by
//! the first non-loopback IPv4 address, e.g. `build-01[10.0.0.12]`.

use std::net::{IpAddr, Ipv4Addr};

use sysinfo::Networks;

/// `HOSTNAME[IPv4]`, or just the hostname when no external IPv4 address
/// is configured.
pub fn describe() -> String {
    let name = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string());
    format_host(&name, first_external_ipv4())
}

pub fn format_host(name: &str, ip: Option<Ipv4Addr>) -> String {
    match ip {
        Some(ip) => format!("{name}[{ip}]"),
        None => name.to_string(),
    }
}

/// First IPv4 address of an interface that is not a loopback address.
///
/// Interfaces are visited in name order so the pick is stable.
pub fn first_external_ipv4() -> Option<Ipv4Addr> {
    let networks = Networks::new_with_refreshed_list();
    let mut interfaces: Vec<_> = networks.iter().collect();
    interfaces.sort_by(|(a, _), (b, _)| a.cmp(b));
    first_ipv4(
        interfaces
            .into_iter()
            .flat_map(|(_, data)| data.ip_networks().iter().map(|net| net.addr)),
    )
}

/// First non-loopback IPv4 address among `addrs`.
pub fn first_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    })
}

//! Network infrastructure: implements `HostNetwork` from the kernel's view
//! of interfaces and routes.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use nix::ifaddrs::getifaddrs;

use crate::application::ports::HostNetwork;

const ROUTE_TABLE: &str = "/proc/net/route";
const RTF_UP: u32 = 0x1;

/// Production implementation reading the live host configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNetwork;

/// `(interface, address)` for every configured address.
fn interface_addresses() -> io::Result<Vec<(String, IpAddr)>> {
    let addrs = getifaddrs().map_err(io::Error::from)?;
    Ok(addrs
        .filter_map(|ifa| {
            let storage = ifa.address?;
            let ip = if let Some(sin) = storage.as_sockaddr_in() {
                IpAddr::V4(Ipv4Addr::from(sin.ip()))
            } else if let Some(sin6) = storage.as_sockaddr_in6() {
                IpAddr::V6(Ipv6Addr::from(sin6.ip()))
            } else {
                return None;
            };
            Some((ifa.interface_name, ip))
        })
        .collect())
}

/// Interface of the lowest-metric default route in a `/proc/net/route`
/// table.
#[must_use]
pub fn default_route_interface(table: &str) -> Option<String> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 8 {
                return None;
            }
            let flags = u32::from_str_radix(fields[3], 16).ok()?;
            let metric: u32 = fields[6].parse().ok()?;
            let is_default = fields[1] == "00000000" && fields[7] == "00000000";
            (is_default && flags & RTF_UP != 0).then(|| (metric, fields[0].to_string()))
        })
        .min_by_key(|(metric, _)| *metric)
        .map(|(_, iface)| iface)
}

impl HostNetwork for SystemNetwork {
    fn interface_addrs(&self) -> io::Result<Vec<IpAddr>> {
        Ok(interface_addresses()?.into_iter().map(|(_, ip)| ip).collect())
    }

    async fn lookup_ip(&self, name: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((name, 0)).await?;
        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }
        Ok(ips)
    }

    fn default_route_addr(&self) -> io::Result<Option<Ipv4Addr>> {
        let table = std::fs::read_to_string(ROUTE_TABLE)?;
        let Some(iface) = default_route_interface(&table) else {
            return Ok(None);
        };
        tracing::debug!(interface = %iface, "found default route");
        Ok(interface_addresses()?
            .into_iter()
            .find_map(|(name, ip)| match ip {
                IpAddr::V4(v4) if name == iface => Some(v4),
                _ => None,
            }))
    }
}

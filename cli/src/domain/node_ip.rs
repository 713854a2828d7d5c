//! Pure rules for choosing and checking a hybrid node's IP address.
//!
//! Host lookups (interfaces, DNS, routes) live behind the `HostNetwork` port;
//! everything here is deterministic.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use nodeadm_common::RemoteNetworkConfig;

use crate::domain::error::{NetworkValidationError, NodeIpError};

pub const NODE_IP_FLAG: &str = "--node-ip=";
pub const HOSTNAME_OVERRIDE_FLAG: &str = "--hostname-override=";

/// Where the chosen node IP came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeIpSource {
    KubeletFlag,
    Dns { name: String },
    DefaultRoute,
}

impl fmt::Display for NodeIpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KubeletFlag => f.write_str("kubelet --node-ip flag"),
            Self::Dns { name } => write!(f, "DNS lookup of {name}"),
            Self::DefaultRoute => f.write_str("default route interface"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIpDecision {
    pub ip: Ipv4Addr,
    pub source: NodeIpSource,
}

/// Value of the last occurrence of a `--flag=` prefix.
#[must_use]
pub fn last_flag_value<'a>(flags: &'a [String], prefix: &str) -> Option<&'a str> {
    flags.iter().rev().find_map(|f| f.strip_prefix(prefix))
}

/// Reject any `--hostname-override=`: hybrid nodes take their name from the
/// credential provider.
pub fn reject_hostname_override(flags: &[String]) -> Result<(), NodeIpError> {
    match last_flag_value(flags, HOSTNAME_OVERRIDE_FLAG) {
        Some(value) => Err(NodeIpError::HostnameOverrideUnsupported(value.to_string())),
        None => Ok(()),
    }
}

/// The IPv4 address set with `--node-ip=`, if any.
///
/// `0.0.0.0` means "unset" and yields `None`.
pub fn node_ip_from_flags(flags: &[String]) -> Result<Option<Ipv4Addr>, NodeIpError> {
    let Some(raw) = last_flag_value(flags, NODE_IP_FLAG) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<IpAddr>() {
        Err(_) => Err(NodeIpError::InvalidNodeIpFlag(raw.to_string())),
        Ok(IpAddr::V6(_)) => Err(NodeIpError::Ipv6NodeIpFlag(raw.to_string())),
        Ok(IpAddr::V4(ip)) if ip.is_unspecified() => Ok(None),
        Ok(IpAddr::V4(ip)) => Ok(Some(ip)),
    }
}

/// Address classes kubelet refuses as a node IP.
pub fn check_address_class(ip: IpAddr) -> Result<(), NodeIpError> {
    if ip.is_loopback() {
        return Err(NodeIpError::Loopback(ip));
    }
    if ip.is_multicast() {
        return Err(NodeIpError::Multicast(ip));
    }
    let link_local = match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    };
    if link_local {
        return Err(NodeIpError::LinkLocal(ip));
    }
    if ip.is_unspecified() {
        return Err(NodeIpError::Unspecified);
    }
    Ok(())
}

// ── CIDR ──────────────────────────────────────────────────────────────────────

/// An IPv4 network in CIDR notation. Host bits are masked off on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    fn mask(prefix: u8) -> u32 {
        u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0)
    }

    #[must_use]
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    #[must_use]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    #[must_use]
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & Self::mask(self.prefix) == u32::from(self.network)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid CIDR address: {s}"))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| format!("invalid CIDR address: {s}"))?;
        let prefix: u8 = prefix
            .parse()
            .ok()
            .filter(|p| *p <= 32)
            .ok_or_else(|| format!("invalid CIDR prefix: {s}"))?;
        Ok(Self {
            network: Ipv4Addr::from(u32::from(addr) & Self::mask(prefix)),
            prefix,
        })
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// Check that `ip` falls inside one of the cluster's remote node networks.
pub fn validate_ip_in_remote_node_network(
    ip: Ipv4Addr,
    config: Option<&RemoteNetworkConfig>,
) -> Result<(), NetworkValidationError> {
    let config = config.ok_or(NetworkValidationError::MissingRemoteNetworkConfig)?;
    if config.remote_node_networks.is_empty() {
        return Err(NetworkValidationError::NoRemoteNodeNetworks);
    }
    if let Some(index) = config
        .remote_node_networks
        .iter()
        .position(|n| n.cidrs.is_empty())
    {
        return Err(NetworkValidationError::EmptyRemoteNodeNetwork { index });
    }

    let cidrs = config.node_cidrs();
    for cidr in &cidrs {
        let parsed: Ipv4Cidr = cidr
            .parse()
            .map_err(|reason| NetworkValidationError::InvalidCidr {
                cidr: (*cidr).to_string(),
                reason,
            })?;
        if parsed.contains(ip) {
            return Ok(());
        }
    }
    Err(NetworkValidationError::NotInRemoteNodeNetworks {
        ip,
        cidrs: cidrs.into_iter().map(str::to_string).collect(),
    })
}

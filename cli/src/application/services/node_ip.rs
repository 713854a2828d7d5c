//! Node IP resolution and validation for hybrid nodes.
//!
//! Follows the order kubelet uses to pick its node IP, restricted to what a
//! hybrid node supports:
//!
//! 1. `--node-ip` from the kubelet flags (unless `0.0.0.0`)
//! 2. DNS lookup of the IAM Roles Anywhere node name
//! 3. the address of the interface carrying the default route
//!
//! SSM nodes are named after their managed instance ID at activation, which
//! never resolves through DNS, so step 2 only applies to IAM Roles Anywhere.

use std::net::IpAddr;

use anyhow::{Context, Result};
use nodeadm_common::{NodeConfig, RemoteNetworkConfig};

use crate::application::ports::HostNetwork;
use crate::domain::node_ip::{
    check_address_class, node_ip_from_flags, reject_hostname_override,
    validate_ip_in_remote_node_network,
};
use crate::domain::{NodeIpDecision, NodeIpError, NodeIpSource};

/// Check that `ip` is usable as a node IP and bound to a local interface.
pub fn validate_node_ip<H: HostNetwork>(ip: IpAddr, host: &H) -> Result<(), NodeIpError> {
    check_address_class(ip)?;
    let addrs = host.interface_addrs().map_err(NodeIpError::Interfaces)?;
    if addrs.contains(&ip) {
        Ok(())
    } else {
        Err(NodeIpError::NotOnHost(ip))
    }
}

/// Determine the IPv4 address this node will register with.
///
/// `--hostname-override` is rejected before any host lookup.
pub async fn get_node_ip<H: HostNetwork>(
    kubelet_flags: &[String],
    iam_node_name: Option<&str>,
    host: &H,
) -> Result<NodeIpDecision, NodeIpError> {
    reject_hostname_override(kubelet_flags)?;

    if let Some(ip) = node_ip_from_flags(kubelet_flags)? {
        return Ok(NodeIpDecision {
            ip,
            source: NodeIpSource::KubeletFlag,
        });
    }

    if let Some(name) = iam_node_name.filter(|n| !n.is_empty()) {
        match host.lookup_ip(name).await {
            Ok(addrs) => {
                let found = addrs.into_iter().find_map(|addr| match addr {
                    IpAddr::V4(v4) if validate_node_ip(addr, host).is_ok() => Some(v4),
                    _ => None,
                });
                if let Some(ip) = found {
                    return Ok(NodeIpDecision {
                        ip,
                        source: NodeIpSource::Dns {
                            name: name.to_string(),
                        },
                    });
                }
                tracing::debug!(node_name = name, "no usable IPv4 address in DNS answer");
            }
            Err(e) => {
                tracing::debug!(node_name = name, error = %e, "node name lookup failed");
            }
        }
    }

    match host.default_route_addr() {
        Ok(Some(ip)) => Ok(NodeIpDecision {
            ip,
            source: NodeIpSource::DefaultRoute,
        }),
        Ok(None) => Err(NodeIpError::NoNodeIp(
            "no default route with an IPv4 address found".to_string(),
        )),
        Err(e) => Err(NodeIpError::NoNodeIp(e.to_string())),
    }
}

/// Resolve the node IP for `cfg` and check it belongs to the host and to
/// one of the cluster's remote node networks.
pub async fn validate_node_ip_for_cluster<H: HostNetwork>(
    cfg: &NodeConfig,
    remote: Option<&RemoteNetworkConfig>,
    host: &H,
) -> Result<NodeIpDecision> {
    let flags = &cfg.spec.kubelet.flags;
    let decision = get_node_ip(flags, cfg.iam_roles_anywhere_node_name(), host)
        .await
        .context("determining node IP")?;
    tracing::info!(ip = %decision.ip, source = %decision.source, "resolved node IP");

    validate_node_ip(IpAddr::V4(decision.ip), host).context("validating node IP")?;
    validate_ip_in_remote_node_network(decision.ip, remote)
        .context("validating node IP against cluster remote node networks")?;
    Ok(decision)
}

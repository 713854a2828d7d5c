//! Cluster metadata consumed by node validation.
//!
//! Mirrors the `cluster` object returned by the EKS `DescribeCluster` API,
//! restricted to what hybrid node validation reads.

use serde::{Deserialize, Serialize};

/// Envelope of a `describe-cluster` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDescription {
    pub cluster: Cluster,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_network_config: Option<RemoteNetworkConfig>,
}

/// Network ranges a cluster accepts for hybrid nodes and their pods.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNetworkConfig {
    #[serde(default)]
    pub remote_node_networks: Vec<RemoteNodeNetwork>,
    #[serde(default)]
    pub remote_pod_networks: Vec<RemotePodNetwork>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNodeNetwork {
    #[serde(default)]
    pub cidrs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemotePodNetwork {
    #[serde(default)]
    pub cidrs: Vec<String>,
}

impl RemoteNetworkConfig {
    /// All node CIDRs across every named network, in declaration order.
    #[must_use]
    pub fn node_cidrs(&self) -> Vec<&str> {
        self.remote_node_networks
            .iter()
            .flat_map(|n| n.cidrs.iter().map(String::as_str))
            .collect()
    }
}

//! Types shared by nodeadm crates: the `NodeConfig` API document, cluster
//! metadata consumed during validation, and the enums exposed on the CLI.

pub mod cluster;
pub mod config;
pub mod types;

pub use cluster::{ClusterDescription, RemoteNetworkConfig, RemoteNodeNetwork, RemotePodNetwork};
pub use config::{
    ClusterDetails, ContainerdOptions, HybridOptions, IamRolesAnywhere, KubeletOptions, NodeConfig,
    NodeConfigError, NodeConfigSpec, Ssm,
};
pub use types::*;

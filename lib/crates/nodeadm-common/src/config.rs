//! The `NodeConfig` document (`node.eks.aws/v1alpha1`).
//!
//! Only the fields nodeadm acts on are modelled; unknown fields are ignored
//! so newer documents still load.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::NodeType;

pub const API_VERSION: &str = "node.eks.aws/v1alpha1";
pub const KIND: &str = "NodeConfig";

/// Primary configuration object for nodeadm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub spec: NodeConfigSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigSpec {
    #[serde(default)]
    pub cluster: ClusterDetails,
    #[serde(default)]
    pub containerd: ContainerdOptions,
    #[serde(default)]
    pub kubelet: KubeletOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid: Option<HybridOptions>,
}

/// Coordinates of the target cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDetails {
    #[serde(default)]
    pub name: String,
    /// Region used for regional artifacts and where the cluster lives.
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub api_server_endpoint: String,
    /// Base64-encoded certificate authority chain.
    #[serde(default)]
    pub certificate_authority: String,
    /// Service CIDR, used to infer the cluster DNS address.
    #[serde(default)]
    pub cidr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_outpost: Option<bool>,
}

/// Additional parameters passed to kubelet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KubeletOptions {
    /// Command-line kubelet arguments appended after the generated defaults,
    /// so they act as overrides.
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerdOptions {
    /// Inline containerd TOML merged over the defaults.
    #[serde(default)]
    pub config: String,
}

/// Options specific to hybrid node enrollment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HybridOptions {
    #[serde(default)]
    pub enable_credentials_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_roles_anywhere: Option<IamRolesAnywhere>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssm: Option<Ssm>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IamRolesAnywhere {
    /// Name the node adopts; also resolved through DNS during IP discovery.
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub trust_anchor_arn: String,
    #[serde(default)]
    pub profile_arn: String,
    #[serde(default)]
    pub role_arn: String,
    #[serde(default)]
    pub aws_config_path: String,
    #[serde(default)]
    pub certificate_path: String,
    #[serde(default)]
    pub private_key_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ssm {
    #[serde(default)]
    pub activation_code: String,
    #[serde(default)]
    pub activation_id: String,
}

/// Errors found while validating a `NodeConfig`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeConfigError {
    #[error("Unsupported kind '{0}'. Expected '{KIND}'.")]
    UnsupportedKind(String),

    #[error("Name is missing in cluster configuration")]
    MissingClusterName,

    #[error("Region is missing in cluster configuration")]
    MissingClusterRegion,

    #[error("Only one of IAMRolesAnywhere or SSM must be provided for hybrid node configuration")]
    AmbiguousCredentialProvider,

    #[error("Either IAMRolesAnywhere or SSM must be provided for hybrid node configuration")]
    MissingCredentialProvider,

    #[error("NodeName can't be empty in hybrid iam roles anywhere configuration")]
    MissingNodeName,

    #[error("{field} is missing in hybrid ssm configuration")]
    MissingSsmField { field: &'static str },
}

impl NodeConfig {
    #[must_use]
    pub fn is_hybrid_node(&self) -> bool {
        self.spec.hybrid.is_some()
    }

    #[must_use]
    pub fn is_outpost_node(&self) -> bool {
        self.spec.cluster.enable_outpost == Some(true)
    }

    #[must_use]
    pub fn is_iam_roles_anywhere(&self) -> bool {
        self.spec
            .hybrid
            .as_ref()
            .is_some_and(|h| h.iam_roles_anywhere.is_some())
    }

    #[must_use]
    pub fn is_ssm(&self) -> bool {
        self.spec.hybrid.as_ref().is_some_and(|h| h.ssm.is_some())
    }

    #[must_use]
    pub fn node_type(&self) -> NodeType {
        if self.is_ssm() {
            NodeType::Ssm
        } else if self.is_iam_roles_anywhere() {
            NodeType::IamRolesAnywhere
        } else if self.is_outpost_node() {
            NodeType::Outpost
        } else {
            NodeType::Ec2
        }
    }

    /// The IAM Roles Anywhere node name, when that provider is configured.
    #[must_use]
    pub fn iam_roles_anywhere_node_name(&self) -> Option<&str> {
        self.spec
            .hybrid
            .as_ref()
            .and_then(|h| h.iam_roles_anywhere.as_ref())
            .map(|ra| ra.node_name.as_str())
    }

    /// Validate the fields a hybrid node cannot run without.
    pub fn validate_hybrid(&self) -> Result<(), NodeConfigError> {
        if !self.kind.is_empty() && self.kind != KIND {
            return Err(NodeConfigError::UnsupportedKind(self.kind.clone()));
        }
        if self.spec.cluster.name.is_empty() {
            return Err(NodeConfigError::MissingClusterName);
        }
        if self.spec.cluster.region.is_empty() {
            return Err(NodeConfigError::MissingClusterRegion);
        }
        let Some(hybrid) = &self.spec.hybrid else {
            return Err(NodeConfigError::MissingCredentialProvider);
        };
        match (&hybrid.iam_roles_anywhere, &hybrid.ssm) {
            (Some(_), Some(_)) => Err(NodeConfigError::AmbiguousCredentialProvider),
            (None, None) => Err(NodeConfigError::MissingCredentialProvider),
            (Some(ra), None) if ra.node_name.is_empty() => Err(NodeConfigError::MissingNodeName),
            (None, Some(ssm)) if ssm.activation_code.is_empty() => {
                Err(NodeConfigError::MissingSsmField {
                    field: "ActivationCode",
                })
            }
            (None, Some(ssm)) if ssm.activation_id.is_empty() => {
                Err(NodeConfigError::MissingSsmField {
                    field: "ActivationID",
                })
            }
            _ => Ok(()),
        }
    }
}

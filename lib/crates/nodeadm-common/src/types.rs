use serde::{Deserialize, Serialize};

/// How a node obtains AWS credentials.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum CredentialProvider {
    /// Systems Manager hybrid activation.
    Ssm,
    /// IAM Roles Anywhere with an X.509 certificate.
    #[serde(rename = "iam-ra")]
    #[cfg_attr(feature = "clap", value(name = "iam-ra"))]
    IamRolesAnywhere,
}

impl CredentialProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ssm => "ssm",
            Self::IamRolesAnywhere => "iam-ra",
        }
    }
}

impl std::fmt::Display for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where containerd is installed from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ContainerdSource {
    /// Leave containerd alone; the host provides it.
    None,
    /// The distribution's own package repositories.
    #[default]
    Distro,
    /// Docker's package repositories (`containerd.io`).
    Docker,
}

/// The kind of node being bootstrapped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    Ssm,
    #[serde(rename = "iam-ra")]
    IamRolesAnywhere,
    Ec2,
    Outpost,
}

//! Kubelet runtime environment file.

use std::collections::BTreeMap;

use nodeadm_common::{CredentialProvider, NodeConfig};

use crate::domain::node_ip::{NODE_IP_FLAG, NodeIpDecision, NodeIpSource, last_flag_value};

pub const KUBELET_ENVIRONMENT_PATH: &str = "/etc/eks/kubelet/environment";
pub const KUBELET_ARGS_ENV: &str = "NODEADM_KUBELET_ARGS";
pub const DEFAULT_AWS_CONFIG_PATH: &str = "/etc/aws/hybrid/config";

const COMPUTE_TYPE_LABEL: &str = "eks.amazonaws.com/compute-type";
const CREDENTIAL_PROVIDER_LABEL: &str = "eks.amazonaws.com/hybrid-credential-provider";

/// Generated kubelet flags and environment variables.
///
/// Rendered as sorted `KEY="VALUE"` lines. `NODEADM_KUBELET_ARGS` holds the
/// generated `--flag=value` pairs in key order followed by the user's own
/// flags, so user flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeletEnvironment {
    flags: BTreeMap<String, String>,
    user_flags: Vec<String>,
    env: BTreeMap<String, String>,
}

impl KubeletEnvironment {
    #[must_use]
    pub fn new(user_flags: Vec<String>) -> Self {
        Self {
            user_flags,
            ..Self::default()
        }
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.flags.insert(name.into(), value.into());
    }

    pub fn set_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn kubelet_args(&self) -> String {
        self.flags
            .iter()
            .map(|(k, v)| format!("--{k}={v}"))
            .chain(self.user_flags.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Contents of the systemd `EnvironmentFile`. Backslashes and double
    /// quotes in values are escaped so each value stays one quoted word.
    #[must_use]
    pub fn render(&self) -> String {
        let mut env = self.env.clone();
        env.insert(KUBELET_ARGS_ENV.to_string(), self.kubelet_args());
        let mut out = env
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", escape_env_value(v)))
            .collect::<Vec<_>>()
            .join("\n");
        out.push('\n');
        out
    }
}

fn escape_env_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Kubelet settings for a hybrid node.
///
/// `decision` is the validated node IP; it becomes `--node-ip` unless the
/// user already passed one.
#[must_use]
pub fn hybrid_environment(
    cfg: &NodeConfig,
    decision: Option<&NodeIpDecision>,
) -> KubeletEnvironment {
    let user_flags = cfg.spec.kubelet.flags.clone();
    let mut env = KubeletEnvironment::new(user_flags);

    let provider = if cfg.is_iam_roles_anywhere() {
        CredentialProvider::IamRolesAnywhere
    } else {
        CredentialProvider::Ssm
    };
    env.set_flag(
        "node-labels",
        format!("{COMPUTE_TYPE_LABEL}=hybrid,{CREDENTIAL_PROVIDER_LABEL}={provider}"),
    );

    if let Some(ra) = cfg
        .spec
        .hybrid
        .as_ref()
        .and_then(|h| h.iam_roles_anywhere.as_ref())
    {
        env.set_flag("hostname-override", ra.node_name.clone());
        let config_path = if ra.aws_config_path.is_empty() {
            DEFAULT_AWS_CONFIG_PATH
        } else {
            ra.aws_config_path.as_str()
        };
        env.set_env("AWS_CONFIG_FILE", config_path);
    }

    if let Some(decision) = decision {
        let user_set = last_flag_value(&cfg.spec.kubelet.flags, NODE_IP_FLAG).is_some();
        if decision.source != NodeIpSource::KubeletFlag && !user_set {
            env.set_flag("node-ip", decision.ip.to_string());
        }
    }
    env
}

//! Node initialization: validate the configuration and the node IP, then
//! write the kubelet environment.

use anyhow::{Context, Result};
use nodeadm_common::{NodeConfig, RemoteNetworkConfig};

use crate::application::ports::{HostNetwork, NodeFilesystem};
use crate::application::services::node_ip::validate_node_ip_for_cluster;
use crate::domain::kubelet::{KUBELET_ENVIRONMENT_PATH, KubeletEnvironment, hybrid_environment};
use crate::domain::node_ip::reject_hostname_override;
use crate::domain::ConfigError;

const ENVIRONMENT_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOptions {
    pub skip_ip_validation: bool,
}

/// Validate `cfg` for this host and write the kubelet environment file.
///
/// # Errors
///
/// Fails on an invalid configuration, a node IP that cannot be resolved or
/// lies outside the cluster's remote node networks, or a write failure.
pub async fn init<H: HostNetwork, F: NodeFilesystem>(
    cfg: &NodeConfig,
    remote: Option<&RemoteNetworkConfig>,
    host: &H,
    fs: &F,
    opts: InitOptions,
) -> Result<KubeletEnvironment> {
    if !cfg.is_hybrid_node() {
        return Err(ConfigError::NotHybridNode.into());
    }
    cfg.validate_hybrid().context("validating node config")?;
    reject_hostname_override(&cfg.spec.kubelet.flags)?;

    let decision = if opts.skip_ip_validation {
        tracing::warn!("skipping node IP validation");
        None
    } else {
        Some(validate_node_ip_for_cluster(cfg, remote, host).await?)
    };

    let env = hybrid_environment(cfg, decision.as_ref());
    fs.write_file(
        KUBELET_ENVIRONMENT_PATH,
        env.render().as_bytes(),
        ENVIRONMENT_FILE_MODE,
    )
    .context("writing kubelet environment")?;
    tracing::info!(path = KUBELET_ENVIRONMENT_PATH, "wrote kubelet environment");
    Ok(env)
}

//! Init command: validate the node configuration and write the kubelet
//! environment.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::app::AppContext;
use crate::application::services::init::{InitOptions, init};
use crate::domain::kubelet::KUBELET_ENVIRONMENT_PATH;
use crate::infra::config::{load_cluster_description, load_node_config};
use crate::infra::network::SystemNetwork;

/// Checks `nodeadm init` can leave out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InitSkip {
    /// Do not check the node IP against the cluster's remote node networks
    IpValidation,
}

/// Arguments for the `nodeadm init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Node configuration: file://<path> or a local path
    #[arg(short = 'c', long)]
    pub config_source: String,

    /// describe-cluster JSON holding the cluster's remote network config
    #[arg(long)]
    pub cluster_details: Option<PathBuf>,

    /// Checks to skip
    #[arg(long, value_enum, value_delimiter = ',')]
    pub skip: Vec<InitSkip>,
}

/// Run the init command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or is invalid,
/// node IP validation fails, or the environment file cannot be written.
pub async fn run(app: &AppContext, args: &InitArgs) -> Result<()> {
    let cfg = load_node_config(&args.config_source)?;
    let remote = match &args.cluster_details {
        Some(path) => load_cluster_description(path)?.cluster.remote_network_config,
        None => None,
    };
    app.ensure_root()?;

    let opts = InitOptions {
        skip_ip_validation: args.skip.contains(&InitSkip::IpValidation),
    };
    init(&cfg, remote.as_ref(), &SystemNetwork, &app.fs, opts).await?;
    println!("wrote {KUBELET_ENVIRONMENT_PATH}");
    Ok(())
}

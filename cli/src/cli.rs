//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::app::AppContext;
use crate::application::context::OpContext;
use crate::commands;
use crate::infra::config::Settings;

/// Bootstrap a host into an EKS hybrid node
#[derive(Parser)]
#[command(
    name = "nodeadm",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install node components for a Kubernetes version
    Install(commands::install::InstallArgs),

    /// Upgrade installed components to another Kubernetes version
    Upgrade(commands::upgrade::UpgradeArgs),

    /// Remove components installed by nodeadm
    Uninstall(commands::uninstall::UninstallArgs),

    /// Validate the node configuration and configure the kubelet
    Init(commands::init::InitArgs),

    /// Show version
    Version(VersionArgs),
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Execute the CLI command under `ctx`, which is cancelled on Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be loaded or the command fails.
    pub async fn run(self, ctx: OpContext) -> Result<()> {
        if let Command::Version(args) = &self.command {
            commands::version::run(args.json);
            return Ok(());
        }

        let app = AppContext::new(Settings::from_env()?, ctx);
        match self.command {
            Command::Install(args) => commands::install::run(&app, &args).await,
            Command::Upgrade(args) => commands::upgrade::run(&app, &args).await,
            Command::Uninstall(args) => commands::uninstall::run(&app, &args).await,
            Command::Init(args) => commands::init::run(&app, &args).await,
            Command::Version(_) => Ok(()),
        }
    }
}

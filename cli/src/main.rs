//! nodeadm - bootstrap a host into an EKS hybrid node

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nodeadm_cli::application::context::OpContext;
use nodeadm_cli::cli::Cli;

/// `NODEADM_LOG`, then `RUST_LOG`, then `info` (`debug` with `--verbose`).
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("NODEADM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (ctx, cancel) = OpContext::background().with_cancel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping");
            cancel.cancel();
        }
    });

    if let Err(e) = cli.run(ctx).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

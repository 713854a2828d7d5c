//! Retrying package commands with the real process runner.

use std::time::Duration;

use nodeadm_cli::application::context::OpContext;
use nodeadm_cli::application::services::artifact::{
    install_package_with_retries, upgrade_package_with_retries,
};
use nodeadm_cli::application::services::retry::retry;
use nodeadm_cli::domain::{Cmd, DynamicPackage, Package, PackageSource, RetryInterrupted};
use nodeadm_cli::infra::command_runner::TokioCommandRunner;

const INTERVAL: Duration = Duration::from_millis(10);

fn failing() -> Cmd {
    Cmd::new("sh", ["-c", "exit 1"])
}

fn hello() -> Cmd {
    Cmd::new("echo", ["hello"])
}

fn failing_package() -> DynamicPackage {
    DynamicPackage::new(PackageSource::new(failing(), failing(), failing()))
}

#[tokio::test]
async fn install_picks_up_swapped_command() {
    let ctx = OpContext::background().with_timeout(Duration::from_secs(10));
    let pkg = failing_package();

    let swap = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        pkg.set_install_cmd(hello());
    };
    let (result, ()) = tokio::join!(
        install_package_with_retries(&ctx, &TokioCommandRunner, &pkg, INTERVAL),
        swap
    );
    result.unwrap();
}

#[tokio::test]
async fn upgrade_picks_up_swapped_command() {
    let ctx = OpContext::background().with_timeout(Duration::from_secs(10));
    let pkg = failing_package();

    let swap = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        pkg.set_upgrade_cmd(hello());
    };
    let (result, ()) = tokio::join!(
        upgrade_package_with_retries(&ctx, &TokioCommandRunner, &pkg, INTERVAL),
        swap
    );
    result.unwrap();
}

#[tokio::test]
async fn retry_returns_output_of_successful_attempt() {
    let ctx = OpContext::background().with_timeout(Duration::from_secs(10));
    let pkg = failing_package();

    let swap = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        pkg.set_install_cmd(hello());
    };
    let (result, ()) = tokio::join!(
        retry(&ctx, &TokioCommandRunner, || pkg.install_cmd(), INTERVAL),
        swap
    );
    assert_eq!(result.unwrap().stdout, b"hello\n");
}

#[tokio::test]
async fn deadline_stops_a_command_that_never_succeeds() {
    let ctx = OpContext::background().with_timeout(Duration::from_millis(150));
    let pkg = failing_package();

    let err: RetryInterrupted =
        install_package_with_retries(&ctx, &TokioCommandRunner, &pkg, INTERVAL)
            .await
            .unwrap_err();
    assert!(err.attempts >= 1);
    assert!(err.last_error.is_some());
}

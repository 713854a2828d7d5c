//! CLI argument handling.

use assert_cmd::Command;
use predicates::prelude::*;

fn nodeadm() -> Command {
    let mut cmd = Command::cargo_bin("nodeadm").expect("nodeadm binary");
    cmd.env_remove("NODEADM_LOG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    nodeadm()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("upgrade"))
        .stdout(predicate::str::contains("uninstall"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn no_arguments_shows_help() {
    nodeadm()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn version_flag() {
    nodeadm()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_command() {
    nodeadm()
        .arg("version")
        .assert()
        .success()
        .stdout(format!("nodeadm {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_json() {
    let output = nodeadm().args(["version", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn install_requires_credential_provider() {
    nodeadm()
        .args(["install", "1.31"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--credential-provider"));
}

#[test]
fn install_rejects_unknown_credential_provider() {
    nodeadm()
        .args(["install", "1.31", "-p", "password"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn install_rejects_invalid_kubernetes_version() {
    nodeadm()
        .args(["install", "latest", "-p", "ssm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("latest"));
}

#[test]
fn upgrade_rejects_invalid_timeout() {
    nodeadm()
        .args(["upgrade", "1.31", "--timeout", "5d"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid duration"));
}

#[test]
fn invalid_setting_is_reported() {
    nodeadm()
        .args(["upgrade", "1.31"])
        .env("NODEADM_RETRY_INTERVAL_SECS", "soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NODEADM_"));
}

//! `nodeadm init` failures that happen before the host is touched.

use assert_cmd::Command;
use predicates::prelude::*;

fn nodeadm() -> Command {
    Command::cargo_bin("nodeadm").expect("nodeadm binary")
}

#[test]
fn config_source_is_required() {
    nodeadm()
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--config-source"));
}

#[test]
fn unsupported_config_source() {
    nodeadm()
        .args(["init", "-c", "imds://user-data"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("imds://user-data"));
}

#[test]
fn missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    nodeadm()
        .args(["init", "-c", &format!("file://{}", path.display())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.yaml"));
}

#[test]
fn malformed_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "spec: [unterminated\n").unwrap();
    nodeadm()
        .args(["init", "-c", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot parse"));
}

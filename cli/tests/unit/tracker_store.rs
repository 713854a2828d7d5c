//! The installation tracker persisted through `FileTrackerStore`.

use nodeadm_cli::application::services::tracker::Tracker;
use nodeadm_cli::domain::ArtifactName;
use nodeadm_cli::infra::tracker::FileTrackerStore;

#[test]
fn tracker_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opt/nodeadm/tracker");

    let tracker = Tracker::load(Box::new(FileTrackerStore::with_path(&path))).unwrap();
    tracker.add(ArtifactName::Containerd).unwrap();
    tracker.add(ArtifactName::Kubelet).unwrap();
    tracker.add(ArtifactName::Containerd).unwrap();
    drop(tracker);

    let reloaded = Tracker::load(Box::new(FileTrackerStore::with_path(&path))).unwrap();
    assert_eq!(
        reloaded.installed(),
        vec![ArtifactName::Containerd, ArtifactName::Kubelet]
    );
    assert_eq!(
        reloaded.uninstall_order(),
        vec![ArtifactName::Kubelet, ArtifactName::Containerd]
    );
}

#[test]
fn cleared_tracker_removes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker");

    let tracker = Tracker::load(Box::new(FileTrackerStore::with_path(&path))).unwrap();
    tracker.add(ArtifactName::Ssm).unwrap();
    assert!(path.exists());

    tracker.clear().unwrap();
    assert!(!path.exists());
    assert!(tracker.installed().is_empty());
}

#[test]
fn corrupt_tracker_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker");
    std::fs::write(&path, "artifacts: [not-a-component]\n").unwrap();

    assert!(Tracker::load(Box::new(FileTrackerStore::with_path(&path))).is_err());
}

//! Install, upgrade and uninstall against a temporary install root with
//! the real filesystem, tracker store and apt command layout.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use nodeadm_cli::application::context::OpContext;
use nodeadm_cli::application::ports::{ArtifactSource, NodeFilesystem};
use nodeadm_cli::application::services::components::InstallEnv;
use nodeadm_cli::application::services::install::{InstallOptions, install};
use nodeadm_cli::application::services::tracker::Tracker;
use nodeadm_cli::application::services::uninstall::{UninstallOptions, uninstall};
use nodeadm_cli::application::services::upgrade::upgrade;
use nodeadm_cli::domain::ArtifactName;
use nodeadm_cli::infra::fs::HostFs;
use nodeadm_cli::infra::package_manager::{DistroPackageManager, PackageManagerVerbs};
use nodeadm_cli::infra::source::NoDownloads;
use nodeadm_cli::infra::tracker::FileTrackerStore;
use nodeadm_common::{ContainerdSource, CredentialProvider};

use crate::mocks::{RecordingRunner, VersionedSources};

struct Node {
    _dir: tempfile::TempDir,
    fs: HostFs,
    tracker_path: std::path::PathBuf,
    packages: DistroPackageManager,
    ctx: OpContext,
}

impl Node {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fs = HostFs::with_root(dir.path());
        let tracker_path = fs.resolve("/opt/nodeadm/tracker");
        Self {
            _dir: dir,
            fs,
            tracker_path,
            packages: DistroPackageManager::new(PackageManagerVerbs::apt(), "amd64", "noble"),
            ctx: OpContext::background().with_timeout(Duration::from_secs(30)),
        }
    }

    fn tracker(&self) -> Tracker {
        Tracker::load(Box::new(FileTrackerStore::with_path(&self.tracker_path))).unwrap()
    }

    fn env<'a, S: ArtifactSource>(
        &'a self,
        runner: &'a RecordingRunner,
        sources: &'a S,
        tracker: &'a Tracker,
    ) -> InstallEnv<'a, RecordingRunner, S, HostFs, DistroPackageManager> {
        InstallEnv {
            ctx: &self.ctx,
            runner,
            sources,
            fs: &self.fs,
            packages: &self.packages,
            tracker,
            retry_interval: Duration::from_millis(1),
        }
    }

    fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.fs.resolve(path)).unwrap()
    }

    fn mode(&self, path: &str) -> u32 {
        std::fs::metadata(self.fs.resolve(path))
            .unwrap()
            .permissions()
            .mode()
            & 0o7777
    }
}

fn opts() -> InstallOptions {
    InstallOptions {
        credential_provider: CredentialProvider::IamRolesAnywhere,
        containerd_source: ContainerdSource::Docker,
        region: "us-west-2".to_string(),
    }
}

#[tokio::test]
async fn install_upgrade_uninstall_round_trip() {
    let node = Node::new();

    // install
    let runner = RecordingRunner::default();
    let tracker = node.tracker();
    install(
        &node.env(&runner, &VersionedSources { version: "1" }, &tracker),
        &opts(),
    )
    .await
    .unwrap();

    assert_eq!(node.read("/usr/bin/kubelet"), "kubelet v1\n");
    assert_eq!(node.mode("/usr/bin/kubelet"), 0o755);
    assert_eq!(node.mode("/etc/systemd/system/kubelet.service"), 0o644);
    let unit = node.read("/etc/systemd/system/kubelet.service");
    assert!(unit.contains("ExecStart=/usr/bin/kubelet"));
    assert!(node.read("/etc/modules-load.d/containerd.conf").contains("br_netfilter"));
    assert_eq!(node.read("/etc/apt/keyrings/docker.asc"), "docker-repo v1\n");
    assert!(node.read("/etc/apt/sources.list.d/docker.list").contains("noble stable"));
    assert_eq!(
        node.read("/etc/eks/image-credential-provider/ecr-credential-provider"),
        "image-credential-provider v1\n"
    );
    assert!(node.fs.exists("/usr/local/bin/aws_signing_helper"));
    assert!(!node.fs.exists("/opt/ssm"));

    let calls = runner.calls();
    assert!(calls.contains(&"[apt install ca-certificates -y]".to_string()), "{calls:?}");
    assert!(calls.contains(&"[apt install containerd.io -y]".to_string()), "{calls:?}");
    assert!(calls.contains(&"[apt install iptables -y]".to_string()), "{calls:?}");

    assert_eq!(
        node.tracker().installed(),
        vec![
            ArtifactName::DockerRepo,
            ArtifactName::Containerd,
            ArtifactName::Iptables,
            ArtifactName::Kubelet,
            ArtifactName::Kubectl,
            ArtifactName::ImageCredentialProvider,
            ArtifactName::IamAuthenticator,
            ArtifactName::IamRolesAnywhere,
        ]
    );

    // upgrade
    let runner = RecordingRunner::default();
    let tracker = node.tracker();
    upgrade(&node.env(&runner, &VersionedSources { version: "2" }, &tracker))
        .await
        .unwrap();
    assert_eq!(node.read("/usr/bin/kubelet"), "kubelet v2\n");
    assert_eq!(node.read("/usr/local/bin/kubectl"), "kubectl v2\n");
    assert!(
        runner
            .calls()
            .contains(&"[apt update containerd.io -y]".to_string())
    );

    // uninstall
    let runner = RecordingRunner::default();
    let tracker = node.tracker();
    uninstall(
        &node.env(&runner, &NoDownloads, &tracker),
        UninstallOptions::default(),
    )
    .await
    .unwrap();

    for path in [
        "/usr/bin/kubelet",
        "/etc/systemd/system/kubelet.service",
        "/usr/local/bin/kubectl",
        "/etc/eks/image-credential-provider",
        "/usr/local/bin/aws-iam-authenticator",
        "/usr/local/bin/aws_signing_helper",
        "/etc/modules-load.d/containerd.conf",
        "/etc/apt/keyrings/docker.asc",
        "/etc/apt/sources.list.d/docker.list",
    ] {
        assert!(!node.fs.exists(path), "{path} still present");
    }
    assert!(
        runner
            .calls()
            .contains(&"[apt autoremove containerd.io -y]".to_string())
    );
    assert!(!Path::new(&node.tracker_path).exists());
}

#[tokio::test]
async fn uninstall_can_keep_containerd() {
    let node = Node::new();
    let runner = RecordingRunner::default();
    let tracker = node.tracker();
    install(
        &node.env(&runner, &VersionedSources { version: "1" }, &tracker),
        &opts(),
    )
    .await
    .unwrap();

    let runner = RecordingRunner::default();
    let tracker = node.tracker();
    uninstall(
        &node.env(&runner, &NoDownloads, &tracker),
        UninstallOptions {
            skip_containerd: true,
        },
    )
    .await
    .unwrap();

    assert!(node.fs.exists("/etc/modules-load.d/containerd.conf"));
    assert!(node.fs.exists("/etc/apt/keyrings/docker.asc"));
    assert!(!node.fs.exists("/usr/bin/kubelet"));
    assert!(runner.calls().iter().all(|c| !c.contains("containerd")));
    assert_eq!(
        node.tracker().installed(),
        vec![ArtifactName::DockerRepo, ArtifactName::Containerd]
    );
}

#[tokio::test]
async fn interrupted_install_resumes_where_it_stopped() {
    let node = Node::new();
    {
        let tracker = node.tracker();
        tracker.add(ArtifactName::DockerRepo).unwrap();
        tracker.add(ArtifactName::Containerd).unwrap();
    }

    let runner = RecordingRunner::default();
    let tracker = node.tracker();
    install(
        &node.env(&runner, &VersionedSources { version: "1" }, &tracker),
        &opts(),
    )
    .await
    .unwrap();

    let calls = runner.calls();
    assert_eq!(calls, vec!["[apt install iptables -y]".to_string()]);
    assert!(!node.fs.exists("/etc/apt/keyrings/docker.asc"));
    assert!(node.fs.exists("/usr/bin/kubelet"));
}

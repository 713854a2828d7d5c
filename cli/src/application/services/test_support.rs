//! Shared test doubles for service tests.
//!
//! Every port gets an in-memory implementation so component installers can
//! be exercised without touching the host.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::path::PathBuf;
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::application::context::OpContext;
use crate::application::ports::{
    ArtifactSource, CommandRunner, DockerRepoLayout, NodeFilesystem, PackageProvider, TrackerStore,
};
use crate::application::services::components::InstallEnv;
use crate::application::services::tracker::Tracker;
use crate::domain::artifact::hex_encode;
use crate::domain::{
    ArtifactName, Asset, Checksum, Cmd, CommandError, InstallFileError, PackageManagerKind,
    PackageSource, Source, TrackerState,
};

/// Build an `ExitStatus` from a logical exit code.
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex_encode(&Sha256::digest(data))
}

// ── Runner ────────────────────────────────────────────────────────────────────

/// Records every command; commands whose program was marked failing exit 1.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Cmd>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingRunner {
    pub fn fail_program(&self, program: &str) {
        self.failing.lock().unwrap().insert(program.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, _ctx: &OpContext, cmd: &Cmd) -> Result<Output, CommandError> {
        self.calls.lock().unwrap().push(cmd.clone());
        if self.failing.lock().unwrap().contains(cmd.program()) {
            return Ok(Output {
                status: exit_status(1),
                stdout: Vec::new(),
                stderr: b"forced failure".to_vec(),
            });
        }
        Ok(ok_output(b""))
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

/// Serves fixed bytes per artifact.
#[derive(Default)]
pub struct StaticSources {
    files: Mutex<HashMap<ArtifactName, (Vec<u8>, Option<Checksum>)>>,
}

impl StaticSources {
    /// Serve `bytes` for `name`, with a matching checksum if `checksummed`.
    pub fn put(&self, name: ArtifactName, bytes: &[u8], checksummed: bool) {
        let checksum = checksummed.then(|| Checksum::from_hex(&sha256_hex(bytes)).unwrap());
        self.put_with_checksum(name, bytes, checksum);
    }

    pub fn put_with_checksum(&self, name: ArtifactName, bytes: &[u8], checksum: Option<Checksum>) {
        self.files
            .lock()
            .unwrap()
            .insert(name, (bytes.to_vec(), checksum));
    }
}

impl ArtifactSource for StaticSources {
    async fn get(&self, _ctx: &OpContext, name: ArtifactName) -> Result<Source> {
        let files = self.files.lock().unwrap();
        let Some((bytes, checksum)) = files.get(&name) else {
            anyhow::bail!("no source for {name}");
        };
        Ok(Source::from_bytes(name, bytes.clone(), checksum.clone()))
    }

    fn asset(&self, asset: Asset) -> Result<Source> {
        Ok(Source::from_bytes(
            asset.owner(),
            format!("asset {}\n", asset.file_name()),
            None,
        ))
    }
}

// ── Filesystem ────────────────────────────────────────────────────────────────

/// Files keyed by node path.
#[derive(Default)]
pub struct MemFs {
    files: Mutex<BTreeMap<String, (Vec<u8>, u32)>>,
}

impl MemFs {
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).map(|(b, _)| b.clone())
    }

    pub fn mode(&self, path: &str) -> Option<u32> {
        self.files.lock().unwrap().get(path).map(|(_, m)| *m)
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

fn under(path: &str, root: &str) -> bool {
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl NodeFilesystem for MemFs {
    fn resolve(&self, path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    fn install_file(
        &self,
        path: &str,
        src: &mut dyn Read,
        mode: u32,
    ) -> Result<(), InstallFileError> {
        let mut bytes = Vec::new();
        src.read_to_end(&mut bytes)
            .map_err(|source| InstallFileError::Write {
                path: PathBuf::from(path),
                source,
            })?;
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes, mode));
        Ok(())
    }

    fn upgrade_available(&self, path: &str, src: &Source) -> Result<bool> {
        let Some(expected) = src.expected_checksum() else {
            return Ok(true);
        };
        Ok(self
            .read(path)
            .is_none_or(|bytes| sha256_hex(&bytes) != expected.as_str()))
    }

    fn remove_all(&self, path: &str) -> Result<()> {
        self.files.lock().unwrap().retain(|p, _| !under(p, path));
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.lock().unwrap().keys().any(|p| under(p, path))
    }
}

// ── Packages ──────────────────────────────────────────────────────────────────

/// apt-flavoured commands with predictable program names.
#[derive(Default)]
pub struct FakePackages {
    /// Package reported as conflicting with Docker's containerd.
    pub conflicts: Option<&'static str>,
}

fn apt_package(name: &str) -> PackageSource {
    PackageSource::new(
        Cmd::new("apt", ["install", "-y", name]),
        Cmd::new("apt", ["autoremove", "-y", name]),
        Cmd::new("apt", ["upgrade", "-y", name]),
    )
}

impl PackageProvider for FakePackages {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Apt
    }

    fn containerd(&self, docker: bool) -> PackageSource {
        apt_package(if docker { "containerd.io" } else { "containerd" })
    }

    fn iptables(&self) -> PackageSource {
        apt_package("iptables")
    }

    fn ssm(&self) -> PackageSource {
        PackageSource::new(
            Cmd::new("snap", ["install", "amazon-ssm-agent"]),
            Cmd::new("snap", ["remove", "amazon-ssm-agent"]),
            Cmd::new("snap", ["refresh", "amazon-ssm-agent"]),
        )
    }

    fn refresh_metadata(&self) -> Cmd {
        Cmd::new("apt", ["update", "-y"])
    }

    fn docker_repo(&self) -> DockerRepoLayout {
        DockerRepoLayout {
            fetched_path: "/etc/apt/keyrings/docker.asc",
            source_list: Some((
                "/etc/apt/sources.list.d/docker.list",
                "deb [arch=amd64 signed-by=/etc/apt/keyrings/docker.asc] https://download.docker.com/linux/ubuntu noble stable\n".to_string(),
            )),
            conflicts: self.conflicts.map(apt_package),
            prerequisite: apt_package("ca-certificates"),
            refresh: Cmd::new("apt", ["update", "-y"]),
        }
    }
}

// ── Tracker store ─────────────────────────────────────────────────────────────

#[derive(Default, Clone)]
pub struct MemoryTrackerStore {
    pub saved: Arc<Mutex<Option<TrackerState>>>,
}

impl TrackerStore for MemoryTrackerStore {
    fn load(&self) -> Result<Option<TrackerState>> {
        Ok(self.saved.lock().unwrap().clone())
    }

    fn save(&self, state: &TrackerState) -> Result<()> {
        *self.saved.lock().unwrap() = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.saved.lock().unwrap() = None;
        Ok(())
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

/// One of every double, wired together.
pub struct Harness {
    pub ctx: OpContext,
    pub runner: RecordingRunner,
    pub sources: StaticSources,
    pub fs: MemFs,
    pub packages: FakePackages,
    pub tracker: Tracker,
    pub store: MemoryTrackerStore,
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryTrackerStore::default();
        let tracker = Tracker::load(Box::new(store.clone())).unwrap();
        Self {
            ctx: OpContext::background(),
            runner: RecordingRunner::default(),
            sources: StaticSources::default(),
            fs: MemFs::default(),
            packages: FakePackages::default(),
            tracker,
            store,
        }
    }

    /// Serve checksummed placeholder bytes for every downloadable artifact.
    pub fn with_all_sources(self) -> Self {
        for name in [
            ArtifactName::DockerRepo,
            ArtifactName::Kubelet,
            ArtifactName::Kubectl,
            ArtifactName::ImageCredentialProvider,
            ArtifactName::IamAuthenticator,
            ArtifactName::IamRolesAnywhere,
            ArtifactName::Ssm,
        ] {
            self.sources
                .put(name, format!("{name} bytes").as_bytes(), true);
        }
        self
    }

    pub fn env(&self) -> InstallEnv<'_, RecordingRunner, StaticSources, MemFs, FakePackages> {
        InstallEnv {
            ctx: &self.ctx,
            runner: &self.runner,
            sources: &self.sources,
            fs: &self.fs,
            packages: &self.packages,
            tracker: &self.tracker,
            retry_interval: Duration::from_millis(1),
        }
    }
}

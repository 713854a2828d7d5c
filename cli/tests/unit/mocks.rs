//! Port implementations shared by the unit tests.

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;

use anyhow::Result;
use nodeadm_cli::application::context::OpContext;
use nodeadm_cli::application::ports::{ArtifactSource, CommandRunner};
use nodeadm_cli::domain::artifact::hex_encode;
use nodeadm_cli::domain::{ArtifactName, Asset, Checksum, Cmd, CommandError, Source};
use nodeadm_cli::infra::assets::asset_source;
use sha2::{Digest, Sha256};

/// Succeeds for every command and remembers what ran.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, _ctx: &OpContext, cmd: &Cmd) -> Result<Output, CommandError> {
        self.calls.lock().unwrap().push(cmd.to_string());
        Ok(Output {
            status: ExitStatus::from_raw(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}

/// Serves `"<name> v<version>\n"` for every downloadable artifact, with a
/// matching checksum.
pub struct VersionedSources {
    pub version: &'static str,
}

impl VersionedSources {
    pub fn body(&self, name: ArtifactName) -> Vec<u8> {
        format!("{name} v{}\n", self.version).into_bytes()
    }
}

impl ArtifactSource for VersionedSources {
    async fn get(&self, _ctx: &OpContext, name: ArtifactName) -> Result<Source> {
        let body = self.body(name);
        let sum = Checksum::from_hex(&hex_encode(&Sha256::digest(&body)));
        Ok(Source::from_bytes(name, body, sum))
    }

    fn asset(&self, asset: Asset) -> Result<Source> {
        asset_source(asset)
    }
}

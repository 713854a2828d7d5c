//! Artifact model: logical names, commands and file sources.
//!
//! An artifact is installed in exactly one of two forms. A [`Source`] is a
//! byte stream destined for a file; a [`crate::domain::package::Package`]
//! yields the commands that install, upgrade and remove it. The two types
//! share no fields, so an artifact can never carry both.

use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::error::ChecksumError;

/// Logical name of every component the agent can install and track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactName {
    Containerd,
    Iptables,
    Kubelet,
    Kubectl,
    ImageCredentialProvider,
    IamAuthenticator,
    IamRolesAnywhere,
    Ssm,
    DockerRepo,
}

impl ArtifactName {
    /// Every artifact in install order.
    pub const ALL: [ArtifactName; 9] = [
        Self::DockerRepo,
        Self::Containerd,
        Self::Iptables,
        Self::Kubelet,
        Self::Kubectl,
        Self::ImageCredentialProvider,
        Self::IamAuthenticator,
        Self::Ssm,
        Self::IamRolesAnywhere,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Containerd => "containerd",
            Self::Iptables => "iptables",
            Self::Kubelet => "kubelet",
            Self::Kubectl => "kubectl",
            Self::ImageCredentialProvider => "image-credential-provider",
            Self::IamAuthenticator => "iam-authenticator",
            Self::IamRolesAnywhere => "iam-roles-anywhere",
            Self::Ssm => "ssm",
            Self::DockerRepo => "docker-repo",
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static files compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    /// systemd unit for kubelet.
    KubeletUnit,
    /// Kernel modules containerd needs at boot.
    ContainerdModules,
}

impl Asset {
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::KubeletUnit => "kubelet.service",
            Self::ContainerdModules => "containerd-modules.conf",
        }
    }

    /// The component this asset belongs to.
    #[must_use]
    pub fn owner(self) -> ArtifactName {
        match self {
            Self::KubeletUnit => ArtifactName::Kubelet,
            Self::ContainerdModules => ArtifactName::Containerd,
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// A program and its arguments, detached from any execution context.
///
/// `Cmd::default()` has an empty program: a valid "no command" value whose
/// execution fails at launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
}

impl Cmd {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        f.write_str("]")
    }
}

// ── Checksums ─────────────────────────────────────────────────────────────────

/// A SHA-256 digest in lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum(String);

impl Checksum {
    /// Parse a 64-character hex digest, case-insensitively.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        if hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(hex.to_ascii_lowercase()))
        } else {
            None
        }
    }

    /// Parse the first field of a `sha256sum`-style line.
    #[must_use]
    pub fn from_sidecar(content: &str) -> Option<Self> {
        content.split_whitespace().next().and_then(Self::from_hex)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase hex encoding of raw bytes.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}

// ── File sources ──────────────────────────────────────────────────────────────

/// A readable byte stream for a file artifact plus its expected checksum.
///
/// Every byte read through the source feeds a running SHA-256, so the
/// checksum is verified against what was actually written. The underlying
/// stream is released when the source is dropped.
pub struct Source {
    artifact: ArtifactName,
    reader: Box<dyn Read + Send>,
    hasher: Sha256,
    expected: Option<Checksum>,
}

impl Source {
    pub fn new(
        artifact: ArtifactName,
        reader: impl Read + Send + 'static,
        expected: Option<Checksum>,
    ) -> Self {
        Self {
            artifact,
            reader: Box::new(reader),
            hasher: Sha256::new(),
            expected,
        }
    }

    /// A source over in-memory bytes.
    pub fn from_bytes(
        artifact: ArtifactName,
        bytes: impl Into<Vec<u8>>,
        expected: Option<Checksum>,
    ) -> Self {
        Self::new(artifact, std::io::Cursor::new(bytes.into()), expected)
    }

    #[must_use]
    pub fn artifact(&self) -> ArtifactName {
        self.artifact
    }

    #[must_use]
    pub fn expected_checksum(&self) -> Option<&Checksum> {
        self.expected.as_ref()
    }

    /// Hex digest of the bytes read so far.
    #[must_use]
    pub fn actual_checksum(&self) -> String {
        hex_encode(&self.hasher.clone().finalize())
    }

    /// `true` when no checksum is expected or the bytes read match it.
    #[must_use]
    pub fn verify_checksum(&self) -> bool {
        self.expected
            .as_ref()
            .is_none_or(|expected| expected.as_str() == self.actual_checksum())
    }

    #[must_use]
    pub fn checksum_error(&self) -> ChecksumError {
        ChecksumError {
            artifact: self.artifact,
            expected: self
                .expected
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            actual: self.actual_checksum(),
        }
    }
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("artifact", &self.artifact)
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

/// Normalize a Kubernetes version given as `MAJOR.MINOR` or
/// `[v]MAJOR.MINOR.PATCH`.
#[must_use]
pub fn parse_kubernetes_version(version: &str) -> Option<semver::Version> {
    let trimmed = version.trim().trim_start_matches('v');
    let full = if trimmed.matches('.').count() == 1 {
        format!("{trimmed}.0")
    } else {
        trimmed.to_string()
    };
    semver::Version::parse(&full).ok()
}

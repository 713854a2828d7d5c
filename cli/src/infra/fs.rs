//! Filesystem infrastructure: implements `NodeFilesystem` and the raw
//! artifact install primitives.

use std::fs::{DirBuilder, Permissions};
use std::io::Read;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::application::ports::NodeFilesystem;
use crate::domain::artifact::hex_encode;
use crate::domain::{InstallFileError, Source};

/// Permission bits for directories created while installing files.
pub const DEFAULT_DIR_PERMS: u32 = 0o755;

/// Create `dir` and any missing ancestors with [`DEFAULT_DIR_PERMS`].
///
/// Permissions are set explicitly after creation so the process umask does
/// not narrow them. Existing directories are left as they are.
fn create_parent_dirs(dir: &Path) -> Result<(), InstallFileError> {
    let mut missing = Vec::new();
    let mut cur = Some(dir);
    while let Some(d) = cur {
        if d.as_os_str().is_empty() || d.exists() {
            break;
        }
        missing.push(d);
        cur = d.parent();
    }
    for d in missing.into_iter().rev() {
        let err = |source| InstallFileError::CreateDir {
            path: d.to_path_buf(),
            source,
        };
        match DirBuilder::new().mode(DEFAULT_DIR_PERMS).create(d) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(err(e)),
        }
        std::fs::set_permissions(d, Permissions::from_mode(DEFAULT_DIR_PERMS)).map_err(err)?;
    }
    Ok(())
}

/// Atomically write `src` to `dest` with permission bits `mode`.
///
/// The bytes are streamed into a temporary file in the destination
/// directory, which is then renamed over `dest`. Readers never see a
/// partially written file, and an existing `dest` is replaced.
///
/// # Errors
///
/// The returned error names the step that failed: directory creation,
/// writing the temporary file, or the final rename.
pub fn install_file(dest: &Path, src: &mut dyn Read, mode: u32) -> Result<(), InstallFileError> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    create_parent_dirs(dir)?;

    let write_err = |source| InstallFileError::Write {
        path: dest.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".nodeadm-")
        .tempfile_in(dir)
        .map_err(write_err)?;
    std::io::copy(src, tmp.as_file_mut()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.as_file()
        .set_permissions(Permissions::from_mode(mode))
        .map_err(write_err)?;
    tmp.persist(dest)
        .map_err(|e| InstallFileError::Publish {
            path: dest.to_path_buf(),
            source: e.error,
        })?;
    Ok(())
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large files into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

/// Whether `src` differs from the file installed at `installed`.
///
/// A missing file, or a source without a checksum, always needs an upgrade.
///
/// # Errors
///
/// Returns an error if the installed file exists but cannot be read.
pub fn upgrade_available(installed: &Path, src: &Source) -> Result<bool> {
    let Some(expected) = src.expected_checksum() else {
        return Ok(true);
    };
    if !installed.exists() {
        return Ok(true);
    }
    Ok(sha256_file(installed)? != expected.as_str())
}

/// The host filesystem, with node paths placed under `root`.
#[derive(Debug, Clone)]
pub struct HostFs {
    root: PathBuf,
}

impl HostFs {
    /// Place node paths under `root` instead of `/`. Used by tests and for
    /// preparing images offline.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for HostFs {
    fn default() -> Self {
        Self::with_root("/")
    }
}

impl NodeFilesystem for HostFs {
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn install_file(
        &self,
        path: &str,
        src: &mut dyn Read,
        mode: u32,
    ) -> Result<(), InstallFileError> {
        install_file(&self.resolve(path), src, mode)
    }

    fn upgrade_available(&self, path: &str, src: &Source) -> Result<bool> {
        upgrade_available(&self.resolve(path), src)
    }

    fn remove_all(&self, path: &str) -> Result<()> {
        let full = self.resolve(path);
        let result = match std::fs::symlink_metadata(&full) {
            Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(&full),
            Ok(_) => std::fs::remove_file(&full),
            Err(e) => Err(e),
        };
        match result {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("removing {}", full.display()))
            }
            _ => Ok(()),
        }
    }
}

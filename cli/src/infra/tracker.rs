//! Infrastructure implementation of the `TrackerStore` port.
//!
//! `FileTrackerStore` keeps the tracker as YAML and writes it atomically
//! (temp file + rename) so an interrupted save never leaves a truncated
//! record behind.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::TrackerStore;
use crate::domain::TrackerState;

/// Where the tracker lives on a node.
pub const DEFAULT_TRACKER_PATH: &str = "/opt/nodeadm/tracker";

/// Tracker file manager.
#[derive(Debug, Clone)]
pub struct FileTrackerStore {
    path: PathBuf,
}

impl FileTrackerStore {
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TrackerStore for FileTrackerStore {
    fn load(&self) -> Result<Option<TrackerState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading tracker {}", self.path.display()))?;
        let state: TrackerState = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing tracker {}", self.path.display()))?;
        Ok(Some(state))
    }

    fn save(&self, state: &TrackerState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(state).context("serializing tracker")?;

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o644))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing tracker {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("removing tracker {}", self.path.display()))
            }
            _ => Ok(()),
        }
    }
}

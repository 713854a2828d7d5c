//! Agent settings and configuration documents.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use nodeadm_common::{ClusterDescription, NodeConfig};
use serde::Deserialize;

use crate::domain::ConfigError;
use crate::infra::source::DEFAULT_RELEASE_BASE_URL;
use crate::infra::tracker::DEFAULT_TRACKER_PATH;

const ENV_PREFIX: &str = "NODEADM_";

/// Agent settings loaded from environment variables via `envy`.
///
/// Each field maps to `NODEADM_<FIELD>`:
///   - `NODEADM_INSTALL_ROOT`        (default `/`)
///   - `NODEADM_TRACKER_PATH`        (default `/opt/nodeadm/tracker`)
///   - `NODEADM_RELEASE_BASE_URL`    (default EKS hybrid artifact bucket)
///   - `NODEADM_RETRY_INTERVAL_SECS` (default `5`)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Root the node's paths are placed under.
    #[serde(default = "default_install_root")]
    pub install_root: PathBuf,

    #[serde(default = "default_tracker_path")]
    pub tracker_path: PathBuf,

    #[serde(default = "default_release_base_url")]
    pub release_base_url: String,

    /// Wait between attempts of a failing OS command.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
}

fn default_install_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_tracker_path() -> PathBuf {
    PathBuf::from(DEFAULT_TRACKER_PATH)
}

fn default_release_base_url() -> String {
    DEFAULT_RELEASE_BASE_URL.to_string()
}

fn default_retry_interval_secs() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            install_root: default_install_root(),
            tracker_path: default_tracker_path(),
            release_base_url: default_release_base_url(),
            retry_interval_secs: default_retry_interval_secs(),
        }
    }
}

impl Settings {
    /// # Errors
    ///
    /// Returns an error if a `NODEADM_*` variable has an unparseable value.
    pub fn from_env() -> Result<Self> {
        envy::prefixed(ENV_PREFIX)
            .from_env()
            .context("failed to load settings from NODEADM_* env vars")
    }

    /// Load from explicit `(name, value)` pairs instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be parsed.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .context("failed to load settings")
    }

    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    /// The tracker location, placed under the install root.
    #[must_use]
    pub fn tracker_file(&self) -> PathBuf {
        let relative = self
            .tracker_path
            .strip_prefix("/")
            .unwrap_or(&self.tracker_path);
        self.install_root.join(relative)
    }

    #[must_use]
    pub fn is_host_root(&self) -> bool {
        self.install_root == Path::new("/")
    }
}

/// Resolve a `--config-source` value to a local path.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedSource`] for anything other than
/// `file://<path>` or a plain path.
pub fn config_source_path(source: &str) -> Result<PathBuf, ConfigError> {
    if let Some(path) = source.strip_prefix("file://") {
        if path.is_empty() {
            return Err(ConfigError::UnsupportedSource(source.to_string()));
        }
        return Ok(PathBuf::from(path));
    }
    if source.is_empty() || source.contains("://") {
        return Err(ConfigError::UnsupportedSource(source.to_string()));
    }
    Ok(PathBuf::from(source))
}

/// Load a `NodeConfig` document from `source`.
///
/// # Errors
///
/// Returns an error for unsupported sources, unreadable files or invalid
/// YAML.
pub fn load_node_config(source: &str) -> Result<NodeConfig> {
    let path = config_source_path(source)?;
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// Load a `describe-cluster` JSON document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_cluster_description(path: &Path) -> Result<ClusterDescription> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

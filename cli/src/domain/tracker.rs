//! Persistent record of the components nodeadm installed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::artifact::ArtifactName;

/// Installed components in install order. Each name appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    #[serde(default)]
    pub artifacts: Vec<ArtifactName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TrackerState {
    #[must_use]
    pub fn contains(&self, name: ArtifactName) -> bool {
        self.artifacts.contains(&name)
    }

    /// Record `name`. Returns `false` if it was already present.
    pub fn add(&mut self, name: ArtifactName) -> bool {
        if self.contains(name) {
            return false;
        }
        self.artifacts.push(name);
        true
    }

    /// Forget `name`. Returns `false` if it was not present.
    pub fn remove(&mut self, name: ArtifactName) -> bool {
        let before = self.artifacts.len();
        self.artifacts.retain(|a| *a != name);
        self.artifacts.len() != before
    }

    /// Components in the order they must be torn down.
    #[must_use]
    pub fn uninstall_order(&self) -> Vec<ArtifactName> {
        self.artifacts.iter().rev().copied().collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

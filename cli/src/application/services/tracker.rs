//! Installation tracker: which components nodeadm installed, in what order.
//!
//! Only components nodeadm itself installed are recorded, so teardown never
//! touches software that was already on the host.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};

use crate::application::ports::TrackerStore;
use crate::domain::{ArtifactName, TrackerState};

pub struct Tracker {
    store: Box<dyn TrackerStore>,
    state: Mutex<TrackerState>,
}

impl Tracker {
    /// Load the tracker from `store`, starting empty if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record exists but cannot be read.
    pub fn load(store: Box<dyn TrackerStore>) -> Result<Self> {
        let state = store
            .load()
            .context("loading installation tracker")?
            .unwrap_or_default();
        Ok(Self {
            store,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &mut TrackerState) -> Result<()> {
        state.updated_at = Some(chrono::Utc::now());
        self.store
            .save(state)
            .context("saving installation tracker")
    }

    /// Record `name` as installed and persist. Adding a recorded name is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be saved; `name` is then left
    /// untracked.
    pub fn add(&self, name: ArtifactName) -> Result<()> {
        let mut state = self.lock();
        if !state.add(name) {
            return Ok(());
        }
        tracing::debug!(artifact = %name, "tracking component");
        let saved = self.persist(&mut state);
        if saved.is_err() {
            state.remove(name);
        }
        saved
    }

    /// # Errors
    ///
    /// Returns an error if the record cannot be saved.
    pub fn remove(&self, name: ArtifactName) -> Result<()> {
        let mut state = self.lock();
        if !state.remove(name) {
            return Ok(());
        }
        tracing::debug!(artifact = %name, "untracking component");
        self.persist(&mut state)
    }

    #[must_use]
    pub fn contains(&self, name: ArtifactName) -> bool {
        self.lock().contains(name)
    }

    /// Recorded components in install order.
    #[must_use]
    pub fn installed(&self) -> Vec<ArtifactName> {
        self.lock().artifacts.clone()
    }

    /// Recorded components in reverse install order.
    #[must_use]
    pub fn uninstall_order(&self) -> Vec<ArtifactName> {
        self.lock().uninstall_order()
    }

    /// Forget everything and delete the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record cannot be removed.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock();
        *state = TrackerState::default();
        self.store.clear().context("removing installation tracker")
    }
}

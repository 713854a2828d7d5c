//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra` or
//! `crate::commands`.

pub mod context;
pub mod ports;
pub mod services;

pub use context::{CancelHandle, OpContext};
pub use ports::{
    ArtifactSource, CommandRunner, DockerRepoLayout, HostNetwork, NodeFilesystem, PackageProvider,
    TrackerStore,
};

//! Domain layer: pure types, rules and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs` or `std::process` spawning.
//! All functions are synchronous and take data in, returning data out.

pub mod artifact;
pub mod error;
pub mod kubelet;
pub mod node_ip;
pub mod package;
pub mod tracker;

pub use artifact::{ArtifactName, Asset, Checksum, Cmd, Source};
pub use error::{
    ChecksumError, CommandError, ConfigError, ContextError, InstallFileError,
    NetworkValidationError, NodeIpError, RetryInterrupted,
};
pub use node_ip::{NodeIpDecision, NodeIpSource};
pub use package::{DynamicPackage, Package, PackageManagerKind, PackageOp, PackageSource};
pub use tracker::TrackerState;

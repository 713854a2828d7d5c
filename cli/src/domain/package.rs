//! Command-form artifacts.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::domain::artifact::Cmd;

/// An artifact installed by running commands rather than writing a file.
///
/// Each call returns a fresh `Cmd`, so retry loops observe updates made to
/// the package between attempts.
pub trait Package: Send + Sync {
    fn install_cmd(&self) -> Cmd;
    fn uninstall_cmd(&self) -> Cmd;
    fn upgrade_cmd(&self) -> Cmd;
}

/// Which of the three package commands to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOp {
    Install,
    Upgrade,
    Uninstall,
}

impl PackageOp {
    pub fn cmd<P: Package + ?Sized>(self, pkg: &P) -> Cmd {
        match self {
            Self::Install => pkg.install_cmd(),
            Self::Upgrade => pkg.upgrade_cmd(),
            Self::Uninstall => pkg.uninstall_cmd(),
        }
    }
}

impl fmt::Display for PackageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Uninstall => "uninstall",
        })
    }
}

/// A package whose commands are fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSource {
    install: Cmd,
    uninstall: Cmd,
    upgrade: Cmd,
}

impl PackageSource {
    #[must_use]
    pub fn new(install: Cmd, uninstall: Cmd, upgrade: Cmd) -> Self {
        Self {
            install,
            uninstall,
            upgrade,
        }
    }
}

impl Package for PackageSource {
    fn install_cmd(&self) -> Cmd {
        self.install.clone()
    }

    fn uninstall_cmd(&self) -> Cmd {
        self.uninstall.clone()
    }

    fn upgrade_cmd(&self) -> Cmd {
        self.upgrade.clone()
    }
}

/// A package whose commands can be swapped while other tasks read them.
#[derive(Debug, Default)]
pub struct DynamicPackage {
    inner: RwLock<PackageSource>,
}

impl DynamicPackage {
    #[must_use]
    pub fn new(initial: PackageSource) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    pub fn set_install_cmd(&self, cmd: Cmd) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).install = cmd;
    }

    pub fn set_uninstall_cmd(&self, cmd: Cmd) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).uninstall = cmd;
    }

    pub fn set_upgrade_cmd(&self, cmd: Cmd) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).upgrade = cmd;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, PackageSource> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Package for DynamicPackage {
    fn install_cmd(&self) -> Cmd {
        self.read().install_cmd()
    }

    fn uninstall_cmd(&self) -> Cmd {
        self.read().uninstall_cmd()
    }

    fn upgrade_cmd(&self) -> Cmd {
        self.read().upgrade_cmd()
    }
}

/// The host's native package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManagerKind {
    Apt,
    Yum,
}

impl PackageManagerKind {
    #[must_use]
    pub fn binary(self) -> &'static str {
        match self {
            Self::Apt => "apt",
            Self::Yum => "yum",
        }
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, downloads, host network inspection and package manager detection.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` are forbidden.

pub mod assets;
pub mod command_runner;
pub mod config;
pub mod fs;
pub mod network;
pub mod package_manager;
pub mod source;
pub mod tracker;

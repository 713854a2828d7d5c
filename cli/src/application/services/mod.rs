//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application`, never from `crate::infra` or `crate::commands`.

pub mod artifact;
pub mod components;
pub mod init;
pub mod install;
pub mod node_ip;
pub mod retry;
pub mod tracker;
pub mod uninstall;
pub mod upgrade;

#[cfg(test)]
pub mod test_support;

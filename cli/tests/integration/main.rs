//! Integration tests for nodeadm
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! They never modify the host: every command under test fails before it
//! would touch the system.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod cli_tests;
mod init_command;

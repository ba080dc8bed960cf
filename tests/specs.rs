//! Behavioral specifications for the cryoflow CLI and daemon.
//!
//! These tests are black-box: they invoke the `cryoflow` binary (which
//! auto-starts `cryoflowd` against an isolated state directory) and verify
//! stdout, stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/cli/help.rs"]
mod cli_help;

#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;

#[path = "specs/session/delete_cascade.rs"]
mod session_delete_cascade;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management: locating and starting `cryoflowd` when the
//! CLI can't reach it over the socket.

use crate::client::ClientError;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn daemon_dir() -> Result<PathBuf, ClientError> {
    crate::env::state_dir()
}

pub fn daemon_socket() -> Result<PathBuf, ClientError> {
    Ok(daemon_dir()?.join("daemon.sock"))
}

/// Removes a socket file with nothing listening behind it, so a fresh
/// daemon can bind the same path.
pub fn cleanup_stale_socket(socket_path: &Path) {
    let _ = std::fs::remove_file(socket_path);
}

pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let binary_path = find_cryoflowd_binary()?;
    Command::new(&binary_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|err| ClientError::DaemonStartFailed(err.to_string()))
}

fn find_cryoflowd_binary() -> Result<PathBuf, ClientError> {
    if let Some(path) = crate::env::daemon_binary() {
        return Ok(PathBuf::from(path));
    }

    let current_exe = std::env::current_exe().ok();
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .map(|s| s.contains("target/debug"))
        .unwrap_or(false);

    if is_debug_build {
        if let Some(manifest_dir) = crate::env::cargo_manifest_dir() {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|workspace_root| workspace_root.join("target/debug/cryoflowd"));
            if let Some(dev_path) = dev_path {
                if dev_path.exists() {
                    return Ok(dev_path);
                }
            }
        }
    }

    if let Some(sibling) = current_exe
        .as_ref()
        .and_then(|p| p.parent())
        .map(|dir| dir.join("cryoflowd"))
    {
        if sibling.exists() {
            return Ok(sibling);
        }
    }

    Ok(PathBuf::from("cryoflowd"))
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: the fixed set of paths one daemon instance needs,
//! resolved once at startup and held behind an explicit struct rather than
//! read piecemeal from the environment.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory: $HOME is unset")]
    NoStateDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/cryoflow).
    pub state_dir: PathBuf,
    /// Unix socket the Control API listens on.
    pub socket_path: PathBuf,
    /// Advisory single-instance lock/PID file.
    pub lock_path: PathBuf,
    /// Daemon log file.
    pub log_path: PathBuf,
    /// Durable session-store directory (WAL + snapshot).
    pub store_dir: PathBuf,
    /// Root directory each project's working tree lives under.
    pub projects_root: PathBuf,
}

impl Config {
    /// Loads configuration for the one daemon serving every project on this
    /// host. Fixed paths under the resolved state directory; no per-project
    /// configuration file.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = crate::env::state_dir()?;
        let projects_root = crate::env::projects_dir()?;
        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            store_dir: state_dir.join("store"),
            projects_root,
            state_dir,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

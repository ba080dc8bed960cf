// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use crate::config::ConfigError;
use std::path::PathBuf;

/// Resolve state directory: CRYOFLOW_STATE_DIR > XDG_STATE_HOME/cryoflow > ~/.local/state/cryoflow
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("CRYOFLOW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("cryoflow"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/cryoflow"))
}

/// Root directory each project's working tree lives under:
/// CRYOFLOW_PROJECTS_DIR, falling back to `<state_dir>/projects`.
pub fn projects_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("CRYOFLOW_PROJECTS_DIR") {
        return Ok(PathBuf::from(dir));
    }
    Ok(state_dir()?.join("projects"))
}

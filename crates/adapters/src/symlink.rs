// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable per-session symlink under the project directory.
//!
//! Stage commands reference previous-stage outputs via relative paths rooted
//! at the project directory; the symlink gives each session a stable
//! project-relative root even if the underlying watch directory moves,
//! without copying any data.

use std::io;
use std::path::{Path, PathBuf};

/// Creates `project_path/<session_name>` as a symlink to `watch_directory`,
/// replacing any stale symlink left over from a previous run at the same path.
pub fn create_project_symlink(
    project_path: &Path,
    session_name: &str,
    watch_directory: &Path,
) -> io::Result<PathBuf> {
    let link_path = project_path.join(session_name);
    if link_path.symlink_metadata().is_ok() {
        std::fs::remove_file(&link_path)?;
    }
    std::os::unix::fs::symlink(watch_directory, &link_path)?;
    Ok(link_path)
}

/// Removes the symlink if present; a missing symlink is not an error, since
/// `stop` may run after a crash that already tore it down.
pub fn remove_project_symlink(project_path: &Path, session_name: &str) -> io::Result<()> {
    let link_path = project_path.join(session_name);
    match std::fs::remove_file(&link_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "symlink_tests.rs"]
mod tests;

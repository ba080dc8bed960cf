// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reads the simple counter a stage's conventional STAR output reports,
//! used to detect a count mismatch against the upstream counter a pass
//! expected.

use crate::params::conventional_output_file;
use cryoflow_core::StageKey;
use std::path::Path;

/// Counts data rows in a STAR file's first `loop_` block: lines after the
/// `_rln*` column declarations, up to the next `data_` block or EOF. `None`
/// if the file can't be read at all (job hasn't written it yet, or this is
/// a synthetic test run with no real output); callers fall back to trusting
/// the upstream counter in that case rather than treating it as a mismatch.
fn count_star_rows(path: &Path) -> Option<u64> {
    let content = std::fs::read_to_string(path).ok()?;
    let mut in_loop = false;
    let mut count = 0u64;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with("data_") {
            in_loop = false;
            continue;
        }
        if line.eq_ignore_ascii_case("loop_") {
            in_loop = true;
            continue;
        }
        if line.starts_with('_') {
            continue;
        }
        if in_loop {
            count += 1;
        }
    }
    Some(count)
}

/// Reads the actual count a completed stage's output reports. `None` for
/// Class2D, which doesn't participate in the movie/particle counter chain,
/// or when the output file isn't present or readable.
pub(crate) fn read_stage_counter(output_dir: &Path, stage: StageKey) -> Option<u64> {
    if stage == StageKey::Class2d {
        return None;
    }
    count_star_rows(&output_dir.join(conventional_output_file(stage)))
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;

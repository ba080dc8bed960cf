// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The 2D classification side branch: a trigger predicate evaluated once
//! per pipeline pass, and never re-run into an already-used output
//! directory.

use cryoflow_core::{Class2dConfig, SessionState};

/// True once enough new particles have accumulated and the minimum interval
/// since the last firing (if any) has elapsed. Does not itself check
/// `config.enabled` — callers skip this branch entirely when disabled,
/// the same way any other disabled stage is skipped.
pub fn should_trigger(state: &SessionState, config: &Class2dConfig, now_ms: u64) -> bool {
    if state.particles_extracted < config.particle_threshold {
        return false;
    }
    match state.last_batch_2d_ms {
        None => true,
        Some(last) => now_ms.saturating_sub(last) > config.batch_interval_ms,
    }
}

#[cfg(test)]
#[path = "class2d_tests.rs"]
mod tests;

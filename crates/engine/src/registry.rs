// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live per-session registry: tracks whether a session is actively running
//! and serializes pipeline-pass execution per session via a `busy` flag with
//! an at-most-one `pending_rerun` queue. `busy` is held for an entire pass,
//! not just a single stage submission: the pipeline module sets it on
//! admission and only clears it once a pass is genuinely quiescent, so a
//! trigger arriving while a stage is in flight queues instead of racing it.

use cryoflow_core::SessionId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Entry {
    running: bool,
    busy: bool,
    pending_rerun: bool,
}

/// Outcome of attempting to enter a session's critical section.
pub(crate) enum Admission {
    /// Caller now holds the busy lock and must call [`Registry::release`]
    /// when the pass completes.
    Run,
    /// Another pass is in flight; this attempt is queued and will be picked
    /// up by the in-flight pass's release, not by the caller.
    Queued,
}

#[derive(Default)]
pub(crate) struct Registry {
    sessions: Mutex<HashMap<SessionId, Arc<Mutex<Entry>>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn entry(&self, session_id: &SessionId) -> Arc<Mutex<Entry>> {
        self.sessions
            .lock()
            .entry(session_id.clone())
            .or_default()
            .clone()
    }

    pub(crate) fn mark_running(&self, session_id: &SessionId) {
        self.entry(session_id).lock().running = true;
    }

    pub(crate) fn mark_not_running(&self, session_id: &SessionId) {
        self.entry(session_id).lock().running = false;
    }

    pub(crate) fn is_running(&self, session_id: &SessionId) -> bool {
        self.entry(session_id).lock().running
    }

    pub(crate) fn remove(&self, session_id: &SessionId) {
        self.sessions.lock().remove(session_id);
    }

    /// Attempts to enter the critical section for a pipeline pass. If
    /// already busy, queues a rerun (at most one) and returns [`Admission::Queued`].
    pub(crate) fn admit(&self, session_id: &SessionId) -> Admission {
        let binding = self.entry(session_id);
        let mut entry = binding.lock();
        if entry.busy {
            entry.pending_rerun = true;
            Admission::Queued
        } else {
            entry.busy = true;
            Admission::Run
        }
    }

    /// Releases the busy lock after a pass completes. Returns `true` if a
    /// rerun was queued while this pass ran, in which case the caller must
    /// run another pass immediately (still holding `busy`, which this call
    /// re-sets for that purpose).
    pub(crate) fn release_and_check_rerun(&self, session_id: &SessionId) -> bool {
        let binding = self.entry(session_id);
        let mut entry = binding.lock();
        if entry.pending_rerun {
            entry.pending_rerun = false;
            // stays busy=true for the immediate rerun
            true
        } else {
            entry.busy = false;
            false
        }
    }

    /// Unconditionally clears `busy` and `pending_rerun`, used on unexpected
    /// error paths that must not leave the session permanently locked out.
    pub(crate) fn force_clear_busy(&self, session_id: &SessionId) {
        let binding = self.entry(session_id);
        let mut entry = binding.lock();
        entry.busy = false;
        entry.pending_rerun = false;
    }

    /// Marks a session busy unconditionally, without consuming a
    /// `pending_rerun`. Used when continuing a pass that is already known to
    /// hold `busy` (e.g. reacting to a job's terminal status), as a defence
    /// against that state having been lost (a process restart clears the
    /// registry, but an in-flight job's status can still arrive afterward).
    pub(crate) fn ensure_busy(&self, session_id: &SessionId) {
        self.entry(session_id).lock().busy = true;
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording [`Notifier`] double for tests.

use super::{LiveUpdate, Notifier};
use cryoflow_core::ProjectId;
use parking_lot::Mutex;
use tokio::sync::broadcast;

pub struct FakeNotifier {
    published: Mutex<Vec<(ProjectId, LiveUpdate)>>,
    tx: broadcast::Sender<LiveUpdate>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            published: Mutex::new(Vec::new()),
            tx,
        }
    }

    pub fn published(&self) -> Vec<(ProjectId, LiveUpdate)> {
        self.published.lock().clone()
    }
}

impl Default for FakeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for FakeNotifier {
    fn publish(&self, project_id: &ProjectId, update: LiveUpdate) {
        self.published.lock().push((project_id.clone(), update.clone()));
        let _ = self.tx.send(update);
    }

    fn subscribe(&self, _project_id: &ProjectId) -> broadcast::Receiver<LiveUpdate> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project broadcast channels, created lazily on first publish or
//! subscribe rather than requiring callers to pre-register them.

use super::{LiveUpdate, Notifier};
use cryoflow_core::ProjectId;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 256;

pub struct BroadcastNotifier {
    channels: Mutex<HashMap<ProjectId, broadcast::Sender<LiveUpdate>>>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn channel(&self, project_id: &ProjectId) -> broadcast::Sender<LiveUpdate> {
        self.channels
            .lock()
            .entry(project_id.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, project_id: &ProjectId, update: LiveUpdate) {
        let tx = self.channel(project_id);
        // SendError just means no subscribers are currently listening.
        if tx.send(update).is_err() {
            debug!(%project_id, "no subscribers for live update");
        }
    }

    fn subscribe(&self, project_id: &ProjectId) -> broadcast::Receiver<LiveUpdate> {
        self.channel(project_id).subscribe()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;

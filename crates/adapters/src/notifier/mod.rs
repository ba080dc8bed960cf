// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live-activity notifier: publishes `live_session_update` messages on a
//! project-scoped broadcast channel. Failures to deliver are non-fatal —
//! there being no subscribers is the common case, not an error.

mod bus;

pub use bus::BroadcastNotifier;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotifier;

use cryoflow_core::{ActivityLevel, ProjectId, SessionId};
use serde_json::Value;
use tokio::sync::broadcast;

/// One `live_session_update` delivery.
#[derive(Debug, Clone)]
pub struct LiveUpdate {
    pub session_id: SessionId,
    pub event: String,
    pub level: ActivityLevel,
    pub data: Value,
    pub timestamp_ms: u64,
}

pub trait Notifier: Send + Sync {
    /// Publishes an update on `project_id`'s channel. Never returns an error:
    /// a channel with no subscribers is the normal case, not a failure.
    fn publish(&self, project_id: &ProjectId, update: LiveUpdate);

    /// Subscribe to one project's update stream.
    fn subscribe(&self, project_id: &ProjectId) -> broadcast::Receiver<LiveUpdate>;
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level orchestrator error, layering each component's typed error.

use cryoflow_adapters::{ClusterError, WatcherError};
use cryoflow_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),
    #[error("session not found: {0}")]
    SessionNotFound(cryoflow_core::SessionId),
    #[error("project not found: {0}")]
    ProjectNotFound(cryoflow_core::ProjectId),
    #[error("session {0} is not in a state that allows this operation: {1}")]
    InvalidState(cryoflow_core::SessionId, &'static str),
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity log entries attached to a session.

use crate::job::{JobId, PipelineStats};
use crate::stage::StageKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Info,
    Warning,
    Error,
}

/// Structured payload carried by an activity entry.
///
/// Serializes untagged: each variant's own fields disambiguate it on replay,
/// and the `Other` escape hatch accepts any JSON object that doesn't match a
/// known shape rather than failing deserialization outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityContext {
    FilesDiscovered {
        count: u64,
    },
    StageSubmitted {
        job_id: JobId,
        stage: StageKey,
    },
    StageCompleted {
        job_id: JobId,
        stage: StageKey,
        stats: PipelineStats,
    },
    StageFailed {
        job_id: JobId,
        stage: StageKey,
        error_excerpt: String,
    },
    CountMismatch {
        stage: StageKey,
        expected: u64,
        actual: u64,
    },
    /// Escape hatch for forward-compatible or adapter-specific payloads that
    /// don't map onto a known variant.
    Other(serde_json::Value),
}

/// One entry in a session's activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub level: ActivityLevel,
    pub message: String,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ActivityContext>,
}

impl ActivityEntry {
    pub fn info(message: impl Into<String>, created_at_ms: u64) -> Self {
        Self {
            level: ActivityLevel::Info,
            message: message.into(),
            created_at_ms,
            context: None,
        }
    }

    pub fn warning(message: impl Into<String>, created_at_ms: u64) -> Self {
        Self {
            level: ActivityLevel::Warning,
            message: message.into(),
            created_at_ms,
            context: None,
        }
    }

    pub fn error(message: impl Into<String>, created_at_ms: u64) -> Self {
        Self {
            level: ActivityLevel::Error,
            message: message.into(),
            created_at_ms,
            context: None,
        }
    }

    pub fn with_context(mut self, context: ActivityContext) -> Self {
        self.context = Some(context);
        self
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline stage identifiers and ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal identifier of a pipeline step.
///
/// `Import`, `Motion`, `Ctf`, `Pick`, `Extract` form the strictly sequential
/// main line; `Class2d` is a side branch fired on batches of particles and
/// never re-run into the same output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    Import,
    Motion,
    Ctf,
    Pick,
    Extract,
    Class2d,
}

/// Ordered main line of the pipeline (excludes the `class2d` side branch).
pub const MAIN_LINE: [StageKey; 5] = [
    StageKey::Import,
    StageKey::Motion,
    StageKey::Ctf,
    StageKey::Pick,
    StageKey::Extract,
];

impl StageKey {
    /// The next stage on the main line, or `None` after `Extract`.
    pub fn next(self) -> Option<StageKey> {
        let pos = MAIN_LINE.iter().position(|s| *s == self)?;
        MAIN_LINE.get(pos + 1).copied()
    }

    /// The stage immediately preceding this one on the main line.
    pub fn previous(self) -> Option<StageKey> {
        let pos = MAIN_LINE.iter().position(|s| *s == self)?;
        pos.checked_sub(1).and_then(|i| MAIN_LINE.get(i).copied())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageKey::Import => "import",
            StageKey::Motion => "motion",
            StageKey::Ctf => "ctf",
            StageKey::Pick => "pick",
            StageKey::Extract => "extract",
            StageKey::Class2d => "class2d",
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a cluster job record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal statuses: the status will never change again without a re-run.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }

    /// True for statuses that block a re-submission (the double-submit guard).
    pub fn is_in_flight(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;

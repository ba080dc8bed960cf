// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project: a light grouping entity used to resolve input job names and
//! allocate project-unique sequential job names.

use crate::owner::ProjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Monotonic counter; the next allocated job name is `{name}_J{next_job_seq}`.
    pub next_job_seq: u64,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            next_job_seq: 1,
        }
    }

    /// Allocate and return the next project-unique job name, advancing the counter.
    pub fn allocate_job_name(&mut self) -> String {
        let seq = self.next_job_seq;
        self.next_job_seq += 1;
        format!("{}_J{}", self.name, seq)
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;

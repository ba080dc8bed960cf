// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers for the entities that own sessions: projects and users.

crate::define_id! {
    /// Project grouping a set of sessions and their sequentially-named jobs.
    pub struct ProjectId;
}

crate::define_id! {
    /// User that created or owns a session (audit/authentication live outside this crate).
    pub struct UserId;
}

#[cfg(test)]
#[path = "owner_tests.rs"]
mod tests;

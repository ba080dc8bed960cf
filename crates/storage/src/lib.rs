// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for the pipeline orchestrator: materialized state, the
//! document-oriented [`SessionStore`] surface, and its WAL/snapshot-backed
//! and pure in-memory implementations.

mod memory_store;
mod ops;
mod snapshot;
mod state;
mod store;
mod wal;

pub mod durable_store;

pub use memory_store::InMemoryStore;
pub use snapshot::{Snapshot, SnapshotError};
pub use state::MaterializedState;
pub use store::{NewJob, SessionStore, StoreError};
pub use wal::{Wal, WalEntry, WalError};

pub use durable_store::DurableSessionStore;

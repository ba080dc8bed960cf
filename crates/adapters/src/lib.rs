// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the cluster scheduler, the filesystem watcher,
//! per-stage command builders, and the live-activity notifier.

pub mod cluster;
pub mod notifier;
pub mod stage_builder;
pub mod subprocess;
pub mod symlink;
pub mod watcher;

pub use cluster::{
    ClusterDriver, ClusterError, ClusterParams, JobDetails, StatusChange, SubmitOutcome,
};
pub use notifier::{BroadcastNotifier, LiveUpdate, Notifier};
pub use stage_builder::{
    Class2dBuilder, CtfBuilder, ExtractBuilder, ImportBuilder, MotionBuilder, PickBuilder,
    StageBuilder, ValidationError,
};
pub use watcher::{Watcher, WatcherError, WatcherEvent};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use cluster::{FakeClusterDriver, SubmitCall};
#[cfg(any(test, feature = "test-support"))]
pub use notifier::FakeNotifier;
#[cfg(any(test, feature = "test-support"))]
pub use watcher::FakeWatcher;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cryoflow Daemon (cryoflowd)
//!
//! Background process that owns the durable session store, drives every
//! active pipeline session, and exposes the control verbs over a Unix
//! domain socket. Normally started by the `cryoflow` CLI, not run directly.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod env;
mod lifecycle;
mod listener;
mod protocol;

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::config::Config;
use crate::lifecycle::{LifecycleError, StartupResult, StoreJournal};
use crate::listener::Listener;

const MAX_LOG_SIZE: u64 = 16 * 1024 * 1024;
const MAX_ROTATED_LOGS: usize = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("cryoflowd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("cryoflowd {}", env!("CARGO_PKG_VERSION"));
                println!("Background process driving live cryo-EM pipeline sessions.");
                println!();
                println!("USAGE:");
                println!("    cryoflowd");
                println!();
                println!("The daemon is typically started by the `cryoflow` CLI and should");
                println!("not be invoked directly. It listens on a Unix socket for commands.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: cryoflowd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    rotate_log_if_needed(&config.log_path);
    let _log_guard = setup_logging(&config)?;

    info!("starting cryoflow daemon");

    let StartupResult { lock, orchestrator, listener: unix_listener, resumed } =
        match lifecycle::startup(&config).await {
            Ok(result) => result,
            Err(LifecycleError::LockFailed(path, _)) => {
                let pid = std::fs::read_to_string(&path).unwrap_or_default().trim().to_string();
                eprintln!("cryoflowd is already running");
                if !pid.is_empty() {
                    eprintln!("  pid: {pid}");
                }
                std::process::exit(1);
            }
            Err(err) => {
                error!(error = %err, "failed to start daemon");
                return Err(Box::new(err) as Box<dyn std::error::Error>);
            }
        };

    if !resumed.is_empty() {
        info!(count = resumed.len(), "resumed in-flight sessions");
    }

    let orchestrator = Arc::new(orchestrator);
    let event_orchestrator = orchestrator.clone();
    tokio::spawn(async move {
        event_orchestrator.run_events(&StoreJournal(event_orchestrator.store())).await;
    });

    let server = Listener::new(unix_listener, orchestrator);
    tokio::spawn(server.run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %config.socket_path.display(), "daemon ready");
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    drop(lock);
    lifecycle::shutdown(&config);
    Ok(())
}

fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config.log_path.file_name().ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands: connects over the Unix socket, starting
//! `cryoflowd` in the background on first use if it isn't already running.

use crate::daemon_process::{cleanup_stale_socket, daemon_socket, start_daemon_background};
use cryoflow_daemon::{decode, encode, read_message, write_message, ProtocolError, Request, Response};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::UnixStream;

pub fn timeout_ipc() -> Duration {
    crate::env::timeout_ipc_ms().unwrap_or(Duration::from_secs(5))
}

pub fn timeout_connect() -> Duration {
    crate::env::timeout_connect_ms().unwrap_or(Duration::from_secs(5))
}

pub fn poll_interval() -> Duration {
    crate::env::connect_poll_ms().unwrap_or(Duration::from_millis(50))
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,
    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),
    #[error("timed out waiting for the daemon to start")]
    DaemonStartTimeout,
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("daemon reported an error: {0}")]
    Rejected(String),
    #[error("unexpected response from daemon")]
    UnexpectedResponse,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine a state directory")]
    NoStateDir,
}

async fn try_connect() -> std::io::Result<UnixStream> {
    let socket_path = daemon_socket().map_err(|_| std::io::Error::other("no state dir"))?;
    UnixStream::connect(&socket_path).await
}

async fn connect_or_start() -> Result<UnixStream, ClientError> {
    if let Ok(stream) = try_connect().await {
        return Ok(stream);
    }

    let socket_path = daemon_socket()?;
    cleanup_stale_socket(&socket_path);
    start_daemon_background()?;

    let deadline = Instant::now() + timeout_connect();
    loop {
        if let Ok(stream) = try_connect().await {
            return Ok(stream);
        }
        if Instant::now() >= deadline {
            return Err(ClientError::DaemonStartTimeout);
        }
        tokio::time::sleep(poll_interval()).await;
    }
}

pub async fn send(request: Request) -> Result<Response, ClientError> {
    let mut stream = connect_or_start().await?;
    let data = encode(&request)?;
    tokio::time::timeout(timeout_ipc(), write_message(&mut stream, &data))
        .await
        .map_err(|_| ClientError::DaemonStartTimeout)??;

    let bytes = tokio::time::timeout(timeout_ipc(), read_message(&mut stream))
        .await
        .map_err(|_| ClientError::DaemonStartTimeout)??;
    let response: Response = decode(&bytes)?;

    if let Response::Error { message } = response {
        return Err(ClientError::Rejected(message));
    }
    Ok(response)
}

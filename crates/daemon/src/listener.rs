// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket accept loop: one task per connection, dispatching each
//! decoded request to the orchestrator and writing back its response.

use crate::protocol::{self, ProtocolError, Request, Response, DEFAULT_TIMEOUT};
use cryoflow_adapters::{ClusterDriver, Notifier, Watcher};
use cryoflow_core::{Clock, IdGen};
use cryoflow_engine::Orchestrator;
use cryoflow_storage::SessionStore;
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

pub struct Listener<Store, Driver, Watch, Notify, Clk, Ids> {
    inner: UnixListener,
    orchestrator: Arc<Orchestrator<Store, Driver, Watch, Notify, Clk, Ids>>,
}

impl<Store, Driver, Watch, Notify, Clk, Ids> Listener<Store, Driver, Watch, Notify, Clk, Ids>
where
    Store: SessionStore + Send + Sync + 'static,
    Driver: ClusterDriver + Send + Sync + 'static,
    Watch: Watcher + Send + Sync + 'static,
    Notify: Notifier + Send + Sync + 'static,
    Clk: Clock + Send + Sync + 'static,
    Ids: IdGen + Send + Sync + 'static,
{
    pub fn new(
        inner: UnixListener,
        orchestrator: Arc<Orchestrator<Store, Driver, Watch, Notify, Clk, Ids>>,
    ) -> Self {
        Self { inner, orchestrator }
    }

    pub async fn run(self) {
        loop {
            match self.inner.accept().await {
                Ok((stream, _addr)) => {
                    let orchestrator = self.orchestrator.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, orchestrator).await {
                            debug!(error = %err, "connection ended");
                        }
                    });
                }
                Err(err) => {
                    error!(error = %err, "failed to accept connection");
                }
            }
        }
    }
}

async fn handle_connection<Store, Driver, Watch, Notify, Clk, Ids>(
    mut stream: UnixStream,
    orchestrator: Arc<Orchestrator<Store, Driver, Watch, Notify, Clk, Ids>>,
) -> Result<(), ProtocolError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Watch: Watcher,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    loop {
        let request = match protocol::read_request(&mut stream, DEFAULT_TIMEOUT).await {
            Ok(request) => request,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err),
        };
        let response = dispatch(&orchestrator, request).await;
        protocol::write_response(&mut stream, &response, DEFAULT_TIMEOUT).await?;
    }
}

async fn dispatch<Store, Driver, Watch, Notify, Clk, Ids>(
    orchestrator: &Orchestrator<Store, Driver, Watch, Notify, Clk, Ids>,
    request: Request,
) -> Response
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Watch: Watcher,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    let result = match request {
        Request::Ping => return Response::Pong,
        Request::CreateProject { project_id, name } => {
            orchestrator.create_project(project_id, name).await.map(|_| Response::Ok)
        }
        Request::Create {
            project_id, user_id, session_name, input_mode, watch_directory, file_pattern, config,
        } => {
            orchestrator
                .create(project_id, user_id, session_name, input_mode, watch_directory, file_pattern, config)
                .await
                .map(Response::Session)
        }
        Request::Start { session_id } => orchestrator.start(&session_id).await.map(|_| Response::Ok),
        Request::Pause { session_id } => orchestrator.pause(&session_id).await.map(|_| Response::Ok),
        Request::Resume { session_id } => orchestrator.resume(&session_id).await.map(|_| Response::Ok),
        Request::Stop { session_id } => orchestrator.stop(&session_id).await.map(|_| Response::Ok),
        Request::Delete { session_id } => orchestrator.delete(&session_id).await.map(|_| Response::Ok),
        Request::Get { session_id } => orchestrator.get(&session_id).await.map(Response::Session),
        Request::Stats { session_id } => orchestrator.stats(&session_id).await.map(Response::Stats),
        Request::Exposures { session_id } => orchestrator.exposures(&session_id).await.map(Response::Exposures),
        Request::Activity { session_id } => orchestrator.activity(&session_id).await.map(Response::Activity),
        Request::ListByProject { project_id } => {
            orchestrator.list_by_project(&project_id).await.map(Response::Sessions)
        }
    };

    match result {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "request failed");
            Response::Error { message: err.to_string() }
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;

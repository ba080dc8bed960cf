// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;
use cryoflow_core::{InputMode, ProjectId, SessionConfig, SessionId, UserId};
use cryoflow_daemon::{Request, Response};
use std::path::PathBuf;

#[allow(clippy::too_many_arguments)]
pub async fn create(
    project_id: String,
    user_id: String,
    session_name: String,
    watch_directory: PathBuf,
    file_pattern: String,
    existing: bool,
) -> Result<()> {
    let input_mode = if existing { InputMode::Existing } else { InputMode::Watch };
    let response = crate::client::send(Request::Create {
        project_id: ProjectId::new(project_id),
        user_id: UserId::new(user_id),
        session_name,
        input_mode,
        watch_directory,
        file_pattern,
        config: SessionConfig::default(),
    })
    .await?;
    match response {
        Response::Session(session) => print_json(&session),
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}

pub async fn start(session_id: String) -> Result<()> {
    ok_or_bail(crate::client::send(Request::Start { session_id: SessionId::new(session_id) }).await?)
}

pub async fn pause(session_id: String) -> Result<()> {
    ok_or_bail(crate::client::send(Request::Pause { session_id: SessionId::new(session_id) }).await?)
}

pub async fn resume(session_id: String) -> Result<()> {
    ok_or_bail(crate::client::send(Request::Resume { session_id: SessionId::new(session_id) }).await?)
}

pub async fn stop(session_id: String) -> Result<()> {
    ok_or_bail(crate::client::send(Request::Stop { session_id: SessionId::new(session_id) }).await?)
}

pub async fn delete(session_id: String) -> Result<()> {
    ok_or_bail(crate::client::send(Request::Delete { session_id: SessionId::new(session_id) }).await?)
}

pub async fn get(session_id: String) -> Result<()> {
    match crate::client::send(Request::Get { session_id: SessionId::new(session_id) }).await? {
        Response::Session(session) => print_json(&session),
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}

pub async fn stats(session_id: String) -> Result<()> {
    match crate::client::send(Request::Stats { session_id: SessionId::new(session_id) }).await? {
        Response::Stats(stats) => print_json(&stats),
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}

pub async fn exposures(session_id: String) -> Result<()> {
    match crate::client::send(Request::Exposures { session_id: SessionId::new(session_id) }).await? {
        Response::Exposures(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
            Ok(())
        }
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}

pub async fn activity(session_id: String) -> Result<()> {
    match crate::client::send(Request::Activity { session_id: SessionId::new(session_id) }).await? {
        Response::Activity(entries) => print_json(&entries),
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}

pub async fn list(project_id: String) -> Result<()> {
    match crate::client::send(Request::ListByProject { project_id: ProjectId::new(project_id) }).await? {
        Response::Sessions(sessions) => print_json(&sessions),
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}

fn ok_or_bail(response: Response) -> Result<()> {
    match response {
        Response::Ok => {
            println!("ok");
            Ok(())
        }
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

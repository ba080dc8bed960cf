// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;
use cryoflow_core::ProjectId;
use cryoflow_daemon::{Request, Response};

pub async fn create(project_id: String, name: String) -> Result<()> {
    let response = crate::client::send(Request::CreateProject {
        project_id: ProjectId::new(project_id),
        name,
    })
    .await?;
    match response {
        Response::Ok => {
            println!("project created");
            Ok(())
        }
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}

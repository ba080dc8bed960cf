// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client for the cryoflow daemon's control verbs.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;
mod env;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cryoflow", about = "Control a cryoflow daemon session")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a project to hold sessions.
    CreateProject {
        project_id: String,
        name: String,
    },
    /// Create a new pipeline session under a project.
    Create {
        project_id: String,
        user_id: String,
        session_name: String,
        watch_directory: PathBuf,
        #[arg(long, default_value = "*.tiff")]
        file_pattern: String,
        /// Scan the directory once instead of watching it indefinitely.
        #[arg(long)]
        existing: bool,
    },
    /// Begin or resume driving a session through the pipeline.
    Start { session_id: String },
    /// Pause a running session; its watcher stops but no jobs are cancelled.
    Pause { session_id: String },
    /// Resume a paused session.
    Resume { session_id: String },
    /// Stop a session, cancelling any in-flight jobs.
    Stop { session_id: String },
    /// Stop (if needed) and permanently remove a session.
    Delete { session_id: String },
    /// Print a session's full record.
    Get { session_id: String },
    /// Print a session's rolled-up pipeline counters.
    Stats { session_id: String },
    /// List the movie/micrograph files a session has collected.
    Exposures { session_id: String },
    /// Print a session's activity log.
    Activity { session_id: String },
    /// List every session under a project.
    List { project_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::CreateProject { project_id, name } => commands::project::create(project_id, name).await,
        Command::Create { project_id, user_id, session_name, watch_directory, file_pattern, existing } => {
            commands::session::create(project_id, user_id, session_name, watch_directory, file_pattern, existing)
                .await
        }
        Command::Start { session_id } => commands::session::start(session_id).await,
        Command::Pause { session_id } => commands::session::pause(session_id).await,
        Command::Resume { session_id } => commands::session::resume(session_id).await,
        Command::Stop { session_id } => commands::session::stop(session_id).await,
        Command::Delete { session_id } => commands::session::delete(session_id).await,
        Command::Get { session_id } => commands::session::get(session_id).await,
        Command::Stats { session_id } => commands::session::stats(session_id).await,
        Command::Exposures { session_id } => commands::session::exposures(session_id).await,
        Command::Activity { session_id } => commands::session::activity(session_id).await,
        Command::List { project_id } => commands::session::list(project_id).await,
    };

    if let Err(err) = &result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    result
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives one pipeline pass per session: walks the main line one stage at a
//! time, submits or re-submits a stage once its upstream counter has moved
//! past what it last processed, reconciles counters on completion, enriches
//! failures with a bounded log excerpt, and checks the Class2D trigger once
//! the pass is otherwise quiescent. A pass holds the session's `busy` flag
//! from the first stage it advances until it finds nothing left to do, so
//! stages never run two at a time for one session; a trigger that arrives
//! mid-pass is coalesced into the next one via `pending_rerun`.

use crate::class2d;
use crate::error::OrchestratorError;
use crate::params;
use crate::registry::{Admission, Registry};
use crate::stats;
use crate::tail;
use cryoflow_adapters::{ClusterDriver, ClusterParams, LiveUpdate, Notifier, StageBuilder};
use cryoflow_core::{
    ActivityContext, ActivityEntry, ActivityLevel, Clock, ExecutionMode, IdGen, InputMode, JobId,
    JobStatus, PassSnapshot, PipelineStats, Session, SessionId, SessionState, SessionStatus,
    StageKey, MAIN_LINE,
};
use cryoflow_storage::{NewJob, SessionStore};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const STDERR_TAIL_BUDGET: u64 = 8 * 1024;
const STDERR_TAIL_LINES: usize = 20;
const STDOUT_SCAN_BUDGET: u64 = 32 * 1024;
const STDOUT_SCAN_KEEP: usize = 10;
const ERROR_KEYWORDS: &[&str] = &["error", "fatal", "segmentation", "killed", "oom"];

/// Accumulates the raw file paths a session's Import stage has been told
/// about, since the watcher only reports counts past this point and the
/// Import stage builder needs paths on every (re)submission. Session-scoped,
/// rebuilt from the watcher's own rescan on restart rather than persisted.
#[derive(Default)]
pub(crate) struct FileRegistry {
    files: Mutex<HashMap<SessionId, Vec<PathBuf>>>,
}

impl FileRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn extend(&self, session_id: &SessionId, batch: Vec<PathBuf>) {
        self.files.lock().entry(session_id.clone()).or_default().extend(batch);
    }

    pub(crate) fn snapshot(&self, session_id: &SessionId) -> Vec<PathBuf> {
        self.files.lock().get(session_id).cloned().unwrap_or_default()
    }

    pub(crate) fn remove(&self, session_id: &SessionId) {
        self.files.lock().remove(session_id);
    }
}

fn stage_output_dir(project_dir: &Path, builder: &dyn StageBuilder, job_name: &str) -> PathBuf {
    project_dir.join(builder.get_output_dir(job_name))
}

fn upstream_counter(state: &SessionState, stage: StageKey) -> u64 {
    match stage {
        StageKey::Import => state.movies_found,
        StageKey::Motion => state.movies_imported,
        StageKey::Ctf => state.movies_motion,
        StageKey::Pick => state.movies_ctf,
        StageKey::Extract => state.movies_picked,
        StageKey::Class2d => state.particles_extracted,
    }
}

fn own_counter(state: &SessionState, stage: StageKey) -> u64 {
    match stage {
        StageKey::Import => state.movies_imported,
        StageKey::Motion => state.movies_motion,
        StageKey::Ctf => state.movies_ctf,
        StageKey::Pick => state.movies_picked,
        StageKey::Extract => state.particles_extracted,
        StageKey::Class2d => 0,
    }
}

fn set_own_counter(state: &mut SessionState, stage: StageKey, value: u64) {
    let field = match stage {
        StageKey::Import => &mut state.movies_imported,
        StageKey::Motion => &mut state.movies_motion,
        StageKey::Ctf => &mut state.movies_ctf,
        StageKey::Pick => &mut state.movies_picked,
        StageKey::Extract => &mut state.particles_extracted,
        StageKey::Class2d => return,
    };
    *field = (*field).max(value);
}

fn stage_enabled(config: &cryoflow_core::SessionConfig, stage: StageKey) -> bool {
    match stage {
        StageKey::Import => true,
        StageKey::Motion => config.motion_config.enabled,
        StageKey::Ctf => config.ctf_config.enabled,
        StageKey::Pick => config.picking_config.enabled,
        StageKey::Extract => config.extraction_config.enabled,
        StageKey::Class2d => config.class2d_config.enabled,
    }
}

async fn emit<Notify: Notifier, Store: SessionStore>(
    store: &Store,
    notifier: &Notify,
    session: &Session,
    event: &str,
    level: ActivityLevel,
    message: impl Into<String>,
    context: Option<ActivityContext>,
    now_ms: u64,
) -> Result<(), OrchestratorError> {
    let message = message.into();
    let entry = ActivityEntry { level, message: message.clone(), created_at_ms: now_ms, context: context.clone() };
    store.push_activity(&session.id, entry).await?;
    notifier.publish(
        &session.project_id,
        LiveUpdate {
            session_id: session.id.clone(),
            event: event.to_string(),
            level,
            data: json!({ "message": message, "context": context }),
            timestamp_ms: now_ms,
        },
    );
    Ok(())
}

/// Resolves a previous stage's job name for input chaining, `None` at the
/// head of the main line.
async fn previous_job_name<Store: SessionStore>(
    store: &Store,
    session: &Session,
    stage: StageKey,
) -> Result<Option<String>, OrchestratorError> {
    let Some(previous) = stage.previous() else {
        return Ok(None);
    };
    let Some(job_id) = session.jobs.slot_for(previous) else {
        return Ok(None);
    };
    Ok(store.get_job(job_id).await?.map(|j| j.job_name))
}

/// Submits or re-submits one main-line stage, reusing its persistent job
/// slot. Validation failures are recovered locally: they skip the stage with
/// a warning activity rather than propagating as an orchestrator error.
/// Returns whether the stage is now in flight, so the caller can tell that
/// from a validation skip or a submit failure that paused the session.
#[allow(clippy::too_many_arguments)]
async fn submit_stage<Store, Driver, Notify, Clk, Ids>(
    store: &Store,
    driver: &Driver,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    files: &FileRegistry,
    project_dir: &Path,
    session: &Session,
    stage: StageKey,
) -> Result<bool, OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    let previous_job_name = previous_job_name(store, session, stage).await?;
    let batch = if stage == StageKey::Import {
        files.snapshot(&session.id)
    } else {
        Vec::new()
    };
    let builder = params::build_stage_builder(stage, &session.config, previous_job_name.as_deref(), batch);

    let now = clock.epoch_ms();
    if let Err(err) = builder.validate() {
        emit(
            store,
            notifier,
            session,
            "stage_skipped",
            ActivityLevel::Warning,
            format!("{stage}: {err}"),
            None,
            now,
        )
        .await?;
        return Ok(false);
    }

    let job_name = store.allocate_job_name(&session.project_id).await?;
    let output_dir = stage_output_dir(project_dir, builder.as_ref(), &job_name);
    let command = builder.build_command(&output_dir, &job_name).join(" ");
    let input_job_ids = store
        .resolve_job_ids_by_name(&session.project_id, &builder.get_input_job_names())
        .await?;
    let cluster_params = params::derive_cluster_params(stage, builder.as_ref(), &session.config.slurm_config);

    let existing_slot = session.jobs.slot_for(stage).cloned();
    let job_id = match &existing_slot {
        Some(id) => {
            store.reset_job_for_rerun(id, command.clone(), Default::default()).await?;
            id.clone()
        }
        None => {
            let id = JobId::new(ids.next());
            store
                .insert_job(NewJob {
                    id: id.clone(),
                    project_id: session.project_id.clone(),
                    user_id: session.user_id.clone(),
                    session_id: session.id.clone(),
                    job_name: job_name.clone(),
                    job_type: stage,
                    output_dir: output_dir.clone(),
                    command: command.clone(),
                    parameters: Default::default(),
                    input_job_ids,
                    execution_mode: ExecutionMode::Slurm,
                    created_at_ms: now,
                })
                .await?;
            store.set_session_job_slot(&session.id, stage, id.clone()).await?;
            id
        }
    };

    match driver
        .submit(&job_id, &command, &job_name, project_dir, &output_dir, &cluster_params)
        .await
    {
        Ok(outcome) => {
            store.set_job_cluster_id(&job_id, outcome.cluster_job_id).await?;
            store.mark_job_running(&job_id, now).await?;
            if session.state.resume_from == Some(stage) {
                let mut state = session.state.clone();
                state.resume_from = None;
                store.set_session_state(&session.id, state).await?;
            }
            emit(
                store,
                notifier,
                session,
                "stage_submitted",
                ActivityLevel::Info,
                format!("{stage} submitted as {job_name}"),
                Some(ActivityContext::StageSubmitted { job_id, stage }),
                now,
            )
            .await?;
            Ok(true)
        }
        Err(err) => {
            store.mark_job_failed(&job_id, now, err.to_string()).await?;
            pause_for_failure(store, notifier, session, stage, now).await?;
            Ok(false)
        }
    }
}

async fn pause_for_failure<Store: SessionStore, Notify: Notifier>(
    store: &Store,
    notifier: &Notify,
    session: &Session,
    stage: StageKey,
    now_ms: u64,
) -> Result<(), OrchestratorError> {
    let mut state = session.state.clone();
    state.resume_from = Some(stage);
    store.set_session_state(&session.id, state).await?;
    store.set_session_status(&session.id, SessionStatus::Paused).await?;
    emit(
        store,
        notifier,
        session,
        "session_paused",
        ActivityLevel::Error,
        format!("{stage} submission failed; session paused"),
        None,
        now_ms,
    )
    .await
}

/// What one call to [`run_pass_once`] found. Only `Quiescent` means the pass
/// is actually done: nothing is in flight and nothing is waiting to advance.
enum PassOutcome {
    /// A stage is now in flight (just submitted, or was already running);
    /// the session's `busy` flag must stay held until the next event.
    Advancing,
    /// The session isn't running; there was nothing to do.
    Idle,
    /// The main line and Class2D have both caught up; the pass is complete.
    Quiescent,
}

/// Runs the session's pipeline pass once, advancing at most one stage: the
/// first stage whose upstream counter has moved past what it last processed
/// and that isn't already in flight.
#[allow(clippy::too_many_arguments)]
async fn run_pass_once<Store, Driver, Notify, Clk, Ids>(
    store: &Store,
    driver: &Driver,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    files: &FileRegistry,
    project_dir: &Path,
    session_id: &SessionId,
) -> Result<PassOutcome, OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    let mut session = store
        .get_session(session_id)
        .await?
        .ok_or_else(|| OrchestratorError::SessionNotFound(session_id.clone()))?;
    if session.status != SessionStatus::Running {
        return Ok(PassOutcome::Idle);
    }

    for stage in MAIN_LINE {
        if !stage_enabled(&session.config, stage) {
            // Pass through: a disabled stage never runs, so its counter just
            // tracks whatever its upstream already reached.
            let upstream = upstream_counter(&session.state, stage);
            if upstream > own_counter(&session.state, stage) {
                set_own_counter(&mut session.state, stage, upstream);
                store.set_session_state(session_id, session.state.clone()).await?;
            }
            continue;
        }
        if let Some(job_id) = session.jobs.slot_for(stage) {
            if let Some(job) = store.get_job(job_id).await? {
                if job.status.is_in_flight() {
                    return Ok(PassOutcome::Advancing);
                }
            }
        }
        // A `Failed` job here only happens right after `resume`: the failed
        // submission never advanced the own counter, so falling through
        // resubmits exactly this stage via `submit_stage`'s reset path.
        let upstream = upstream_counter(&session.state, stage);
        let own = own_counter(&session.state, stage);
        if upstream > own {
            let submitted =
                submit_stage(store, driver, notifier, clock, ids, files, project_dir, &session, stage).await?;
            return Ok(if submitted { PassOutcome::Advancing } else { PassOutcome::Idle });
        }
    }

    if maybe_trigger_class2d(store, driver, notifier, clock, ids, project_dir, &session).await? {
        return Ok(PassOutcome::Advancing);
    }
    if let Some(job_id) = session.jobs.slot_for(StageKey::Class2d) {
        if let Some(job) = store.get_job(job_id).await? {
            if job.status.is_in_flight() {
                return Ok(PassOutcome::Advancing);
            }
        }
    }
    Ok(PassOutcome::Quiescent)
}

/// Submits a Class2D batch if it's due. Returns whether a job was submitted,
/// so the caller can tell "nothing to do right now" from "just went busy."
#[allow(clippy::too_many_arguments)]
async fn maybe_trigger_class2d<Store, Driver, Notify, Clk, Ids>(
    store: &Store,
    driver: &Driver,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    project_dir: &Path,
    session: &Session,
) -> Result<bool, OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    if !session.config.class2d_config.enabled {
        return Ok(false);
    }
    let now = clock.epoch_ms();
    if !class2d::should_trigger(&session.state, &session.config.class2d_config, now) {
        return Ok(false);
    }

    let previous_job_name = previous_job_name(store, session, StageKey::Class2d).await?;
    let builder = params::build_stage_builder(StageKey::Class2d, &session.config, previous_job_name.as_deref(), Vec::new());
    if let Err(err) = builder.validate() {
        emit(
            store,
            notifier,
            session,
            "stage_skipped",
            ActivityLevel::Warning,
            format!("class2d: {err}"),
            None,
            now,
        )
        .await?;
        return Ok(false);
    }

    let job_name = store.allocate_job_name(&session.project_id).await?;
    let output_dir = stage_output_dir(project_dir, builder.as_ref(), &job_name);
    let command = builder.build_command(&output_dir, &job_name).join(" ");
    let input_job_ids = store
        .resolve_job_ids_by_name(&session.project_id, &builder.get_input_job_names())
        .await?;
    let cluster_params = params::derive_cluster_params(StageKey::Class2d, builder.as_ref(), &session.config.slurm_config);
    let job_id = JobId::new(ids.next());

    store
        .insert_job(NewJob {
            id: job_id.clone(),
            project_id: session.project_id.clone(),
            user_id: session.user_id.clone(),
            session_id: session.id.clone(),
            job_name: job_name.clone(),
            job_type: StageKey::Class2d,
            output_dir: output_dir.clone(),
            command: command.clone(),
            parameters: Default::default(),
            input_job_ids,
            execution_mode: ExecutionMode::Slurm,
            created_at_ms: now,
        })
        .await?;
    store.set_session_job_slot(&session.id, StageKey::Class2d, job_id.clone()).await?;

    match driver
        .submit(&job_id, &command, &job_name, project_dir, &output_dir, &cluster_params)
        .await
    {
        Ok(outcome) => {
            store.set_job_cluster_id(&job_id, outcome.cluster_job_id).await?;
            store.mark_job_running(&job_id, now).await?;
            let mut state = session.state.clone();
            state.last_batch_2d_ms = Some(now);
            store.set_session_state(&session.id, state).await?;
            emit(
                store,
                notifier,
                session,
                "stage_submitted",
                ActivityLevel::Info,
                format!("class2d batch submitted as {job_name}"),
                Some(ActivityContext::StageSubmitted { job_id, stage: StageKey::Class2d }),
                now,
            )
            .await?;
            Ok(true)
        }
        Err(err) => {
            store.mark_job_failed(&job_id, now, err.to_string()).await?;
            emit(
                store,
                notifier,
                session,
                "stage_failed",
                ActivityLevel::Warning,
                format!("class2d batch submission failed: {err}"),
                None,
                now,
            )
            .await?;
            Ok(false)
        }
    }
}

/// Marks one pass complete once [`run_pass_once`] finds nothing left to
/// advance: bumps `pass_count`, snapshots the counters into `pass_history`,
/// emits `pipeline_complete`, and (for `existing`-mode sessions) completes
/// the session now that nothing is left running.
async fn on_pipeline_pass_complete<Store: SessionStore, Notify: Notifier, Clk: Clock>(
    store: &Store,
    notifier: &Notify,
    clock: &Clk,
    session_id: &SessionId,
) -> Result<(), OrchestratorError> {
    let Some(session) = store.get_session(session_id).await? else {
        return Ok(());
    };
    if session.status != SessionStatus::Running {
        return Ok(());
    }
    let now = clock.epoch_ms();

    let mut state = session.state.clone();
    state.pass_count += 1;
    let snapshot = PassSnapshot {
        pass_number: state.pass_count,
        finished_at_ms: now,
        movies_found: state.movies_found,
        movies_imported: state.movies_imported,
        movies_motion: state.movies_motion,
        movies_ctf: state.movies_ctf,
        movies_picked: state.movies_picked,
        particles_extracted: state.particles_extracted,
        triggered_rerun: state.movies_found > state.movies_at_pass_start,
    };
    state.movies_at_pass_start = state.movies_found;
    store.set_session_state(session_id, state.clone()).await?;
    store.push_pass_snapshot(session_id, snapshot).await?;
    emit(
        store,
        notifier,
        &session,
        "pipeline_complete",
        ActivityLevel::Info,
        format!("pass {} complete", state.pass_count),
        None,
        now,
    )
    .await?;

    if session.input_mode == InputMode::Existing {
        store.set_session_status(session_id, SessionStatus::Completed).await?;
        store.set_session_end_time(session_id, now).await?;
        emit(
            store,
            notifier,
            &session,
            "session_completed",
            ActivityLevel::Info,
            "existing-mode session completed: all stages caught up",
            None,
            now,
        )
        .await?;
    }
    Ok(())
}

/// Runs an already-admitted pass to completion: loops [`run_pass_once`]
/// until it either goes in flight (`Advancing`, returns with `busy` still
/// held) or finds nothing left to do (`Quiescent`, runs pass-complete
/// bookkeeping and releases `busy`). A `pending_rerun` queued while this ran
/// is checked exactly at the quiescent point, before declaring the pass
/// done, so a trigger that arrives mid-pass gets folded into one more
/// `run_pass_once` call instead of starting a second, concurrent pass.
#[allow(clippy::too_many_arguments)]
async fn continue_pipeline_pass<Store, Driver, Notify, Clk, Ids>(
    registry: &Registry,
    store: &Store,
    driver: &Driver,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    files: &FileRegistry,
    project_dir: &Path,
    session_id: &SessionId,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    loop {
        match run_pass_once(store, driver, notifier, clock, ids, files, project_dir, session_id).await {
            Err(err) => {
                registry.force_clear_busy(session_id);
                return Err(err);
            }
            Ok(PassOutcome::Advancing) => return Ok(()),
            Ok(PassOutcome::Idle) => {
                registry.force_clear_busy(session_id);
                return Ok(());
            }
            Ok(PassOutcome::Quiescent) => {
                if registry.release_and_check_rerun(session_id) {
                    continue;
                }
                if let Err(err) = on_pipeline_pass_complete(store, notifier, clock, session_id).await {
                    registry.force_clear_busy(session_id);
                    return Err(err);
                }
                return Ok(());
            }
        }
    }
}

/// Entry point for triggering a new pass: admits via [`Registry`], queuing a
/// `pending_rerun` instead of running if a pass for this session is already
/// in progress.
#[allow(clippy::too_many_arguments)]
pub async fn trigger_pipeline_pass<Store, Driver, Notify, Clk, Ids>(
    registry: &Registry,
    store: &Store,
    driver: &Driver,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    files: &FileRegistry,
    project_dir: &Path,
    session_id: &SessionId,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    if matches!(registry.admit(session_id), Admission::Queued) {
        return Ok(());
    }
    continue_pipeline_pass(registry, store, driver, notifier, clock, ids, files, project_dir, session_id).await
}

/// Records a batch of newly-stable files, raises the watcher-derived counter
/// with MAX semantics, and triggers a pass.
#[allow(clippy::too_many_arguments)]
pub async fn on_files_added<Store, Driver, Notify, Clk, Ids>(
    registry: &Registry,
    store: &Store,
    driver: &Driver,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    files: &FileRegistry,
    project_dir: &Path,
    session_id: &SessionId,
    batch: Vec<PathBuf>,
    count: u64,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    files.extend(session_id, batch);
    store.raise_movies_found(session_id, count).await?;
    if let Some(session) = store.get_session(session_id).await? {
        let now = clock.epoch_ms();
        emit(
            store,
            notifier,
            &session,
            "files_discovered",
            ActivityLevel::Info,
            format!("{count} files discovered"),
            Some(ActivityContext::FilesDiscovered { count }),
            now,
        )
        .await?;
    }
    trigger_pipeline_pass(registry, store, driver, notifier, clock, ids, files, project_dir, session_id).await
}

/// `existing`-mode scan found nothing: the session has no work to do and
/// completes immediately.
pub async fn on_no_files<Store: SessionStore, Notify: Notifier, Clk: Clock>(
    store: &Store,
    notifier: &Notify,
    clock: &Clk,
    session_id: &SessionId,
) -> Result<(), OrchestratorError> {
    let Some(session) = store.get_session(session_id).await? else {
        return Ok(());
    };
    let now = clock.epoch_ms();
    store.set_session_status(session_id, SessionStatus::Completed).await?;
    store.set_session_end_time(session_id, now).await?;
    emit(
        store,
        notifier,
        &session,
        "session_completed",
        ActivityLevel::Info,
        "no files found in existing-mode directory",
        None,
        now,
    )
    .await
}

/// A cluster job reached a terminal state: reconciles counters on success,
/// pauses the session with a log excerpt on failure, then triggers a pass.
#[allow(clippy::too_many_arguments)]
pub async fn on_status_change<Store, Driver, Notify, Clk, Ids>(
    registry: &Registry,
    store: &Store,
    driver: &Driver,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    files: &FileRegistry,
    project_dir: &Path,
    job_id: &JobId,
    cluster_job_id: &str,
    status: JobStatus,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    let Some(job) = store.get_job(job_id).await? else {
        return Ok(());
    };
    let Some(session) = store.find_session_by_job_id(job_id).await? else {
        return Ok(());
    };
    let now = clock.epoch_ms();

    match status {
        JobStatus::Success => {
            // Trust the job's own reported count over what the pass expected;
            // a tool that silently dropped input produces a lower count here
            // without failing the job itself.
            let expected = upstream_counter(&session.state, job.job_type);
            let actual = stats::read_stage_counter(&job.output_dir, job.job_type).unwrap_or(expected);
            let pipeline_stats = if job.job_type == StageKey::Extract {
                PipelineStats { particle_count: Some(actual), ..PipelineStats::default() }
            } else {
                PipelineStats { micrograph_count: Some(actual), ..PipelineStats::default() }
            };
            store.mark_job_success(job_id, now, pipeline_stats.clone()).await?;
            if job.job_type != StageKey::Class2d {
                let mut state = session.state.clone();
                set_own_counter(&mut state, job.job_type, actual);
                store.set_session_state(&session.id, state).await?;
            }
            emit(
                store,
                notifier,
                &session,
                "stage_completed",
                ActivityLevel::Info,
                format!("{} completed", job.job_type),
                Some(ActivityContext::StageCompleted { job_id: job_id.clone(), stage: job.job_type, stats: pipeline_stats }),
                now,
            )
            .await?;
            if job.job_type != StageKey::Class2d && actual < expected {
                let gap = expected - actual;
                emit(
                    store,
                    notifier,
                    &session,
                    "pipeline_rerun",
                    ActivityLevel::Warning,
                    format!("{}: gap={gap}", job.job_type),
                    Some(ActivityContext::CountMismatch { stage: job.job_type, expected, actual }),
                    now,
                )
                .await?;
            }
        }
        JobStatus::Failed => {
            let excerpt = enrich_failure(driver, &job.output_dir, cluster_job_id).await;
            store.mark_job_failed(job_id, now, excerpt.clone()).await?;
            pause_for_failure(store, notifier, &session, job.job_type, now).await?;
            emit(
                store,
                notifier,
                &session,
                "stage_failed",
                ActivityLevel::Error,
                format!("{} failed", job.job_type),
                Some(ActivityContext::StageFailed { job_id: job_id.clone(), stage: job.job_type, error_excerpt: excerpt }),
                now,
            )
            .await?;
            // The session is paused, not mid-pass any more: release `busy`
            // now so a later `resume` can admit a fresh pass.
            registry.force_clear_busy(&session.id);
            return Ok(());
        }
        JobStatus::Cancelled => {
            store.mark_job_cancelled(job_id, now).await?;
            registry.force_clear_busy(&session.id);
            return Ok(());
        }
        JobStatus::Pending | JobStatus::Running => return Ok(()),
    }

    // Continuing the pass that submitted this job, not starting a new one:
    // `busy` was held since that submission and must stay held until the
    // main line (and Class2D) are quiescent, not released and re-admitted
    // here, or a concurrent trigger could slip a second stage into flight.
    registry.ensure_busy(&session.id);
    continue_pipeline_pass(registry, store, driver, notifier, clock, ids, files, project_dir, &session.id).await
}

/// Best-effort log excerpt for a failed job: an 8KB tail of the last 20
/// lines, plus a 32KB scan for error-like keywords. Errors reading the log
/// (missing file, permissions) degrade to an empty excerpt rather than
/// failing the whole status-change handler.
async fn enrich_failure<Driver: ClusterDriver>(_driver: &Driver, output_dir: &Path, cluster_job_id: &str) -> String {
    let log_path = output_dir.join(format!("slurm-{cluster_job_id}.out"));
    let stderr_preview = tail::tail_lines(&log_path, STDERR_TAIL_BUDGET, STDERR_TAIL_LINES).unwrap_or_default();
    let relion_errors = tail::tail_matching(&log_path, STDOUT_SCAN_BUDGET, ERROR_KEYWORDS, STDOUT_SCAN_KEEP).unwrap_or_default();
    if relion_errors.is_empty() {
        stderr_preview.join("\n")
    } else {
        relion_errors.join("\n")
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

//! The load_tests phase. Standalone and coordinator nodes own the
//! lifecycle row and the delivery pipeline; workers only pre-reduce
//! their event stream and ship partials upstream.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::args::WorkerRole;
use crate::config::RunnerConfig;
use crate::distributed::coordinator::{spawn_coordinator, CoordinatorParams};
use crate::distributed::worker::{spawn_worker, WorkerParams};
use crate::error::{AppError, AppResult, LifecycleError};
use crate::ingest::{spawn_stdin_events, spawn_stdin_reports, spawn_stdout_reports, SharedUserGauge};
use crate::lifecycle::instance;
use crate::lifecycle::state::InstanceType;
use crate::lifecycle::supervisor::spawn_supervisor;
use crate::lifecycle::tracker::LifecycleTracker;
use crate::metrics::collector::{spawn_collector, CollectorParams, CollectorReport};
use crate::store::{InstanceUpdate, ResultStore};

const CHANNEL_DEPTH: usize = 1024;

/// # Errors
///
/// Propagates store, lifecycle and task failures; an externally failed
/// execution surfaces as [`LifecycleError::Aborted`].
pub async fn run(config: &RunnerConfig, store: Arc<dyn ResultStore>) -> AppResult<()> {
    match config.role {
        WorkerRole::Worker => run_worker_node(config).await,
        WorkerRole::Standalone | WorkerRole::Coordinator => {
            run_aggregating_node(config, store).await
        }
    }
}

async fn run_worker_node(config: &RunnerConfig) -> AppResult<()> {
    let (shutdown_tx, _keep_shutdown) = broadcast::channel(1);
    let (abort_tx, _keep_abort) = broadcast::channel(1);
    let (events_tx, events_rx) = mpsc::channel(CHANNEL_DEPTH);
    let (reports_tx, reports_rx) = mpsc::channel(CHANNEL_DEPTH);

    let gauge = SharedUserGauge::new();
    let reader = spawn_stdin_events(events_tx, gauge.clone());
    let writer = spawn_stdout_reports(reports_rx);
    let pipeline = spawn_worker(
        WorkerParams {
            execution_id: config.execution_id.clone(),
            worker_id: config.worker_id.clone(),
            window_interval: config.window_interval,
        },
        gauge,
        &shutdown_tx,
        &abort_tx,
        events_rx,
        reports_tx,
    );

    let summary = pipeline.await?;
    reader.await?;
    writer.await?;
    tracing::info!(
        "Worker {} shipped {} windows",
        config.worker_id,
        summary.windows_shipped
    );
    Ok(())
}

async fn run_aggregating_node(config: &RunnerConfig, store: Arc<dyn ResultStore>) -> AppResult<()> {
    instance::get_or_create(store.as_ref(), &config.execution_id, InstanceType::LoadTests).await?;

    let tracker = LifecycleTracker::new(config.execution_id.clone(), store.clone());
    tracker.refresh().await?;
    tracker.mark_running().await?;

    let (shutdown_tx, _keep_shutdown) = broadcast::channel(1);
    let (abort_tx, _keep_abort) = broadcast::channel(1);
    let supervisor = spawn_supervisor(
        store.clone(),
        config.execution_id.clone(),
        config.supervisor_interval,
        abort_tx.clone(),
        &shutdown_tx,
    );

    let gauge = SharedUserGauge::new();
    let (report, reader) = match config.role {
        WorkerRole::Coordinator => {
            let (reports_tx, reports_rx) = mpsc::channel(CHANNEL_DEPTH);
            let reader = spawn_stdin_reports(reports_tx);
            let pipeline = spawn_coordinator(
                CoordinatorParams {
                    execution_id: config.execution_id.clone(),
                    window_interval: config.window_interval,
                    user_decay: config.user_decay,
                    flush_wait: config.flush_wait,
                },
                store.clone(),
                gauge,
                &shutdown_tx,
                &abort_tx,
                reports_rx,
            );
            (pipeline.await?, reader)
        }
        WorkerRole::Standalone | WorkerRole::Worker => {
            let (events_tx, events_rx) = mpsc::channel(CHANNEL_DEPTH);
            let reader = spawn_stdin_events(events_tx, gauge.clone());
            let pipeline = spawn_collector(
                CollectorParams {
                    execution_id: config.execution_id.clone(),
                    window_interval: config.window_interval,
                    user_decay: config.user_decay,
                    flush_wait: config.flush_wait,
                },
                store.clone(),
                gauge,
                &shutdown_tx,
                &abort_tx,
                events_rx,
            );
            (pipeline.await?, reader)
        }
    };

    drop(shutdown_tx.send(()));
    supervisor.await?;
    reader.abort();

    finish(config, store.as_ref(), &tracker, report).await
}

async fn finish(
    config: &RunnerConfig,
    store: &dyn ResultStore,
    tracker: &LifecycleTracker,
    report: CollectorReport,
) -> AppResult<()> {
    if report.aborted {
        tracing::warn!(
            "Execution {} aborted after {} windows",
            config.execution_id,
            report.windows_emitted
        );
        return Err(AppError::from(LifecycleError::Aborted));
    }
    tracker.mark_finished().await?;
    if let Err(error) = store
        .update_instance(
            &config.execution_id,
            InstanceType::LoadTests,
            &InstanceUpdate::succeeded(),
        )
        .await
    {
        tracing::warn!("Could not mark load_tests instance SUCCEEDED: {error}");
    }
    tracing::info!(
        "Execution {} finished: {} windows emitted, {} records undelivered",
        config.execution_id,
        report.windows_emitted,
        report.records_pending
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::args::RunnerArgs;
    use crate::lifecycle::state::{ExecutionState, InstanceState};
    use crate::store::mock::MockStore;

    fn config() -> AppResult<RunnerConfig> {
        let args = RunnerArgs::try_parse_from([
            "loadlink",
            "--execution-id",
            "exec-1",
            "--store-url",
            "http://store.local/graphql",
            "load_tests",
        ])?;
        RunnerConfig::from_args(&args).map_err(AppError::from)
    }

    fn report(aborted: bool) -> CollectorReport {
        CollectorReport {
            windows_emitted: 3,
            records_pending: 0,
            aborted,
        }
    }

    #[tokio::test]
    async fn clean_completion_marks_finished_and_succeeded() -> AppResult<()> {
        let config = config()?;
        let store = Arc::new(MockStore::new());
        store.set_status(ExecutionState::Running).await;
        instance::get_or_create(store.as_ref(), &config.execution_id, InstanceType::LoadTests)
            .await
            .map_err(AppError::from)?;
        let tracker = LifecycleTracker::new(config.execution_id.clone(), store.clone());
        tracker.refresh().await.map_err(AppError::from)?;

        finish(&config, store.as_ref(), &tracker, report(false)).await?;

        let updates = store.execution_updates.lock().await;
        let last = updates
            .last()
            .ok_or_else(|| AppError::lifecycle("Expected a status update"))?;
        if last.status != Some(ExecutionState::Finished) || last.finished_at.is_none() {
            return Err(AppError::lifecycle(format!("Unexpected update: {last:?}")));
        }
        drop(updates);
        let instances = store.instances.lock().await;
        let instance = instances
            .get(&InstanceType::LoadTests)
            .ok_or_else(|| AppError::lifecycle("Expected a load_tests instance"))?;
        if instance.status != InstanceState::Succeeded {
            return Err(AppError::lifecycle("Instance should be SUCCEEDED"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn aborted_run_exits_with_an_error_and_no_transition() -> AppResult<()> {
        let config = config()?;
        let store = Arc::new(MockStore::new());
        store.set_status(ExecutionState::Running).await;
        let tracker = LifecycleTracker::new(config.execution_id.clone(), store.clone());
        tracker.refresh().await.map_err(AppError::from)?;

        match finish(&config, store.as_ref(), &tracker, report(true)).await {
            Err(AppError::Lifecycle(LifecycleError::Aborted)) => {}
            Ok(()) | Err(_) => {
                return Err(AppError::lifecycle("Expected an Aborted error"));
            }
        }
        if !store.execution_updates.lock().await.is_empty() {
            return Err(AppError::lifecycle("Aborted run must not push a transition"));
        }
        Ok(())
    }
}

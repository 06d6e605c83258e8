//! The monitoring phase: resolve the execution's monitoring settings,
//! do the READY handshake, optionally wait for the load generator,
//! then run the bounded probe loop.
use std::sync::Arc;
use std::time::Duration;

use crate::args::MonitoringArgs;
use crate::config::RunnerConfig;
use crate::error::{AppError, AppResult, ConfigError, LifecycleError};
use crate::lifecycle::instance;
use crate::lifecycle::state::InstanceType;
use crate::lifecycle::tracker::LifecycleTracker;
use crate::monitor::{run_monitoring, spawn_during_test, CommandProbe, DuringTestHandle, Probe};
use crate::store::{InstanceUpdate, ResultStore};

/// # Errors
///
/// Fails on missing monitoring configuration, a failed READY wait, or
/// a fatal probe error.
pub async fn run(
    config: &RunnerConfig,
    store: Arc<dyn ResultStore>,
    args: &MonitoringArgs,
) -> AppResult<()> {
    let probe_cmd = args
        .probe_cmd
        .as_deref()
        .ok_or(AppError::Config(ConfigError::MissingProbeCommand))?;
    let during = build_during_test(args)?;

    let view = store.get_execution(&config.execution_id).await?;
    let settings = view
        .configuration
        .ok_or(AppError::Lifecycle(LifecycleError::ConfigurationMissing {
            field: "configuration",
        }))?;
    let interval = settings.monitoring_interval.ok_or(AppError::Lifecycle(
        LifecycleError::ConfigurationMissing {
            field: "monitoring_interval",
        },
    ))?;
    let duration = settings.monitoring_duration.ok_or(AppError::Lifecycle(
        LifecycleError::ConfigurationMissing {
            field: "monitoring_duration",
        },
    ))?;

    let registered =
        instance::get_or_create(store.as_ref(), &config.execution_id, InstanceType::Monitoring)
            .await?;
    // The duration budget starts when the instance first registered,
    // so a restarted phase does not extend the window.
    let deadline = registered.created_at.timestamp().saturating_add(duration as i64);

    let tracker = LifecycleTracker::new(config.execution_id.clone(), store.clone());
    tracker.refresh().await?;
    if settings.has_load_tests {
        instance::wait_for_ready(
            store.as_ref(),
            &config.execution_id,
            InstanceType::LoadTests,
            config.ready_wait_deadline,
            config.ready_wait_interval,
        )
        .await?;
    } else {
        tracker.mark_monitoring().await?;
    }

    let during = during.map(|(probe, every)| spawn_during_test(probe, every));
    let outcome = run_probe_loop(config, store.clone(), probe_cmd, deadline, interval, during).await;

    match outcome {
        Ok(()) => {
            store
                .update_instance(
                    &config.execution_id,
                    InstanceType::Monitoring,
                    &InstanceUpdate::succeeded(),
                )
                .await?;
            if !settings.has_load_tests {
                let current = tracker.refresh().await?;
                if !current.is_terminal() {
                    tracker.mark_succeeded().await?;
                }
            }
            Ok(())
        }
        Err(error) => {
            if let Err(update_error) = store
                .update_instance(
                    &config.execution_id,
                    InstanceType::Monitoring,
                    &InstanceUpdate::failed(),
                )
                .await
            {
                tracing::warn!("Could not mark monitoring instance FAILED: {update_error}");
            }
            Err(error)
        }
    }
}

async fn run_probe_loop(
    config: &RunnerConfig,
    store: Arc<dyn ResultStore>,
    probe_cmd: &str,
    deadline: i64,
    interval: u64,
    during: Option<DuringTestHandle>,
) -> AppResult<()> {
    let probe: Arc<dyn Probe> = Arc::new(CommandProbe::new(probe_cmd));
    run_monitoring(
        probe,
        store,
        &config.execution_id,
        deadline,
        Duration::from_secs(interval.max(1)),
        during,
    )
    .await
}

fn build_during_test(args: &MonitoringArgs) -> AppResult<Option<(Arc<dyn Probe>, Duration)>> {
    match (&args.during_test_cmd, args.during_test_interval_secs) {
        (Some(command), Some(interval)) => Ok(Some((
            Arc::new(CommandProbe::new(command.clone())) as Arc<dyn Probe>,
            Duration::from_secs(interval),
        ))),
        (Some(_), None) => Err(AppError::Config(ConfigError::MissingDuringTestInterval)),
        (None, _) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::args::{Phase, RunnerArgs};
    use crate::lifecycle::state::{ExecutionState, InstanceState};
    use crate::store::mock::MockStore;
    use crate::store::ExecutionConfiguration;

    fn parse(extra: &[&str]) -> AppResult<(RunnerConfig, MonitoringArgs)> {
        let mut argv = vec![
            "loadlink",
            "--execution-id",
            "exec-1",
            "--store-url",
            "http://store.local/graphql",
            "monitoring",
        ];
        argv.extend_from_slice(extra);
        let args = RunnerArgs::try_parse_from(argv)?;
        let config = RunnerConfig::from_args(&args).map_err(AppError::from)?;
        match args.phase {
            Phase::Monitoring(monitoring) => Ok((config, monitoring)),
            Phase::PreStart | Phase::PostStop | Phase::LoadTests => {
                Err(AppError::config("Expected the monitoring phase"))
            }
        }
    }

    #[tokio::test]
    async fn requires_a_probe_command() -> AppResult<()> {
        let (config, monitoring) = parse(&[])?;
        let store = Arc::new(MockStore::new());
        match run(&config, store, &monitoring).await {
            Err(AppError::Config(ConfigError::MissingProbeCommand)) => Ok(()),
            Ok(()) | Err(_) => Err(AppError::config("Expected MissingProbeCommand")),
        }
    }

    #[tokio::test]
    async fn during_test_command_needs_an_interval() -> AppResult<()> {
        let (config, monitoring) = parse(&[
            "--probe-cmd",
            "printf '{}'",
            "--during-test-cmd",
            "true",
        ])?;
        let store = Arc::new(MockStore::new());
        match run(&config, store, &monitoring).await {
            Err(AppError::Config(ConfigError::MissingDuringTestInterval)) => Ok(()),
            Ok(()) | Err(_) => Err(AppError::config("Expected MissingDuringTestInterval")),
        }
    }

    #[tokio::test]
    async fn missing_monitoring_settings_are_rejected() -> AppResult<()> {
        let (config, monitoring) = parse(&["--probe-cmd", "printf '{}'"])?;
        let store = Arc::new(MockStore::new());
        store.set_status(ExecutionState::Pending).await;
        store
            .set_configuration(ExecutionConfiguration {
                has_load_tests: false,
                has_monitoring: true,
                monitoring_interval: None,
                monitoring_duration: Some(60),
            })
            .await;
        match run(&config, store, &monitoring).await {
            Err(AppError::Lifecycle(LifecycleError::ConfigurationMissing { field })) => {
                if field == "monitoring_interval" {
                    Ok(())
                } else {
                    Err(AppError::lifecycle(field.to_owned()))
                }
            }
            Ok(()) | Err(_) => Err(AppError::lifecycle("Expected ConfigurationMissing")),
        }
    }

    #[tokio::test]
    async fn monitoring_only_execution_goes_monitoring_then_succeeded() -> AppResult<()> {
        let (config, monitoring) = parse(&["--probe-cmd", "printf '{\"cpu\":1}'"])?;
        let store = Arc::new(MockStore::new());
        store.set_status(ExecutionState::Pending).await;
        store
            .set_configuration(ExecutionConfiguration {
                has_load_tests: false,
                has_monitoring: true,
                monitoring_interval: Some(1),
                monitoring_duration: Some(0),
            })
            .await;
        run(&config, store.clone(), &monitoring).await?;

        let updates = store.execution_updates.lock().await;
        let statuses: Vec<_> = updates.iter().filter_map(|update| update.status).collect();
        if statuses != vec![ExecutionState::Monitoring, ExecutionState::Succeeded] {
            return Err(AppError::lifecycle(format!("Unexpected path: {statuses:?}")));
        }
        drop(updates);
        let instances = store.instances.lock().await;
        let instance = instances
            .get(&InstanceType::Monitoring)
            .ok_or_else(|| AppError::lifecycle("Expected a monitoring instance"))?;
        if instance.status != InstanceState::Succeeded {
            return Err(AppError::lifecycle("Instance should be SUCCEEDED"));
        }
        drop(instances);
        if store.probe_samples.lock().await.is_empty() {
            return Err(AppError::lifecycle("Expected at least one sample"));
        }
        Ok(())
    }
}

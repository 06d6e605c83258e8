//! Monitoring phase: a bounded probe loop pushing samples to the store
//! until the configured duration elapses, with an optional side task
//! that runs its own command while the test is in flight.
pub mod probe;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult, MonitorError};
use crate::metrics::types::unix_now;
use crate::store::{ProbeSample, ResultStore};

pub use probe::{CommandProbe, Probe};

/// Handle to the during-test side loop. Dropping it does not stop the
/// task; call [`DuringTestHandle::stop`].
pub struct DuringTestHandle {
    alive: Arc<AtomicBool>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DuringTestHandle {
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub async fn stop(self) {
        drop(self.stop_tx.send(true));
        if let Err(error) = self.task.await {
            tracing::warn!("During-test task did not stop cleanly: {error}");
        }
    }
}

/// Runs the side command on its own timer. The first failure kills the
/// loop and flips the liveness flag the main loop checks.
#[must_use]
pub fn spawn_during_test(probe: Arc<dyn Probe>, interval: Duration) -> DuringTestHandle {
    let alive = Arc::new(AtomicBool::new(true));
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let alive_flag = alive.clone();
    let task = tokio::spawn(async move {
        loop {
            if let Err(error) = probe.sample().await {
                tracing::warn!("During-test command failed: {error}");
                alive_flag.store(false, Ordering::SeqCst);
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });
    DuringTestHandle {
        alive,
        stop_tx,
        task,
    }
}

/// The main monitoring loop: probe, push, sleep, until the deadline.
/// Probe failures and a dead during-test task are fatal; sample
/// delivery failures are logged and the loop moves on.
///
/// # Errors
///
/// Returns a [`MonitorError`] when the probe fails or the during-test
/// task died.
pub async fn run_monitoring(
    probe: Arc<dyn Probe>,
    store: Arc<dyn ResultStore>,
    execution_id: &str,
    deadline: i64,
    interval: Duration,
    during: Option<DuringTestHandle>,
) -> AppResult<()> {
    let result = monitoring_loop(probe, store, execution_id, deadline, interval, &during).await;
    if let Some(handle) = during {
        handle.stop().await;
    }
    result
}

async fn monitoring_loop(
    probe: Arc<dyn Probe>,
    store: Arc<dyn ResultStore>,
    execution_id: &str,
    deadline: i64,
    interval: Duration,
    during: &Option<DuringTestHandle>,
) -> AppResult<()> {
    loop {
        if let Some(handle) = during {
            if !handle.is_alive() {
                return Err(AppError::from(MonitorError::DuringTestDead));
            }
        }
        match probe.sample().await {
            Ok(serde_json::Value::Null) => {
                tracing::debug!("Probe produced no payload, skipping sample");
            }
            Ok(data) => {
                let sample = ProbeSample {
                    timestamp: Utc::now().to_rfc3339(),
                    data,
                };
                if let Err(error) = store.insert_probe_sample(execution_id, &sample).await {
                    tracing::warn!("Failed to push probe sample: {error}");
                }
            }
            Err(source) => {
                return Err(AppError::from(MonitorError::Probe { source }));
            }
        }
        if unix_now() >= deadline {
            tracing::info!("Monitoring window elapsed");
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}

//! Worker-side pipeline: windows the local event stream and ships each
//! closed window as a [`WorkerReport`] of raw totals. Workers never
//! talk to the result store.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::MetricsError;
use crate::metrics::ledger::normalize_exception;
use crate::metrics::reduce::UserGauge;
use crate::metrics::types::{unix_now, Event, PartialAggregate, WorkerError};
use crate::metrics::window::{Window, WindowBuffer};
use crate::shutdown::{AbortSender, ShutdownSender};

use super::wire::WorkerReport;

#[derive(Debug, Clone, Copy)]
pub struct WorkerSummary {
    pub windows_shipped: u64,
    pub aborted: bool,
}

pub struct WorkerParams {
    pub execution_id: String,
    pub worker_id: String,
    pub window_interval: Duration,
}

/// Folds one window of events into raw totals plus a deduplicated
/// error list keyed the same way the coordinator ledger keys rows.
fn fold_window(window: &Window<Event>, users: Option<u64>) -> PartialAggregate {
    let mut partial = PartialAggregate {
        num_requests: window.items.len() as u64,
        user_count: users.unwrap_or(0),
        ..PartialAggregate::default()
    };
    let mut errors: BTreeMap<String, WorkerError> = BTreeMap::new();
    for event in &window.items {
        partial.total_response_time += event.response_time_ms;
        partial.total_content_length = partial
            .total_content_length
            .saturating_add(event.response_size);
        if event.is_failure() {
            partial.num_failures = partial.num_failures.saturating_add(1);
            let exception = event.exception.as_deref().unwrap_or("");
            let key = format!(
                "{}/{}/{}",
                event.method,
                event.endpoint,
                normalize_exception(exception)
            );
            if let Some(row) = errors.get_mut(&key) {
                row.occurrences = row.occurrences.saturating_add(1);
            } else {
                errors.insert(
                    key,
                    WorkerError {
                        method: event.method.clone(),
                        name: event.endpoint.clone(),
                        error: exception.to_owned(),
                        occurrences: 1,
                    },
                );
            }
        }
    }
    partial.errors = errors.into_values().collect();
    partial
}

#[must_use]
pub fn spawn_worker(
    params: WorkerParams,
    gauge: Arc<dyn UserGauge>,
    shutdown_tx: &ShutdownSender,
    abort_tx: &AbortSender,
    mut events_rx: mpsc::Receiver<Event>,
    reports_tx: mpsc::Sender<WorkerReport>,
) -> JoinHandle<WorkerSummary> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut abort_rx = abort_tx.subscribe();
    tokio::spawn(async move {
        let mut buffer: WindowBuffer<Event> = WindowBuffer::new(params.window_interval);
        let mut tick = tokio::time::interval(params.window_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut windows_shipped = 0u64;
        let mut aborted = false;

        let ship = |window: Window<Event>, users: Option<u64>| WorkerReport {
            execution_id: params.execution_id.clone(),
            worker_id: params.worker_id.clone(),
            window_start: window.start,
            partial: fold_window(&window, users),
        };

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = abort_rx.recv() => {
                    aborted = true;
                    break;
                }
                maybe_event = events_rx.recv() => match maybe_event {
                    Some(event) => buffer.push(event, unix_now()),
                    None => break,
                },
                _ = tick.tick() => {
                    while let Some(window) = buffer.pop_closed() {
                        if window.items.is_empty() {
                            continue;
                        }
                        let report = ship(window, gauge.user_count());
                        if reports_tx.send(report).await.is_err() {
                            tracing::warn!(
                                "{}",
                                MetricsError::ChannelClosed {
                                    context: "shipping worker reports",
                                }
                            );
                            aborted = true;
                            break;
                        }
                        windows_shipped += 1;
                    }
                }
            }
            if aborted {
                break;
            }
        }

        if !aborted {
            for window in buffer.drain() {
                if window.items.is_empty() {
                    continue;
                }
                let report = ship(window, gauge.user_count());
                if reports_tx.send(report).await.is_err() {
                    break;
                }
                windows_shipped += 1;
            }
        }

        WorkerSummary {
            windows_shipped,
            aborted,
        }
    })
}

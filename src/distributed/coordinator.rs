//! Coordinator-side merge loop: arriving worker partials are bucketed
//! by arrival time, merged per window, and delivered through the same
//! retry-safe queue the standalone collector uses.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::MetricsError;
use crate::metrics::collector::CollectorReport;
use crate::metrics::delivery::{DeliveryQueue, QueueEntry};
use crate::metrics::ledger::ErrorLedger;
use crate::metrics::reduce::{UserGauge, WindowReducer};
use crate::metrics::types::{unix_now, PartialAggregate};
use crate::metrics::window::WindowBuffer;
use crate::shutdown::{AbortSender, ShutdownSender};
use crate::store::ResultStore;

use super::wire::WorkerReport;

pub struct CoordinatorParams {
    pub execution_id: String,
    pub window_interval: Duration,
    pub user_decay: f64,
    pub flush_wait: Duration,
}

#[must_use]
pub fn spawn_coordinator(
    params: CoordinatorParams,
    store: Arc<dyn ResultStore>,
    gauge: Arc<dyn UserGauge>,
    shutdown_tx: &ShutdownSender,
    abort_tx: &AbortSender,
    mut reports_rx: mpsc::Receiver<WorkerReport>,
) -> JoinHandle<CollectorReport> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut abort_rx = abort_tx.subscribe();
    tokio::spawn(async move {
        let mut buffer: WindowBuffer<PartialAggregate> = WindowBuffer::new(params.window_interval);
        let mut ledger = ErrorLedger::new(params.execution_id.clone());
        let mut reducer = WindowReducer::new(params.execution_id.clone(), params.user_decay);
        let mut queue = DeliveryQueue::new();
        let mut tick = tokio::time::interval(params.window_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut windows_emitted = 0u64;
        let mut aborted = false;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = abort_rx.recv() => {
                    aborted = true;
                    break;
                }
                maybe_report = reports_rx.recv() => match maybe_report {
                    Some(report) => {
                        if report.execution_id == params.execution_id {
                            buffer.push(report.partial, unix_now());
                        } else {
                            tracing::warn!(
                                "Dropping report from {} for foreign execution {}",
                                report.worker_id,
                                report.execution_id
                            );
                        }
                    }
                    None => break,
                },
                _ = tick.tick() => {
                    while let Some(window) = buffer.pop_closed() {
                        if let Some(record) =
                            reducer.reduce_merged(&window, &mut ledger, gauge.user_count())
                        {
                            windows_emitted += 1;
                            queue.enqueue_and_send(QueueEntry::Aggregate(record), store.as_ref()).await;
                        }
                    }
                    if !ledger.is_empty() {
                        queue.enqueue_and_send(QueueEntry::Errors(ledger.flush()), store.as_ref()).await;
                    }
                    queue.retry_pending(store.as_ref()).await;
                }
            }
        }

        let records_pending = if aborted {
            queue.pending_len()
        } else {
            let final_flush = async {
                for window in buffer.drain() {
                    if let Some(record) =
                        reducer.reduce_merged(&window, &mut ledger, gauge.user_count())
                    {
                        windows_emitted += 1;
                        queue
                            .enqueue_and_send(QueueEntry::Aggregate(record), store.as_ref())
                            .await;
                    }
                }
                if !ledger.is_empty() {
                    queue
                        .enqueue_and_send(QueueEntry::Errors(ledger.flush()), store.as_ref())
                        .await;
                }
                queue.flush(store.as_ref()).await
            };
            let flushed = tokio::time::timeout(params.flush_wait, final_flush).await;
            match flushed {
                Ok(pending) => pending,
                Err(_) => {
                    let pending = queue.pending_len();
                    tracing::warn!(
                        "{}",
                        MetricsError::FlushDeadline {
                            wait_ms: params.flush_wait.as_millis() as u64,
                            pending,
                        }
                    );
                    pending
                }
            }
        };
        if records_pending > 0 {
            tracing::warn!("Stopping with {records_pending} undelivered records");
        }

        CollectorReport {
            windows_emitted,
            records_pending,
            aborted,
        }
    })
}

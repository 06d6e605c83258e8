//! The collector task: single owner of the window buffer, ledger and
//! delivery queue. Events arrive over a channel; ticks close windows
//! and drive delivery; shutdown or channel closure triggers a bounded
//! final flush.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::MetricsError;
use crate::shutdown::{AbortSender, ShutdownSender};
use crate::store::ResultStore;

use super::delivery::{DeliveryQueue, QueueEntry};
use super::ledger::ErrorLedger;
use super::reduce::{UserGauge, WindowReducer};
use super::types::{unix_now, Event};
use super::window::WindowBuffer;

/// What the collector saw by the time it stopped.
#[derive(Debug, Clone, Copy)]
pub struct CollectorReport {
    pub windows_emitted: u64,
    pub records_pending: usize,
    pub aborted: bool,
}

pub struct CollectorParams {
    pub execution_id: String,
    pub window_interval: Duration,
    pub user_decay: f64,
    pub flush_wait: Duration,
}

#[must_use]
pub fn spawn_collector(
    params: CollectorParams,
    store: Arc<dyn ResultStore>,
    gauge: Arc<dyn UserGauge>,
    shutdown_tx: &ShutdownSender,
    abort_tx: &AbortSender,
    mut events_rx: mpsc::Receiver<Event>,
) -> JoinHandle<CollectorReport> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut abort_rx = abort_tx.subscribe();
    tokio::spawn(async move {
        let mut buffer: WindowBuffer<Event> = WindowBuffer::new(params.window_interval);
        let mut ledger = ErrorLedger::new(params.execution_id.clone());
        let mut reducer = WindowReducer::new(params.execution_id, params.user_decay);
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
                maybe_event = events_rx.recv() => match maybe_event {
                    Some(event) => {
                        if event.is_failure() {
                            ledger.record(
                                &event.method,
                                &event.endpoint,
                                event.exception.as_deref().unwrap_or(""),
                            );
                        }
                        buffer.push(event, unix_now());
                    }
                    None => break,
                },
                _ = tick.tick() => {
                    while let Some(window) = buffer.pop_closed() {
                        if let Some(record) = reducer.reduce_local(&window, gauge.user_count()) {
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
            // Aborted runs stop delivering; whatever is buffered is
            // dropped with the process.
            queue.pending_len()
        } else {
            let final_flush = async {
                for window in buffer.drain() {
                    if let Some(record) = reducer.reduce_local(&window, gauge.user_count()) {
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

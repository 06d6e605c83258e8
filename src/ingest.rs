//! JSON-lines adapters on stdin/stdout: raw events in, worker reports
//! in (coordinator) or out (worker). Malformed lines are logged and
//! skipped; EOF closes the channel and lets the pipeline drain.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::distributed::wire::{encode_line, WorkerReport};
use crate::metrics::reduce::UserGauge;
use crate::metrics::types::Event;

/// Event line as the load generator emits it: the event itself plus an
/// optional live user count piggybacked on the same line.
#[derive(Debug, Deserialize)]
struct EventLine {
    #[serde(flatten)]
    event: Event,
    #[serde(default)]
    users: Option<u64>,
}

/// Last user count seen on the wire. Readers get `None` until the
/// first report arrives.
#[derive(Debug, Default)]
pub struct SharedUserGauge {
    users: AtomicU64,
    seen: AtomicBool,
}

impl SharedUserGauge {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, count: u64) {
        self.users.store(count, Ordering::SeqCst);
        self.seen.store(true, Ordering::SeqCst);
    }
}

impl UserGauge for SharedUserGauge {
    fn user_count(&self) -> Option<u64> {
        if self.seen.load(Ordering::SeqCst) {
            Some(self.users.load(Ordering::SeqCst))
        } else {
            None
        }
    }
}

#[must_use]
pub fn spawn_stdin_events(
    events_tx: mpsc::Sender<Event>,
    gauge: Arc<SharedUserGauge>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<EventLine>(trimmed) {
                        Ok(parsed) => {
                            if let Some(users) = parsed.users {
                                gauge.set(users);
                            }
                            if events_tx.send(parsed.event).await.is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            tracing::warn!("Skipping malformed event line: {error}");
                        }
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!("Event input closed with an error: {error}");
                    break;
                }
            }
        }
    })
}

#[must_use]
pub fn spawn_stdin_reports(reports_tx: mpsc::Sender<WorkerReport>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<WorkerReport>(trimmed) {
                        Ok(report) => {
                            if reports_tx.send(report).await.is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            tracing::warn!("Skipping malformed worker report: {error}");
                        }
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!("Report input closed with an error: {error}");
                    break;
                }
            }
        }
    })
}

/// Writes worker reports to stdout, one JSON document per line.
#[must_use]
pub fn spawn_stdout_reports(mut reports_rx: mpsc::Receiver<WorkerReport>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(report) = reports_rx.recv().await {
            let line = match encode_line(&report) {
                Ok(line) => line,
                Err(error) => {
                    tracing::warn!("Could not encode worker report: {error}");
                    continue;
                }
            };
            if let Err(error) = stdout.write_all(line.as_bytes()).await {
                tracing::warn!("Report output closed: {error}");
                break;
            }
            if let Err(error) = stdout.write_all(b"\n").await {
                tracing::warn!("Report output closed: {error}");
                break;
            }
            if let Err(error) = stdout.flush().await {
                tracing::warn!("Report output closed: {error}");
                break;
            }
        }
    })
}

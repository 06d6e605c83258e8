use crate::store::ResultStore;

use super::types::{AggregateRecord, ErrorEntry};

#[derive(Debug, Clone)]
pub enum QueueEntry {
    Aggregate(AggregateRecord),
    Errors(Vec<ErrorEntry>),
}

/// Retry-safe delivery: a failed send is logged once per distinct
/// failure and the entry retained for the next tick. Data is only
/// dropped by the process exiting.
#[derive(Debug, Default)]
pub struct DeliveryQueue {
    pending: Vec<QueueEntry>,
    last_warning: Option<String>,
}

impl DeliveryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts immediate delivery; on failure the entry joins the
    /// pending list.
    pub async fn enqueue_and_send(&mut self, entry: QueueEntry, store: &dyn ResultStore) {
        match Self::send(store, &entry).await {
            Ok(()) => {
                self.last_warning = None;
            }
            Err(error) => {
                self.warn_once(&error.to_string());
                self.pending.push(entry);
            }
        }
    }

    /// Retries every pending entry once, retaining the ones that fail
    /// again.
    pub async fn retry_pending(&mut self, store: &dyn ResultStore) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        for entry in pending {
            match Self::send(store, &entry).await {
                Ok(()) => {
                    self.last_warning = None;
                }
                Err(error) => {
                    self.warn_once(&error.to_string());
                    self.pending.push(entry);
                }
            }
        }
    }

    /// One retry pass for the shutdown path; returns how many entries
    /// are still stuck.
    pub async fn flush(&mut self, store: &dyn ResultStore) -> usize {
        self.retry_pending(store).await;
        self.pending.len()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    async fn send(store: &dyn ResultStore, entry: &QueueEntry) -> Result<(), crate::error::StoreError> {
        match entry {
            QueueEntry::Aggregate(record) => store.insert_aggregate(record).await,
            QueueEntry::Errors(batch) => store.insert_errors(batch).await,
        }
    }

    fn warn_once(&mut self, message: &str) {
        if self.last_warning.as_deref() != Some(message) {
            tracing::warn!("Delivery failed, will retry: {message}");
            self.last_warning = Some(message.to_owned());
        }
    }
}

use std::collections::HashSet;

use super::ledger::{normalize_exception, ErrorLedger};
use super::types::{AggregateRecord, Event, PartialAggregate};
use super::window::Window;

/// Live source of the active user count. Returning `None` (or zero)
/// means the gauge has nothing authoritative to report right now.
pub trait UserGauge: Send + Sync {
    fn user_count(&self) -> Option<u64>;
}

/// Reduces one window into one [`AggregateRecord`], in local mode over
/// raw events or in merge mode over worker partials. Remembers the last
/// user count so gaps in the gauge decay instead of dropping to zero.
#[derive(Debug)]
pub struct WindowReducer {
    execution_id: String,
    user_decay: f64,
    last_users: u64,
}

impl WindowReducer {
    #[must_use]
    pub fn new(execution_id: String, user_decay: f64) -> Self {
        Self {
            execution_id,
            user_decay,
            last_users: 0,
        }
    }

    /// Reduces a window of raw events. Empty windows produce nothing.
    pub fn reduce_local(&mut self, window: &Window<Event>, gauge: Option<u64>) -> Option<AggregateRecord> {
        if window.items.is_empty() {
            return None;
        }
        let total = window.items.len() as u64;
        let mut fails = 0u64;
        let mut total_response_time = 0.0f64;
        let mut total_response_size = 0u64;
        let mut distinct: HashSet<&str> = HashSet::new();
        for event in &window.items {
            if event.is_failure() {
                fails = fails.saturating_add(1);
            }
            total_response_time += event.response_time_ms;
            total_response_size = total_response_size.saturating_add(event.response_size);
            if let Some(exception) = event.exception.as_deref() {
                if !exception.is_empty() {
                    distinct.insert(exception);
                }
            }
        }
        let users = self.resolve_users(gauge, None);
        Some(AggregateRecord {
            execution_id: self.execution_id.clone(),
            timestamp: window.start,
            successes: total.saturating_sub(fails),
            fails,
            distinct_errors: distinct.len() as u64,
            users,
            avg_response_time: round2(total_response_time / total as f64),
            avg_response_size: round2(total_response_size as f64 / total as f64),
        })
    }

    /// Merges a window of worker partials: counts are raw sums, means
    /// are weighted by summed totals, and every worker error feeds the
    /// ledger for deduplication.
    pub fn reduce_merged(
        &mut self,
        window: &Window<PartialAggregate>,
        ledger: &mut ErrorLedger,
        gauge: Option<u64>,
    ) -> Option<AggregateRecord> {
        if window.items.is_empty() {
            return None;
        }
        let mut requests = 0u64;
        let mut failures = 0u64;
        let mut total_response_time = 0.0f64;
        let mut total_content_length = 0u64;
        let mut reported_users = 0u64;
        let mut distinct: HashSet<String> = HashSet::new();
        for partial in &window.items {
            requests = requests.saturating_add(partial.num_requests);
            failures = failures.saturating_add(partial.num_failures);
            total_response_time += partial.total_response_time;
            total_content_length = total_content_length.saturating_add(partial.total_content_length);
            reported_users = reported_users.saturating_add(partial.user_count);
            for error in &partial.errors {
                let normalized = normalize_exception(&error.error);
                distinct.insert(format!("{}/{}/{}", error.method, error.name, normalized));
                ledger.record_occurrences(&error.method, &error.name, &error.error, error.occurrences);
            }
        }
        let users = self.resolve_users(gauge, Some(reported_users));
        let (avg_response_time, avg_response_size) = if requests > 0 {
            (
                round2(total_response_time / requests as f64),
                round2(total_content_length as f64 / requests as f64),
            )
        } else {
            (0.0, 0.0)
        };
        Some(AggregateRecord {
            execution_id: self.execution_id.clone(),
            timestamp: window.start,
            successes: requests.saturating_sub(failures),
            fails: failures,
            distinct_errors: distinct.len() as u64,
            users,
            avg_response_time,
            avg_response_size,
        })
    }

    /// Gauge wins when it reports a positive count; then summed worker
    /// counts; otherwise the previous value decays.
    fn resolve_users(&mut self, gauge: Option<u64>, reported: Option<u64>) -> u64 {
        let users = if let Some(count) = gauge.filter(|count| *count > 0) {
            count
        } else if let Some(sum) = reported.filter(|sum| *sum > 0) {
            sum
        } else {
            (self.last_users as f64 * self.user_decay) as u64
        };
        self.last_users = users;
        users
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch; window bucketing runs on wall clock.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// One completed request observed by a load generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub endpoint: String,
    pub method: String,
    pub outcome: Outcome,
    pub response_time_ms: f64,
    #[serde(default)]
    pub response_size: u64,
    #[serde(default)]
    pub exception: Option<String>,
    pub timestamp: i64,
}

impl Event {
    #[must_use]
    pub fn success(method: &str, endpoint: &str, response_time_ms: f64, response_size: u64) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            method: method.to_owned(),
            outcome: Outcome::Success,
            response_time_ms,
            response_size,
            exception: None,
            timestamp: unix_now(),
        }
    }

    #[must_use]
    pub fn failure(method: &str, endpoint: &str, response_time_ms: f64, exception: &str) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            method: method.to_owned(),
            outcome: Outcome::Failure,
            response_time_ms,
            response_size: 0,
            exception: Some(exception.to_owned()),
            timestamp: unix_now(),
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failure)
    }
}

/// One reduced window, ready for the result store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    pub execution_id: String,
    pub timestamp: i64,
    pub successes: u64,
    pub fails: u64,
    pub distinct_errors: u64,
    pub users: u64,
    pub avg_response_time: f64,
    pub avg_response_size: f64,
}

/// Pre-reduced totals shipped by one worker for one of its windows.
/// Totals, not averages, so the coordinator can merge without
/// weighting mistakes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialAggregate {
    pub num_requests: u64,
    pub num_failures: u64,
    pub total_response_time: f64,
    pub total_content_length: u64,
    pub user_count: u64,
    #[serde(default)]
    pub errors: Vec<WorkerError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerError {
    pub method: String,
    pub name: String,
    pub error: String,
    pub occurrences: u64,
}

/// Deduplicated error row keyed by method, endpoint and normalized text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub execution_id: String,
    pub method: String,
    pub name: String,
    pub exception: String,
    pub occurrences: u64,
}

//! JSON-lines wire format between workers and the coordinator.
use serde::{Deserialize, Serialize};

use crate::metrics::types::PartialAggregate;

/// One worker window, shipped as a single line of JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    pub execution_id: String,
    pub worker_id: String,
    pub window_start: i64,
    pub partial: PartialAggregate,
}

/// Encodes a report as one newline-free JSON document.
///
/// # Errors
///
/// Returns the underlying serializer error; with these types that only
/// happens on pathological float values.
pub fn encode_line(report: &WorkerReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// # Errors
///
/// Returns a decode error for malformed or incomplete lines.
pub fn decode_line(line: &str) -> Result<WorkerReport, serde_json::Error> {
    serde_json::from_str(line)
}

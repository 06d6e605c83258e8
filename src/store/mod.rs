//! Remote result store: the trait every phase talks through plus the
//! GraphQL implementation.
pub mod graphql;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::lifecycle::state::{ExecutionState, InstanceState, InstanceType};
use crate::metrics::types::{AggregateRecord, ErrorEntry};

pub use graphql::GraphQlStore;

/// Execution row as the store reports it.
#[derive(Debug, Clone)]
pub struct ExecutionView {
    pub status: ExecutionState,
    pub configuration: Option<ExecutionConfiguration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfiguration {
    #[serde(default)]
    pub has_load_tests: bool,
    #[serde(default)]
    pub has_monitoring: bool,
    #[serde(default)]
    pub monitoring_interval: Option<u64>,
    #[serde(default)]
    pub monitoring_duration: Option<u64>,
}

/// Partial update pushed to the execution row. Unset fields are left
/// untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

impl ExecutionUpdate {
    #[must_use]
    pub fn status(status: ExecutionState) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_started_at(mut self, timestamp: String) -> Self {
        self.started_at = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_finished_at(mut self, timestamp: String) -> Self {
        self.finished_at = Some(timestamp);
        self
    }
}

#[derive(Debug, Clone)]
pub struct InstanceView {
    pub status: InstanceState,
    pub instance_type: InstanceType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceUpdate {
    pub status: InstanceState,
}

impl InstanceUpdate {
    #[must_use]
    pub const fn ready() -> Self {
        Self {
            status: InstanceState::Ready,
        }
    }

    #[must_use]
    pub const fn succeeded() -> Self {
        Self {
            status: InstanceState::Succeeded,
        }
    }

    #[must_use]
    pub const fn failed() -> Self {
        Self {
            status: InstanceState::Failed,
        }
    }
}

/// One monitoring probe result.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeSample {
    pub timestamp: String,
    pub data: serde_json::Value,
}

/// Marker row for the pre-start/post-stop stages.
#[derive(Debug, Clone, Serialize)]
pub struct StageLogEntry {
    pub stage: String,
    pub msg: String,
    pub timestamp: String,
}

/// Everything the pipeline needs from the remote store. Implementations
/// must be safe to call concurrently; retry policy lives with the
/// callers, not here.
///
/// # Errors
///
/// Every operation returns a [`StoreError`] when the store is
/// unreachable, rejects the request, or answers with something the
/// client cannot decode.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Writes one reduced window.
    ///
    /// # Errors
    ///
    /// See the trait-level notes.
    async fn insert_aggregate(&self, record: &AggregateRecord) -> Result<(), StoreError>;

    /// Writes one batch of deduplicated error rows.
    ///
    /// # Errors
    ///
    /// See the trait-level notes.
    async fn insert_errors(&self, entries: &[ErrorEntry]) -> Result<(), StoreError>;

    /// Writes one monitoring sample.
    ///
    /// # Errors
    ///
    /// See the trait-level notes.
    async fn insert_probe_sample(
        &self,
        execution_id: &str,
        sample: &ProbeSample,
    ) -> Result<(), StoreError>;

    /// Writes one stage marker.
    ///
    /// # Errors
    ///
    /// See the trait-level notes.
    async fn insert_stage_log(
        &self,
        execution_id: &str,
        entry: &StageLogEntry,
    ) -> Result<(), StoreError>;

    /// Reads the execution row.
    ///
    /// # Errors
    ///
    /// See the trait-level notes; an unknown execution is an error.
    async fn get_execution(&self, execution_id: &str) -> Result<ExecutionView, StoreError>;

    /// Applies a partial update to the execution row.
    ///
    /// # Errors
    ///
    /// See the trait-level notes.
    async fn update_execution(
        &self,
        execution_id: &str,
        update: &ExecutionUpdate,
    ) -> Result<(), StoreError>;

    /// Reads the instance row for one phase; `None` when no phase of
    /// that type has registered yet.
    ///
    /// # Errors
    ///
    /// See the trait-level notes.
    async fn get_instance(
        &self,
        execution_id: &str,
        instance_type: InstanceType,
    ) -> Result<Option<InstanceView>, StoreError>;

    /// Registers a new instance row and returns it as stored.
    ///
    /// # Errors
    ///
    /// See the trait-level notes.
    async fn insert_instance(
        &self,
        execution_id: &str,
        instance_type: InstanceType,
        update: &InstanceUpdate,
    ) -> Result<InstanceView, StoreError>;

    /// Updates an existing instance row.
    ///
    /// # Errors
    ///
    /// See the trait-level notes.
    async fn update_instance(
        &self,
        execution_id: &str,
        instance_type: InstanceType,
        update: &InstanceUpdate,
    ) -> Result<(), StoreError>;
}

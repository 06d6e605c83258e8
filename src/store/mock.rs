//! Scripted in-memory store used by the pipeline tests. Failure
//! switches let tests exercise the warn-and-retain delivery path.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::lifecycle::state::{ExecutionState, InstanceType};
use crate::metrics::types::{AggregateRecord, ErrorEntry};

use super::{
    ExecutionConfiguration, ExecutionUpdate, ExecutionView, InstanceUpdate, InstanceView,
    ProbeSample, ResultStore, StageLogEntry,
};

#[derive(Default)]
pub struct MockStore {
    pub aggregates: Mutex<Vec<AggregateRecord>>,
    pub error_batches: Mutex<Vec<Vec<ErrorEntry>>>,
    pub probe_samples: Mutex<Vec<ProbeSample>>,
    pub stage_logs: Mutex<Vec<StageLogEntry>>,
    pub execution_updates: Mutex<Vec<ExecutionUpdate>>,
    pub instances: Mutex<HashMap<InstanceType, InstanceView>>,
    status: Mutex<Option<ExecutionState>>,
    configuration: Mutex<Option<ExecutionConfiguration>>,
    pub fail_aggregates: AtomicBool,
    pub fail_errors: AtomicBool,
    pub aggregate_attempts: AtomicU64,
    pub execution_reads: AtomicU64,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_status(&self, status: ExecutionState) {
        *self.status.lock().await = Some(status);
    }

    pub async fn set_configuration(&self, configuration: ExecutionConfiguration) {
        *self.configuration.lock().await = Some(configuration);
    }

    pub fn fail_aggregates(&self, fail: bool) {
        self.fail_aggregates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_errors(&self, fail: bool) {
        self.fail_errors.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResultStore for MockStore {
    async fn insert_aggregate(&self, record: &AggregateRecord) -> Result<(), StoreError> {
        self.aggregate_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_aggregates.load(Ordering::SeqCst) {
            return Err(StoreError::Scripted {
                context: "insert_aggregate",
            });
        }
        self.aggregates.lock().await.push(record.clone());
        Ok(())
    }

    async fn insert_errors(&self, entries: &[ErrorEntry]) -> Result<(), StoreError> {
        if self.fail_errors.load(Ordering::SeqCst) {
            return Err(StoreError::Scripted {
                context: "insert_errors",
            });
        }
        self.error_batches.lock().await.push(entries.to_vec());
        Ok(())
    }

    async fn insert_probe_sample(
        &self,
        _execution_id: &str,
        sample: &ProbeSample,
    ) -> Result<(), StoreError> {
        self.probe_samples.lock().await.push(sample.clone());
        Ok(())
    }

    async fn insert_stage_log(
        &self,
        _execution_id: &str,
        entry: &StageLogEntry,
    ) -> Result<(), StoreError> {
        self.stage_logs.lock().await.push(entry.clone());
        Ok(())
    }

    async fn get_execution(&self, _execution_id: &str) -> Result<ExecutionView, StoreError> {
        self.execution_reads.fetch_add(1, Ordering::SeqCst);
        let status = self.status.lock().await.ok_or(StoreError::Scripted {
            context: "get_execution",
        })?;
        Ok(ExecutionView {
            status,
            configuration: self.configuration.lock().await.clone(),
        })
    }

    async fn update_execution(
        &self,
        _execution_id: &str,
        update: &ExecutionUpdate,
    ) -> Result<(), StoreError> {
        if let Some(status) = update.status {
            *self.status.lock().await = Some(status);
        }
        self.execution_updates.lock().await.push(update.clone());
        Ok(())
    }

    async fn get_instance(
        &self,
        _execution_id: &str,
        instance_type: InstanceType,
    ) -> Result<Option<InstanceView>, StoreError> {
        Ok(self.instances.lock().await.get(&instance_type).cloned())
    }

    async fn insert_instance(
        &self,
        _execution_id: &str,
        instance_type: InstanceType,
        update: &InstanceUpdate,
    ) -> Result<InstanceView, StoreError> {
        let instance = InstanceView {
            status: update.status,
            instance_type,
            created_at: Utc::now(),
        };
        self.instances
            .lock()
            .await
            .insert(instance_type, instance.clone());
        Ok(instance)
    }

    async fn update_instance(
        &self,
        _execution_id: &str,
        instance_type: InstanceType,
        update: &InstanceUpdate,
    ) -> Result<(), StoreError> {
        if let Some(instance) = self.instances.lock().await.get_mut(&instance_type) {
            instance.status = update.status;
            Ok(())
        } else {
            Err(StoreError::Scripted {
                context: "update_instance",
            })
        }
    }
}

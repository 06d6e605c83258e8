use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult, LifecycleError, StoreError};
use crate::store::{ExecutionUpdate, ResultStore};

use super::state::ExecutionState;

/// Pushes one-way lifecycle transitions to the store and caches the
/// last state it saw. The remote row is authoritative; `refresh`
/// re-reads it.
pub struct LifecycleTracker {
    execution_id: String,
    store: Arc<dyn ResultStore>,
    current: Mutex<ExecutionState>,
}

impl LifecycleTracker {
    #[must_use]
    pub fn new(execution_id: String, store: Arc<dyn ResultStore>) -> Self {
        Self {
            execution_id,
            store,
            current: Mutex::new(ExecutionState::Pending),
        }
    }

    /// Re-reads the execution row and updates the cached state.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the row cannot be fetched.
    pub async fn refresh(&self) -> Result<ExecutionState, StoreError> {
        let view = self.store.get_execution(&self.execution_id).await?;
        *self.current.lock().await = view.status;
        Ok(view.status)
    }

    #[must_use]
    pub async fn current(&self) -> ExecutionState {
        *self.current.lock().await
    }

    /// # Errors
    ///
    /// Returns a [`LifecycleError`] for an illegal transition or a
    /// [`StoreError`] when the update does not reach the store.
    pub async fn mark_running(&self) -> AppResult<()> {
        if self.current().await == ExecutionState::Running {
            return Ok(());
        }
        self.transition(
            ExecutionState::Running,
            ExecutionUpdate::status(ExecutionState::Running)
                .with_started_at(Utc::now().to_rfc3339()),
        )
        .await
    }

    /// # Errors
    ///
    /// Same failure modes as [`Self::mark_running`].
    pub async fn mark_monitoring(&self) -> AppResult<()> {
        if self.current().await == ExecutionState::Monitoring {
            return Ok(());
        }
        self.transition(
            ExecutionState::Monitoring,
            ExecutionUpdate::status(ExecutionState::Monitoring),
        )
        .await
    }

    /// # Errors
    ///
    /// Same failure modes as [`Self::mark_running`].
    pub async fn mark_finished(&self) -> AppResult<()> {
        self.transition(
            ExecutionState::Finished,
            ExecutionUpdate::status(ExecutionState::Finished)
                .with_finished_at(Utc::now().to_rfc3339()),
        )
        .await
    }

    /// # Errors
    ///
    /// Same failure modes as [`Self::mark_running`].
    pub async fn mark_succeeded(&self) -> AppResult<()> {
        self.transition(
            ExecutionState::Succeeded,
            ExecutionUpdate::status(ExecutionState::Succeeded),
        )
        .await
    }

    async fn transition(&self, requested: ExecutionState, update: ExecutionUpdate) -> AppResult<()> {
        let mut current = self.current.lock().await;
        if current.is_terminal() {
            return Err(AppError::from(LifecycleError::TerminalState {
                current: *current,
                requested,
            }));
        }
        if !current.can_transition_to(requested) {
            return Err(AppError::from(LifecycleError::InvalidTransition {
                current: *current,
                requested,
            }));
        }
        self.store
            .update_execution(&self.execution_id, &update)
            .await?;
        *current = requested;
        tracing::info!("Execution {} is now {:?}", self.execution_id, requested);
        Ok(())
    }
}

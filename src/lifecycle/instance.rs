//! READY handshake between phase instances: each phase registers its
//! own instance row, and dependent phases poll for it with a bounded
//! wait.
use std::time::Duration;

use crate::error::{AppError, AppResult, LifecycleError, StoreError};
use crate::store::{InstanceUpdate, InstanceView, ResultStore};

use super::state::{InstanceState, InstanceType};

/// Registers this phase's instance as READY, reusing an existing row
/// when the phase restarted.
///
/// # Errors
///
/// Returns a [`StoreError`] when neither read nor insert succeeds.
pub async fn get_or_create(
    store: &dyn ResultStore,
    execution_id: &str,
    instance_type: InstanceType,
) -> Result<InstanceView, StoreError> {
    if let Some(existing) = store.get_instance(execution_id, instance_type).await? {
        tracing::info!("Reusing existing {instance_type} instance");
        return Ok(existing);
    }
    let created = store
        .insert_instance(execution_id, instance_type, &InstanceUpdate::ready())
        .await?;
    tracing::info!("Registered {instance_type} instance as READY");
    Ok(created)
}

/// Polls until the given instance reports READY. Store hiccups are
/// logged and retried; a failed execution or an expired deadline ends
/// the wait.
///
/// # Errors
///
/// Returns [`LifecycleError::ReadyWaitExpired`] after the deadline and
/// [`LifecycleError::FailedWhileWaiting`] when the execution turns into
/// a failed state first.
pub async fn wait_for_ready(
    store: &dyn ResultStore,
    execution_id: &str,
    instance_type: InstanceType,
    deadline: Duration,
    poll_interval: Duration,
) -> AppResult<()> {
    let started = tokio::time::Instant::now();
    loop {
        match store.get_execution(execution_id).await {
            Ok(view) if view.status.is_failed() => {
                return Err(AppError::from(LifecycleError::FailedWhileWaiting {
                    instance_type,
                    state: view.status,
                }));
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!("Execution poll failed while waiting for {instance_type}: {error}");
            }
        }
        match store.get_instance(execution_id, instance_type).await {
            Ok(Some(instance)) if instance.status == InstanceState::Ready => {
                tracing::info!("{instance_type} instance is READY");
                return Ok(());
            }
            Ok(Some(_) | None) => {}
            Err(error) => {
                tracing::warn!("Instance poll failed while waiting for {instance_type}: {error}");
            }
        }
        if started.elapsed() + poll_interval >= deadline {
            return Err(AppError::from(LifecycleError::ReadyWaitExpired {
                instance_type,
                waited_secs: deadline.as_secs(),
            }));
        }
        tokio::time::sleep(poll_interval).await;
    }
}

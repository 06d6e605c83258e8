//! Fixed-interval poll of the execution row. When an external actor
//! marks the execution FAILED, ERROR or TERMINATED, the supervisor
//! broadcasts an abort and every pipeline task stops on its next
//! select. Poll failures are logged and the next tick tries again.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::shutdown::{AbortSender, ShutdownSender};
use crate::store::ResultStore;

#[must_use]
pub fn spawn_supervisor(
    store: Arc<dyn ResultStore>,
    execution_id: String,
    poll_interval: Duration,
    abort_tx: AbortSender,
    shutdown_tx: &ShutdownSender,
) -> JoinHandle<()> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = tick.tick() => {
                    match store.get_execution(&execution_id).await {
                        Err(error) => {
                            tracing::warn!("Supervisor poll failed: {error}");
                        }
                        Ok(view) => {
                            tracing::debug!("Supervisor observed {:?}", view.status);
                            if view.status.is_failed() {
                                tracing::warn!(
                                    "Execution {execution_id} is {:?}, aborting the run",
                                    view.status
                                );
                                drop(abort_tx.send(()));
                                break;
                            }
                            if view.status.is_terminal() {
                                break;
                            }
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::sync::broadcast;

    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::lifecycle::state::ExecutionState;
    use crate::store::mock::MockStore;

    #[tokio::test]
    async fn broadcasts_abort_when_the_execution_fails() -> AppResult<()> {
        let store = Arc::new(MockStore::new());
        store.set_status(ExecutionState::Failed).await;
        let (shutdown_tx, _keep_shutdown) = broadcast::channel(1);
        let (abort_tx, mut abort_rx) = broadcast::channel(1);
        let handle = spawn_supervisor(
            store.clone(),
            "exec-1".to_owned(),
            Duration::from_millis(10),
            abort_tx,
            &shutdown_tx,
        );

        tokio::time::timeout(Duration::from_secs(1), abort_rx.recv())
            .await
            .map_err(|_| AppError::lifecycle("No abort within one poll"))?
            .map_err(|_| AppError::lifecycle("Abort channel closed"))?;
        handle.await?;

        // The supervisor stops after aborting; no further polls.
        let polls = store.execution_reads.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        if store.execution_reads.load(Ordering::SeqCst) != polls {
            return Err(AppError::lifecycle("Supervisor kept polling after abort"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn keeps_polling_through_store_failures() -> AppResult<()> {
        // No scripted status makes get_execution fail every time.
        let store = Arc::new(MockStore::new());
        let (shutdown_tx, _keep_shutdown) = broadcast::channel(1);
        let (abort_tx, abort_rx) = broadcast::channel(1);
        let handle = spawn_supervisor(
            store.clone(),
            "exec-1".to_owned(),
            Duration::from_millis(10),
            abort_tx,
            &shutdown_tx,
        );

        tokio::time::sleep(Duration::from_millis(60)).await;
        if store.execution_reads.load(Ordering::SeqCst) < 2 {
            return Err(AppError::lifecycle("Supervisor should keep polling"));
        }
        drop(abort_rx);
        shutdown_tx
            .send(())
            .map_err(|_| AppError::lifecycle("Supervisor dropped the shutdown channel"))?;
        handle.await?;
        Ok(())
    }

    #[tokio::test]
    async fn stops_quietly_on_benign_terminal_states() -> AppResult<()> {
        let store = Arc::new(MockStore::new());
        store.set_status(ExecutionState::Finished).await;
        let (shutdown_tx, _keep_shutdown) = broadcast::channel(1);
        let (abort_tx, mut abort_rx) = broadcast::channel(1);
        let handle = spawn_supervisor(
            store.clone(),
            "exec-1".to_owned(),
            Duration::from_millis(10),
            abort_tx,
            &shutdown_tx,
        );
        handle.await?;
        if abort_rx.try_recv().is_ok() {
            return Err(AppError::lifecycle("FINISHED must not trigger an abort"));
        }
        Ok(())
    }
}

use chrono::Utc;

use crate::config::RunnerConfig;
use crate::error::AppResult;
use crate::store::{ResultStore, StageLogEntry};

/// Records a lifecycle stage marker (pre-start, post-stop) and exits.
///
/// # Errors
///
/// Returns a store error when the marker cannot be written.
pub async fn run(config: &RunnerConfig, store: &dyn ResultStore, stage: &str) -> AppResult<()> {
    let entry = StageLogEntry {
        stage: stage.to_owned(),
        msg: "done".to_owned(),
        timestamp: Utc::now().to_rfc3339(),
    };
    store
        .insert_stage_log(&config.execution_id, &entry)
        .await?;
    tracing::info!("Recorded {stage} stage for execution {}", config.execution_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::args::RunnerArgs;
    use crate::error::AppError;
    use crate::store::mock::MockStore;

    #[tokio::test]
    async fn writes_one_stage_marker() -> AppResult<()> {
        let args = RunnerArgs::try_parse_from([
            "loadlink",
            "--execution-id",
            "exec-1",
            "--store-url",
            "http://store.local/graphql",
            "pre_start",
        ])?;
        let config = RunnerConfig::from_args(&args).map_err(AppError::from)?;
        let store = MockStore::new();
        run(&config, &store, "pre_start").await?;
        let logs = store.stage_logs.lock().await;
        let entry = logs
            .first()
            .ok_or_else(|| AppError::store("Expected one stage marker"))?;
        if entry.stage != "pre_start" || entry.msg != "done" {
            return Err(AppError::store(format!("Unexpected marker: {entry:?}")));
        }
        Ok(())
    }
}
